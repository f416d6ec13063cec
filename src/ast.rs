/// Name of the pseudo-target listing phony targets. It never enters the graph.
pub const PHONY: &str = ".PHONY";

/// One logical line of a Makefile, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `name: deps | order-only ## doc`
    Target(String),
    /// A tab-indented recipe line.
    Command(String),
    /// Anything else: variable assignments, directives, bare words.
    Expression(String),
}

impl Token {
    pub fn into_text(self) -> String {
        match self {
            Token::Target(s) | Token::Command(s) | Token::Expression(s) => s,
        }
    }
}

/// A parsed target definition together with its recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetRecord {
    pub name: String,
    /// Required prerequisites, sorted and deduplicated.
    pub dependencies: Vec<String>,
    /// Prerequisites after `|`, sorted, deduplicated and disjoint from
    /// `dependencies`.
    pub order_only_dependencies: Vec<String>,
    /// Text after `##` on the target line, or empty.
    pub doc: String,
    /// Recipe lines in file order.
    pub body: Vec<String>,
    /// 1-based line of the target definition.
    pub line: usize,
}

impl TargetRecord {
    pub fn is_phony_marker(&self) -> bool {
        self.name == PHONY
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstNode {
    Target(TargetRecord),
    Expression(String),
}

/// The parsed file: every target and expression in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ast(Vec<AstNode>);

impl Ast {
    pub fn new(nodes: Vec<AstNode>) -> Self {
        Self(nodes)
    }

    pub fn nodes(&self) -> &[AstNode] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn targets(&self) -> impl Iterator<Item = &TargetRecord> {
        self.0.iter().filter_map(|n| match n {
            AstNode::Target(t) => Some(t),
            AstNode::Expression(_) => None,
        })
    }

    pub fn expressions(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(|n| match n {
            AstNode::Expression(e) => Some(e.as_str()),
            AstNode::Target(_) => None,
        })
    }

    /// `(name, doc)` of every target carrying a docstring, in file order.
    pub fn documented_targets(&self) -> impl Iterator<Item = (&str, &str)> {
        self.targets()
            .filter(|t| !t.doc.is_empty())
            .map(|t| (t.name.as_str(), t.doc.as_str()))
    }
}

impl IntoIterator for Ast {
    type Item = AstNode;
    type IntoIter = std::vec::IntoIter<AstNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Ast {
    type Item = &'a AstNode;
    type IntoIter = std::slice::Iter<'a, AstNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
