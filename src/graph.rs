//! Dependency and influence maps derived from a parsed Makefile.
//!
//! An *influence* is a reversed required-prerequisite edge: if `all: prog`
//! then `prog` influences `all`, because changing `prog` makes `all` stale.
//! Order-only prerequisites constrain ordering but never propagate a rebuild,
//! so they add no influence edges.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    ast::{Ast, TargetRecord},
    Error,
};

pub type Names = BTreeSet<String>;

/// Prerequisites of one target, both lists sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    pub required: Vec<String>,
    pub order_only: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    dependencies: BTreeMap<String, Dependencies>,
    influences: BTreeMap<String, Names>,
    order_only: Names,
    indirect_influences: BTreeMap<String, Names>,
    duplicates: Vec<(String, usize)>,
}

impl DependencyGraph {
    /// Builds every map in one pass over the targets of `ast`, then closes
    /// the influence relation. `.PHONY` is skipped entirely.
    pub fn from_ast(ast: &Ast) -> Self {
        let mut graph = Self::default();
        for target in ast.targets().filter(|t| !t.is_phony_marker()) {
            graph.add(target);
        }

        graph.indirect_influences = graph
            .influences
            .keys()
            .map(|origin| (origin.clone(), graph.reachable_from(origin)))
            .collect();

        tracing::debug!(
            targets = graph.dependencies.len(),
            names = graph.influences.len(),
            order_only = graph.order_only.len(),
            duplicates = graph.duplicates.len(),
            "built dependency graph"
        );
        graph
    }

    fn add(&mut self, target: &TargetRecord) {
        let name = &target.name;
        let deps = Dependencies {
            required: target.dependencies.clone(),
            order_only: target.order_only_dependencies.clone(),
        };
        if self.dependencies.insert(name.clone(), deps).is_some() {
            tracing::warn!(
                name = %name,
                line = target.line,
                "target redefined, earlier definition is overridden"
            );
            self.duplicates.push((name.clone(), target.line));
        }

        self.influences.entry(name.clone()).or_default();
        for dep in &target.dependencies {
            self.influences
                .entry(dep.clone())
                .or_default()
                .insert(name.clone());
        }
        for dep in &target.order_only_dependencies {
            self.influences.entry(dep.clone()).or_default();
            self.order_only.insert(dep.clone());
        }
    }

    /// Every name reachable from `origin` over one or more influence edges,
    /// `origin` excluded. Terminates on cycles: each name is expanded once.
    fn reachable_from(&self, origin: &str) -> Names {
        let mut seen = BTreeSet::from([origin]);
        let mut stack = vec![origin];
        while let Some(node) = stack.pop() {
            for next in self.influences.get(node).into_iter().flatten() {
                if seen.insert(next.as_str()) {
                    stack.push(next.as_str());
                }
            }
        }
        seen.remove(origin);
        seen.into_iter().map(str::to_string).collect()
    }

    pub fn dependencies(&self) -> &BTreeMap<String, Dependencies> {
        &self.dependencies
    }

    pub fn influences(&self) -> &BTreeMap<String, Names> {
        &self.influences
    }

    pub fn order_only(&self) -> &Names {
        &self.order_only
    }

    pub fn indirect_influences(&self) -> &BTreeMap<String, Names> {
        &self.indirect_influences
    }

    pub fn dependencies_of(&self, name: &str) -> Option<&Dependencies> {
        self.dependencies.get(name)
    }

    pub fn influences_of(&self, name: &str) -> Option<&Names> {
        self.influences.get(name)
    }

    pub fn indirect_influences_of(&self, name: &str) -> Option<&Names> {
        self.indirect_influences.get(name)
    }

    pub fn is_order_only(&self, name: &str) -> bool {
        self.order_only.contains(name)
    }

    /// Everything that goes stale when `name` changes: direct and indirect
    /// influences together. Empty for unknown names.
    pub fn affected_by(&self, name: &str) -> Names {
        self.influences_of(name)
            .into_iter()
            .chain(self.indirect_influences_of(name))
            .flatten()
            .cloned()
            .collect()
    }

    /// Names defined by more than one rule, with the line of each redefinition.
    pub fn duplicates(&self) -> &[(String, usize)] {
        &self.duplicates
    }

    pub fn warnings(&self) -> impl Iterator<Item = Error> + '_ {
        self.duplicates
            .iter()
            .map(|(name, line)| Error::DuplicateTargetDefinition {
                name: name.clone(),
                line: *line,
            })
    }
}
