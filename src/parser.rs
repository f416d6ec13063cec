use std::iter::Peekable;

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag},
    character::complete::{char, none_of},
    combinator::{opt, recognize, rest, value, verify},
    error::{context, VerboseError},
    multi::many1_count,
    sequence::{pair, preceded, terminated, tuple},
    Finish, Parser,
};

use crate::{
    ast::{Ast, AstNode, TargetRecord, Token},
    tokenizer::tokenize,
    Error, Result,
};

pub type ParseErr<'a> = VerboseError<&'a str>;
type ParseResult<'a, O> = nom::IResult<&'a str, O, ParseErr<'a>>;

/// Target line split into its groups, borrowed from the line.
#[derive(Debug, PartialEq, Eq)]
struct TargetLine<'a> {
    name: &'a str,
    deps: Vec<&'a str>,
    order_only: Vec<&'a str>,
    doc: &'a str,
}

fn words(group: Option<&str>) -> Vec<&str> {
    group.map(|g| g.split_whitespace().collect()).unwrap_or_default()
}

/// Everything up to the first `:` not preceded by a backslash.
fn name(input: &str) -> ParseResult<&str> {
    let escaped = value((), tag("\\:"));
    let plain = value((), none_of(":"));
    context(
        "target name",
        verify(recognize(many1_count(alt((escaped, plain)))), |s: &str| {
            !s.trim().is_empty()
        }),
    )
    .map(str::trim)
    .parse(input)
}

fn separator(input: &str) -> ParseResult<()> {
    // `a:: b` is read like `a: b`
    context("':' after target name", value((), pair(char(':'), opt(char(':'))))).parse(input)
}

fn required(input: &str) -> ParseResult<Vec<&str>> {
    context("prerequisites", opt(is_not("|#")))
        .map(words)
        .parse(input)
}

fn order_only(input: &str) -> ParseResult<Vec<&str>> {
    context(
        "order-only prerequisites",
        opt(preceded(char('|'), opt(is_not("#")))),
    )
    .map(|group| words(group.flatten()))
    .parse(input)
}

fn docstring(input: &str) -> ParseResult<&str> {
    context("docstring", opt(preceded(tag("##"), rest)))
        .map(|doc| doc.map_or("", |d: &str| d.trim().trim_matches('#').trim()))
        .parse(input)
}

fn target_line(input: &str) -> ParseResult<TargetLine> {
    context(
        "target",
        tuple((terminated(name, separator), required, order_only, docstring)),
    )
    .map(|(name, deps, order_only, doc)| TargetLine {
        name,
        deps,
        order_only,
        doc,
    })
    .parse(input)
}

fn normalize(names: Vec<&str>) -> Vec<String> {
    let mut out: Vec<String> = names.into_iter().map(str::to_string).collect();
    out.sort();
    out.dedup();
    out
}

/// Extracts a [`TargetRecord`] (without body) from a spliced target line.
pub fn parse_target(line: usize, text: &str) -> Result<TargetRecord> {
    let (_, parsed) = target_line(text)
        .finish()
        .map_err(|e| Error::from_nom(line, text, e))?;

    let dependencies = normalize(parsed.deps);
    let mut order_only_dependencies = normalize(parsed.order_only);
    // a prerequisite listed in both groups is a normal one
    order_only_dependencies.retain(|d| dependencies.binary_search(d).is_err());

    Ok(TargetRecord {
        name: parsed.name.to_string(),
        dependencies,
        order_only_dependencies,
        doc: parsed.doc.to_string(),
        body: Vec::new(),
        line,
    })
}

fn parse_body<I>(tokens: &mut Peekable<I>) -> Vec<String>
where
    I: Iterator<Item = Result<(usize, Token)>>,
{
    let mut body = Vec::new();
    while let Some(Ok((_, Token::Command(cmd)))) =
        tokens.next_if(|t| matches!(t, Ok((_, Token::Command(_)))))
    {
        body.push(cmd);
    }
    body
}

/// Parses a whole Makefile, already split into lines, into its [`Ast`].
pub fn parse<S: AsRef<str>>(lines: &[S]) -> Result<Ast> {
    let mut tokens = tokenize(lines).peekable();
    let mut nodes = Vec::new();

    while let Some(token) = tokens.next() {
        let (line, token) = token?;
        match token {
            Token::Target(text) => {
                let mut record = parse_target(line, &text)?;
                record.body = parse_body(&mut tokens);
                tracing::trace!(
                    line,
                    name = %record.name,
                    commands = record.body.len(),
                    "target"
                );
                nodes.push(AstNode::Target(record));
            }
            Token::Expression(text) => nodes.push(AstNode::Expression(text)),
            Token::Command(text) => {
                tracing::debug!(line, command = %text, "recipe line outside of a target");
                nodes.push(AstNode::Expression(text));
            }
        }
    }

    tracing::debug!(nodes = nodes.len(), "parsed makefile");
    Ok(Ast::new(nodes))
}
