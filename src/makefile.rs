use std::{
    collections::{HashSet, VecDeque},
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use crate::{ast::Ast, graph::DependencyGraph, parser, Error, Result};

macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: OnceLock<regex::Regex> = OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($re).expect("Invalid regex!"))
    }};
}

/// A Makefile with its includes stitched in, ready to be parsed.
#[derive(Debug, Clone, Default)]
pub struct Makefile {
    /// Top-level file, if read from disk.
    pub file: Option<PathBuf>,
    /// Every included file, in the order it was appended.
    pub includes: Vec<PathBuf>,
    pub lines: Vec<String>,
}

/// Paths named by an `include` directive, or `None` for any other line.
fn include_paths(line: &str) -> Option<Vec<&str>> {
    let re_include = regex!(r"^include +(.*)$");
    let cap = re_include.captures(line)?;
    Some(cap.get(1)?.as_str().split_whitespace().collect())
}

impl Makefile {
    pub fn from_lines<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Reads `path` and everything it includes into one line stream.
    ///
    /// Included paths are relative to the directory of `path`, whichever
    /// file names them, the way make resolves them when run next to the top
    /// Makefile. Included files are appended after the lines already
    /// collected, breadth first. The `include` lines themselves are dropped.
    /// A file is read at most once, so include cycles are harmless.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        let mut out = Self {
            file: Some(root.clone()),
            ..Self::default()
        };
        let dir = root.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut seen = HashSet::new();
        let mut paths = VecDeque::from([root.clone()]);

        while let Some(path) = paths.pop_front() {
            let key = path.canonicalize().unwrap_or_else(|_| path.clone());
            if !seen.insert(key) {
                tracing::debug!(path = %path.display(), "already included, skipping");
                continue;
            }

            tracing::debug!(path = %path.display(), "reading makefile");
            let data = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
            for line in data.lines() {
                match include_paths(line) {
                    Some(names) => paths.extend(names.into_iter().map(|n| dir.join(n))),
                    None => out.lines.push(line.to_string()),
                }
            }

            if path != root {
                out.includes.push(path);
            }
        }

        Ok(out)
    }

    pub fn parse(&self) -> Result<Ast> {
        parser::parse(&self.lines)
    }

    pub fn analyze(&self) -> Result<(Ast, DependencyGraph)> {
        let ast = self.parse()?;
        let graph = DependencyGraph::from_ast(&ast);
        Ok((ast, graph))
    }
}
