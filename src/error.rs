use std::path::PathBuf;

use nom::error::{convert_error, VerboseError};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("line {line}: line continuation runs past the end of input: {content:?}")]
    MalformedContinuation { line: usize, content: String },

    #[error("line {line}: malformed target line {content:?}\n{reason}")]
    MalformedTargetLine {
        line: usize,
        content: String,
        reason: String,
    },

    /// Not fatal: the last definition wins. Reported through
    /// [`DependencyGraph::warnings`](crate::DependencyGraph::warnings).
    #[error("line {line}: target `{name}` redefined, earlier definition is overridden")]
    DuplicateTargetDefinition { name: String, line: usize },

    #[error("couldn't read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn from_nom(line: usize, content: &str, err: VerboseError<&str>) -> Self {
        Error::MalformedTargetLine {
            line,
            content: content.to_string(),
            reason: convert_error(content, err),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Line the error points at, when it comes from the parser.
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::MalformedContinuation { line, .. }
            | Error::MalformedTargetLine { line, .. }
            | Error::DuplicateTargetDefinition { line, .. } => Some(*line),
            Error::Io { .. } => None,
        }
    }
}
