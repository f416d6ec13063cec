//! Makefile analysis for build profiling.
//!
//! Lines go through three stages: [`tokenizer`] classifies them, [`parser`]
//! turns the tokens into an [`Ast`] of targets and expressions, and
//! [`DependencyGraph`] derives which targets a change to any name eventually
//! affects. [`Makefile`] reads a file from disk and stitches its `include`s
//! in first.
//!
//! ```
//! use makeprof::{parse, DependencyGraph};
//!
//! let ast = parse(&["app: lib", "lib: src", "src:"]).unwrap();
//! let graph = DependencyGraph::from_ast(&ast);
//! assert_eq!(graph.affected_by("src").len(), 2);
//! ```

pub mod ast;
mod error;
pub mod graph;
pub mod makefile;
pub mod parser;
pub mod tokenizer;

pub use ast::{Ast, AstNode, TargetRecord, Token};
pub use error::{Error, Result};
pub use graph::{Dependencies, DependencyGraph, Names};
pub use makefile::Makefile;
pub use parser::parse;
pub use tokenizer::{tokenize, Tokenizer};
