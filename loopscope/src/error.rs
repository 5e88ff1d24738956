//! Library error types.

use serde::Serialize;
use thiserror::Error;

use crate::utils::LineIndex;

/// A syntax error in the analyzed source.
///
/// Not recoverable inside the engine: a file that fails to parse produces
/// no findings and no rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message} at line {line}, column {column}")]
pub struct ParseError {
    /// Human-readable description of the grammar error.
    pub message: String,
    /// 1-based line of the error.
    pub line: usize,
    /// 0-based column of the error.
    pub column: usize,
}

impl ParseError {
    /// Converts a parser error into a positioned [`ParseError`].
    pub(crate) fn from_ruff(err: &ruff_python_parser::ParseError, source: &str) -> Self {
        let index = LineIndex::new(source);
        let offset = err.location.start();
        Self {
            message: err.error.to_string(),
            line: index.line_index(offset),
            column: index.column_index(offset),
        }
    }
}
