//! Core library for the loopscope loop analyzer.
//!
//! This library parses Python source into an editable syntax tree, reports
//! loop patterns that tend to be slow (nested loops, large `range` bounds,
//! arithmetic recomputed on every iteration) and rewrites the simple cases
//! into `itertools.product` or numpy form.

// Allow common complexity warnings - these are intentional design choices
#![allow(
    clippy::similar_names,
    clippy::format_push_string,
    clippy::map_unwrap_or,
    clippy::items_after_statements
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Module containing the pattern detector and its findings.
pub mod analyzer;

/// Module defining the report model and the HTML report generator.
pub mod report;

/// Module for loading configuration.
pub mod config;

/// Module containing utility functions.
/// This includes path discovery and line/column helpers.
pub mod utils;

/// Module defining the entry point logic shared by the binaries.
pub mod entry_point;

/// Module containing shared constants.
pub mod constants;

/// Module for rich CLI output formatting with colored text and spinners.
pub mod output;

/// Module defining the command-line interface arguments and structs.
pub mod cli;

/// Module for handling CLI commands and their execution logic.
pub mod commands;

/// Parse error type shared by every pass.
pub mod error;

/// Diagnostic logging setup.
pub mod logging;

/// Detection plus rewriting of a single source text.
pub mod pipeline;

/// Runtime and memory profiling through a Python interpreter.
pub mod profile;

/// Loop rewrite rules and the engine that applies them.
pub mod rewrite;

/// Arena syntax tree, parent index and code printer.
pub mod tree;

pub use analyzer::{analyze, Detector, Finding, Findings};
pub use error::ParseError;
pub use pipeline::{FileAnalysis, Pipeline};
pub use rewrite::{RewriteConfig, RewriteEngine, Rewritten};
pub use tree::SyntaxTree;
