//! Per-file analysis: detection plus rewriting of one source text.

use serde::Serialize;

use crate::analyzer::{Detector, Findings};
use crate::error::ParseError;
use crate::rewrite::{AppliedRewrite, RequiredImport, RewriteConfig, RewriteEngine};
use crate::tree::SyntaxTree;

/// Everything produced for one source file.
#[derive(Debug, Clone, Serialize)]
pub struct FileAnalysis {
    pub findings: Findings,
    pub applied: Vec<AppliedRewrite>,
    pub injected_imports: Vec<RequiredImport>,
    /// Rewritten source; equal to the input when nothing applied.
    #[serde(skip)]
    pub optimized_source: String,
}

/// Detector and rewrite engine configured once and shared across files.
pub struct Pipeline {
    detector: Detector,
    engine: RewriteEngine,
}

impl Pipeline {
    #[must_use]
    pub fn new(threshold: u64, rewrite: RewriteConfig) -> Self {
        Self {
            detector: Detector::with_threshold(threshold),
            engine: RewriteEngine::new(rewrite),
        }
    }

    /// Parses `source` once, then runs detection and the rewrite pass.
    ///
    /// # Errors
    /// Returns [`ParseError`] when `source` is not valid Python.
    pub fn run(&self, source: &str) -> Result<FileAnalysis, ParseError> {
        let tree = SyntaxTree::parse(source)?;
        let findings = self.detector.detect(&tree);
        let rewritten = self.engine.rewrite(tree);
        Ok(FileAnalysis {
            findings,
            optimized_source: rewritten.source(),
            applied: rewritten.applied,
            injected_imports: rewritten.injected_imports,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            detector: Detector::default(),
            engine: RewriteEngine::default(),
        }
    }
}
