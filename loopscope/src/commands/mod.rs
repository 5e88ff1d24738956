//! Commands module - CLI subcommand implementations.
//!
//! Every command receives the merged [`Settings`] (config file values with
//! command-line flags applied on top) and a writer for its primary output.

mod analyze;
mod optimize;
mod rewrite;

pub use analyze::run_analyze;
pub use optimize::run_optimize;
pub use rewrite::run_rewrite;

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_HIGH_ITERATION_THRESHOLD, DEFAULT_OUTPUT_DIR, DEFAULT_PYTHON, DEFAULT_REPORT_FILE,
};
use crate::error::ParseError;
use crate::pipeline::{FileAnalysis, Pipeline};
use crate::rewrite::RewriteConfig;

/// Effective settings for one invocation.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct Settings {
    /// Iteration count above which `range(n)` loops are reported.
    pub threshold: u64,
    /// Enabled rewrite rules.
    pub rewrite: RewriteConfig,
    /// Extra folders skipped while walking directories.
    pub exclude: Vec<String>,
    /// Directory receiving the rewritten files.
    pub output_dir: PathBuf,
    /// HTML report path.
    pub report: PathBuf,
    /// Whether the profilers run.
    pub profile: bool,
    /// Interpreter used by the profilers.
    pub python: String,
    /// Emit JSON instead of tables.
    pub json: bool,
    /// Only print the final status lines.
    pub quiet: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_HIGH_ITERATION_THRESHOLD,
            rewrite: RewriteConfig::default(),
            exclude: Vec::new(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            report: PathBuf::from(DEFAULT_REPORT_FILE),
            profile: true,
            python: DEFAULT_PYTHON.to_owned(),
            json: false,
            quiet: false,
        }
    }
}

impl Settings {
    /// Pipeline configured from these settings.
    #[must_use]
    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.threshold, self.rewrite)
    }
}

/// Result of running the pipeline over one file.
pub(crate) struct FileOutcome {
    pub path: PathBuf,
    pub analysis: Result<FileAnalysis, ParseError>,
}

/// Reads and analyzes `files` in parallel, preserving their order.
///
/// A file that cannot be read aborts the run; a file that does not parse is
/// kept with its [`ParseError`].
pub(crate) fn analyze_files(files: &[PathBuf], pipeline: &Pipeline) -> Result<Vec<FileOutcome>> {
    files
        .par_iter()
        .map(|path| {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            tracing::debug!(file = %path.display(), "analyzing");
            Ok(FileOutcome {
                path: path.clone(),
                analysis: pipeline.run(&source),
            })
        })
        .collect()
}

/// First input path that does not exist, if any.
pub(crate) fn missing_input(paths: &[PathBuf]) -> Option<&Path> {
    paths.iter().map(PathBuf::as_path).find(|p| !p.exists())
}
