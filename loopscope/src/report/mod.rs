//! Report model and HTML rendering.
//!
//! The HTML generator is gated behind the `html_report` feature flag.

use serde::Serialize;

use crate::error::ParseError;
use crate::pipeline::FileAnalysis;

/// Main report generation logic.
#[cfg(feature = "html_report")]
pub mod generator;
/// HTML templates for the report.
#[cfg(feature = "html_report")]
pub mod templates;

#[cfg(feature = "html_report")]
pub use generator::generate_report;

/// Outcome for one input file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// Display path of the input.
    pub path: String,
    /// Analysis results, or the syntax error that stopped them.
    pub analysis: Result<FileAnalysis, ParseError>,
    /// Where the rewritten source was written, if it was.
    pub optimized_path: Option<String>,
    /// Profiler output, when profiling ran.
    pub profile: Option<String>,
}
