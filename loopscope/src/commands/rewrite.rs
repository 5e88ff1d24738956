//! `rewrite` command: print one rewritten file.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

use super::Settings;
use crate::rewrite::{AppliedRewrite, RequiredImport};
use crate::utils::normalize_display_path;

#[derive(Serialize)]
struct RewriteOutput<'a> {
    file: String,
    applied: &'a [AppliedRewrite],
    injected_imports: &'a [RequiredImport],
    source: &'a str,
}

/// Writes the rewritten source of `file` to `writer`.
///
/// A syntax error is reported on stderr and nothing is printed.
///
/// # Errors
///
/// Returns an error if the file cannot be read or output fails.
pub fn run_rewrite<W: Write>(file: &Path, settings: &Settings, writer: &mut W) -> Result<i32> {
    let source =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let display = normalize_display_path(file);

    let analysis = match settings.pipeline().run(&source) {
        Ok(analysis) => analysis,
        Err(err) => {
            eprintln!("Error: {display}: {err}");
            return Ok(0);
        }
    };

    if settings.json {
        let out = RewriteOutput {
            file: display,
            applied: &analysis.applied,
            injected_imports: &analysis.injected_imports,
            source: &analysis.optimized_source,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&out)?)?;
    } else {
        write!(writer, "{}", analysis.optimized_source)?;
    }
    writer.flush()?;
    Ok(0)
}
