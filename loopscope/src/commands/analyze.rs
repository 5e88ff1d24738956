//! `analyze` command: findings only.

use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

use super::{analyze_files, Settings};
use crate::analyzer::Findings;
use crate::error::ParseError;
use crate::output;
use crate::rewrite::RewriteConfig;
use crate::utils::{collect_python_files, normalize_display_path};

#[derive(Serialize)]
struct FileFindings<'a> {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    findings: Option<&'a Findings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a ParseError>,
}

/// Reports loop findings for every Python file under `paths`.
///
/// # Errors
///
/// Returns an error if a file cannot be read or output fails.
pub fn run_analyze<W: Write>(
    paths: &[PathBuf],
    settings: &Settings,
    writer: &mut W,
) -> Result<i32> {
    let files = collect_python_files(paths, &settings.exclude);

    // Rewrites are not needed here.
    let detect_only = Settings {
        rewrite: RewriteConfig {
            flatten: false,
            vectorize: false,
        },
        ..settings.clone()
    };
    let outcomes = analyze_files(&files, &detect_only.pipeline())?;

    if settings.json {
        let entries: Vec<FileFindings<'_>> = outcomes
            .iter()
            .map(|outcome| FileFindings {
                file: normalize_display_path(&outcome.path),
                findings: outcome.analysis.as_ref().ok().map(|a| &a.findings),
                error: outcome.analysis.as_ref().err(),
            })
            .collect();
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
        return Ok(0);
    }

    if !settings.quiet {
        output::print_header(writer)?;
    }
    let mut total = 0;
    let mut errors = Vec::new();
    for outcome in &outcomes {
        let path = normalize_display_path(&outcome.path);
        match &outcome.analysis {
            Ok(analysis) => {
                total += analysis.findings.len();
                if !settings.quiet {
                    output::print_findings(writer, &path, &analysis.findings)?;
                }
            }
            Err(err) => errors.push((path, err)),
        }
    }
    output::print_parse_errors(writer, &errors)?;
    output::print_summary(writer, outcomes.len(), total, 0)?;
    Ok(0)
}
