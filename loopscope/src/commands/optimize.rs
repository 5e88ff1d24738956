//! Default command: detect, rewrite, profile and report.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{analyze_files, FileOutcome, Settings};
use crate::output;
use crate::profile::{profile_summary, PythonProfiler};
use crate::report::FileReport;
use crate::utils::{collect_python_files, normalize_display_path, optimized_file_name};

/// Runs the full optimization over `paths`.
///
/// Rewritten sources land in `settings.output_dir`; the HTML report is
/// written to `settings.report` when the `html_report` feature is enabled.
/// Parse errors are reported and do not change the exit code.
///
/// # Errors
///
/// Returns an error if an input cannot be read or an output cannot be
/// written.
pub fn run_optimize<W: Write>(
    paths: &[PathBuf],
    settings: &Settings,
    writer: &mut W,
) -> Result<i32> {
    let files = collect_python_files(paths, &settings.exclude);
    if files.is_empty() {
        eprintln!("No Python files found.");
        return Ok(0);
    }

    let spinner = if settings.quiet || settings.json {
        indicatif::ProgressBar::hidden()
    } else {
        output::create_spinner("loopscope analyzing your loops…")
    };
    let pipeline = settings.pipeline();
    let outcomes = analyze_files(&files, &pipeline);
    spinner.finish_and_clear();
    let outcomes = outcomes?;

    fs::create_dir_all(&settings.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            settings.output_dir.display()
        )
    })?;

    let profiler = PythonProfiler::new(settings.python.clone());
    let mut reports = Vec::with_capacity(outcomes.len());
    for FileOutcome { path, analysis } in outcomes {
        let optimized_path = match &analysis {
            Ok(result) => Some(write_optimized(
                &path,
                &result.optimized_source,
                &settings.output_dir,
            )?),
            Err(_) => None,
        };
        // Profile the original script; a file that does not parse cannot run.
        let profile = (settings.profile && analysis.is_ok())
            .then(|| profile_summary(&profiler, &path));
        reports.push(FileReport {
            path: normalize_display_path(&path),
            analysis,
            optimized_path: optimized_path.map(|p| normalize_display_path(&p)),
            profile,
        });
    }

    let report_path = write_report(&reports, &settings.report)?;

    if settings.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&reports)?)?;
        return Ok(0);
    }

    if !settings.quiet {
        print_details(writer, &reports)?;
    }

    if let Some(report) = report_path {
        writeln!(
            writer,
            "Optimization complete. Report saved as '{}'.",
            normalize_display_path(&report)
        )?;
    } else {
        writeln!(writer, "Optimization complete.")?;
    }
    for report in &reports {
        if let Some(optimized) = &report.optimized_path {
            writeln!(writer, "Optimized code saved to '{optimized}'.")?;
        }
    }
    writer.flush()?;
    Ok(0)
}

fn write_optimized(script: &Path, source: &str, output_dir: &Path) -> Result<PathBuf> {
    let target = output_dir.join(optimized_file_name(script));
    if target.exists() {
        tracing::debug!(path = %target.display(), "overwriting optimized file");
    }
    fs::write(&target, source)
        .with_context(|| format!("failed to write {}", target.display()))?;
    Ok(target)
}

#[cfg(feature = "html_report")]
fn write_report(reports: &[FileReport], path: &Path) -> Result<Option<PathBuf>> {
    let html = crate::report::generate_report(reports)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, html).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(Some(path.to_path_buf()))
}

#[cfg(not(feature = "html_report"))]
fn write_report(_reports: &[FileReport], path: &Path) -> Result<Option<PathBuf>> {
    tracing::warn!(
        path = %path.display(),
        "HTML report support is not compiled in; skipping report"
    );
    Ok(None)
}

fn print_details<W: Write>(writer: &mut W, reports: &[FileReport]) -> std::io::Result<()> {
    output::print_header(writer)?;

    let mut findings = 0;
    let mut rewrites = 0;
    let mut errors = Vec::new();
    for report in reports {
        match &report.analysis {
            Ok(analysis) => {
                findings += analysis.findings.len();
                rewrites += analysis.applied.len();
                output::print_findings(writer, &report.path, &analysis.findings)?;
                output::print_rewrites(writer, &report.path, &analysis.applied)?;
            }
            Err(err) => errors.push((report.path.clone(), err)),
        }
    }
    output::print_parse_errors(writer, &errors)?;
    output::print_summary(writer, reports.len(), findings, rewrites)?;
    writeln!(writer)?;
    Ok(())
}
