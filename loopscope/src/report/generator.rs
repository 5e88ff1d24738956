use crate::report::templates::{FileView, NestedLoopView, ReportTemplate, RewriteView};
use crate::report::FileReport;
use anyhow::Result;
use askama::Template;

/// Renders the HTML report for a run.
///
/// # Errors
///
/// Returns an error if template rendering fails.
pub fn generate_report(reports: &[FileReport]) -> Result<String> {
    let files: Vec<FileView> = reports.iter().map(file_view).collect();
    let template = ReportTemplate {
        version: env!("CARGO_PKG_VERSION").to_owned(),
        generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        total_suggestions: files.iter().map(|f| f.suggestions.len()).sum(),
        total_rewrites: files.iter().map(|f| f.rewrites.len()).sum(),
        files,
    };
    Ok(template.render()?)
}

fn file_view(report: &FileReport) -> FileView {
    let mut view = FileView {
        path: report.path.clone(),
        error: None,
        suggestions: Vec::new(),
        nested_loops: Vec::new(),
        rewrites: Vec::new(),
        imports: Vec::new(),
        optimized_path: report.optimized_path.clone(),
        profile: report.profile.clone(),
    };
    match &report.analysis {
        Ok(analysis) => {
            view.suggestions = analysis.findings.suggestions();
            view.nested_loops = analysis
                .findings
                .nested_loops()
                .map(|(line, level)| NestedLoopView { line, level })
                .collect();
            view.rewrites = analysis
                .applied
                .iter()
                .map(|applied| RewriteView {
                    line: applied.line,
                    rule: applied.rule.to_owned(),
                    description: applied.description.to_owned(),
                })
                .collect();
            view.imports = analysis
                .injected_imports
                .iter()
                .map(ToString::to_string)
                .collect();
        }
        Err(err) => view.error = Some(err.to_string()),
    }
    view
}
