use crate::analyzer::{Findings, Severity};
use crate::error::ParseError;
use crate::rewrite::AppliedRewrite;
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;

/// Create and return a spinner for a multi-file run.
///
/// In test mode, returns a hidden progress bar to avoid polluting test output.
#[must_use]
pub fn create_spinner(message: &str) -> ProgressBar {
    if cfg!(test) {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_owned());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Print the main header with box-drawing characters.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_header(writer: &mut impl Write) -> std::io::Result<()> {
    writeln!(writer)?;
    writeln!(
        writer,
        "{}",
        "╔════════════════════════════════════════╗".cyan()
    )?;
    writeln!(
        writer,
        "{}",
        "║  Python Loop Analysis Results          ║".cyan().bold()
    )?;
    writeln!(
        writer,
        "{}",
        "╚════════════════════════════════════════╝".cyan()
    )?;
    writeln!(writer)?;
    Ok(())
}

fn create_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers);
    table
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::High => Color::Red,
        Severity::Medium => Color::Yellow,
        Severity::Low => Color::Blue,
        Severity::Info => Color::White,
    }
}

/// Print the findings of one file as a table.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_findings(
    writer: &mut impl Write,
    path: &str,
    findings: &Findings,
) -> std::io::Result<()> {
    if findings.is_empty() {
        writeln!(writer, "{} {}", path.bold(), "no loop issues".green())?;
        return Ok(());
    }

    writeln!(writer, "\n{}", path.bold().underline())?;

    let mut table = create_table(vec!["Line", "Category", "Message", "Severity"]);
    for finding in findings.all() {
        let severity = finding.severity();
        table.add_row(vec![
            Cell::new(finding.line()),
            Cell::new(finding.category()).add_attribute(Attribute::Dim),
            Cell::new(finding.message()).add_attribute(Attribute::Bold),
            Cell::new(severity).fg(severity_color(severity)),
        ]);
    }

    writeln!(writer, "{table}")?;
    Ok(())
}

/// Print the rewrites applied to one file.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_rewrites(
    writer: &mut impl Write,
    path: &str,
    applied: &[AppliedRewrite],
) -> std::io::Result<()> {
    if applied.is_empty() {
        return Ok(());
    }

    writeln!(writer, "\n{} {}", "Rewrites in".bold(), path.bold())?;

    let mut table = create_table(vec!["Line", "Rule", "Change"]);
    for rewrite in applied {
        table.add_row(vec![
            Cell::new(rewrite.line),
            Cell::new(rewrite.rule).fg(Color::Cyan),
            Cell::new(rewrite.description),
        ]);
    }

    writeln!(writer, "{table}")?;
    Ok(())
}

/// Print a list of parse errors.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_parse_errors(
    writer: &mut impl Write,
    errors: &[(String, &ParseError)],
) -> std::io::Result<()> {
    if errors.is_empty() {
        return Ok(());
    }

    writeln!(writer, "\n{}", "Parse Errors".bold().underline().red())?;

    let mut table = create_table(vec!["File", "Error"]);
    for (path, error) in errors {
        table.add_row(vec![
            Cell::new(path).add_attribute(Attribute::Bold),
            Cell::new(error).fg(Color::Red),
        ]);
    }

    writeln!(writer, "{table}")?;
    Ok(())
}

/// Print the closing summary line of a run.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_summary(
    writer: &mut impl Write,
    files: usize,
    findings: usize,
    rewrites: usize,
) -> std::io::Result<()> {
    fn pill(label: &str, count: usize) -> String {
        if count == 0 {
            format!("{label}: {count}").dimmed().to_string()
        } else {
            format!("{label}: {count}").yellow().bold().to_string()
        }
    }

    writeln!(
        writer,
        "\n{}  {}  {}",
        format!("Files: {files}").cyan(),
        pill("Findings", findings),
        pill("Rewrites", rewrites)
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze;

    #[test]
    fn test_print_findings_lists_messages() {
        colored::control::set_override(false);
        let findings = analyze("for i in range(5000):\n    x = i + 1\n").unwrap();
        let mut buffer = Vec::new();
        print_findings(&mut buffer, "loops.py", &findings).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("loops.py"));
        assert!(text.contains("range(5000)"));
        assert!(text.contains("MEDIUM"));
    }

    #[test]
    fn test_print_findings_empty() {
        colored::control::set_override(false);
        let findings = analyze("x = 1\n").unwrap();
        let mut buffer = Vec::new();
        print_findings(&mut buffer, "clean.py", &findings).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("no loop issues"));
    }

    #[test]
    fn test_print_parse_errors_skips_empty() {
        let mut buffer = Vec::new();
        print_parse_errors(&mut buffer, &[]).unwrap();
        assert!(buffer.is_empty());
    }
}
