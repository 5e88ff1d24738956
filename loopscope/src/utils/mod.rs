//! Utilities module for loopscope.
//!
//! Offset-to-position conversion and small text helpers shared by the
//! tree builder, the code printer and the command surface.

mod paths;

pub use paths::{collect_python_files, is_excluded, normalize_display_path, optimized_file_name};

use ruff_text_size::TextSize;

/// A utility struct to convert byte offsets to line numbers.
///
/// This is necessary because the AST parser works with byte offsets,
/// but we want to report findings with line numbers which are more human-readable.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Stores the byte index of the start of each line.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Creates a new `LineIndex` by scanning the source code for newlines.
    /// Uses byte iteration for performance since '\n' is always a single byte in UTF-8.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, byte) in source.as_bytes().iter().enumerate() {
            if *byte == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// Converts a `TextSize` (byte offset) to a 1-indexed line number.
    #[must_use]
    pub fn line_index(&self, offset: TextSize) -> usize {
        let offset = offset.to_usize();
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line + 1,
            Err(line) => line,
        }
    }

    /// Converts a `TextSize` to a 0-indexed byte column within its line.
    #[must_use]
    pub fn column_index(&self, offset: TextSize) -> usize {
        let line = self.line_index(offset);
        let start = self.line_starts.get(line - 1).copied().unwrap_or(0);
        offset.to_usize().saturating_sub(start)
    }
}

/// Returns the leading whitespace of the line that contains `offset`.
#[must_use]
pub fn line_indent(source: &str, offset: usize) -> &str {
    let offset = offset.min(source.len());
    let line_start = source[..offset].rfind('\n').map_or(0, |nl| nl + 1);
    let line = &source[line_start..];
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..width]
}

/// Indentation before `offset` when only whitespace precedes it on its line.
#[must_use]
pub fn statement_indent(source: &str, offset: usize) -> Option<&str> {
    let indent = line_indent(source, offset);
    let offset = offset.min(source.len());
    let line_start = source[..offset].rfind('\n').map_or(0, |nl| nl + 1);
    (line_start + indent.len() == offset).then_some(indent)
}

/// Guesses the indentation unit of a source file.
///
/// Uses the leading whitespace of the first indented code line, which in
/// well-formed Python is exactly one nesting level. Falls back to four spaces.
#[must_use]
pub fn detect_indent_unit(source: &str) -> String {
    source
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !trimmed.is_empty() && !trimmed.starts_with('#') && trimmed.len() < line.len()
        })
        .map(|line| &line[..line.len() - line.trim_start().len()])
        .next()
        .map_or_else(|| "    ".to_owned(), str::to_owned)
}
