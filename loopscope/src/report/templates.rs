use askama::Template;

/// Nested loop row.
#[derive(Debug, Clone)]
pub struct NestedLoopView {
    pub line: usize,
    pub level: usize,
}

/// Applied rewrite row.
#[derive(Debug, Clone)]
pub struct RewriteView {
    pub line: usize,
    pub rule: String,
    pub description: String,
}

/// Per-file section of the report.
#[derive(Debug, Clone)]
pub struct FileView {
    pub path: String,
    /// Syntax error message, when the file did not parse.
    pub error: Option<String>,
    pub suggestions: Vec<String>,
    pub nested_loops: Vec<NestedLoopView>,
    pub rewrites: Vec<RewriteView>,
    pub imports: Vec<String>,
    pub optimized_path: Option<String>,
    pub profile: Option<String>,
}

/// View model for the single-page optimization report.
#[derive(Template)]
#[template(path = "report.html")]
pub struct ReportTemplate {
    /// loopscope version.
    pub version: String,
    /// Generation timestamp.
    pub generated_at: String,
    pub files: Vec<FileView>,
    pub total_suggestions: usize,
    pub total_rewrites: usize,
}
