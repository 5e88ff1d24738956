//! Path helpers: Python file discovery and display normalization.

use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_EXCLUDE_FOLDERS, OPTIMIZED_SUFFIX};

/// Normalizes a path for CLI display.
///
/// - Converts backslashes to forward slashes (for cross-platform consistency)
/// - Strips leading "./" prefix (for cleaner output)
///
/// # Examples
/// ```
/// use std::path::Path;
/// use loopscope::utils::normalize_display_path;
///
/// assert_eq!(normalize_display_path(Path::new(".\\scripts\\loops.py")), "scripts/loops.py");
/// assert_eq!(normalize_display_path(Path::new("./src/main.py")), "src/main.py");
/// ```
#[must_use]
pub fn normalize_display_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    let normalized = s.replace('\\', "/");
    normalized
        .strip_prefix("./")
        .unwrap_or(&normalized)
        .to_owned()
}

/// Checks if a name matches any exclusion pattern.
/// Supports exact matching and wildcard patterns starting with `*.`.
#[must_use]
pub fn is_excluded(name: &str, excludes: &[String]) -> bool {
    excludes.iter().any(|exclude| match exclude.strip_prefix('*') {
        Some(suffix) if suffix.starts_with('.') => name.ends_with(suffix),
        _ => name == exclude,
    })
}

/// File name used for the rewritten copy of `script`, e.g. `loops_optimized.py`.
#[must_use]
pub fn optimized_file_name(script: &Path) -> String {
    let stem = script
        .file_stem()
        .map_or_else(|| "script".into(), |s| s.to_string_lossy());
    format!("{stem}{OPTIMIZED_SUFFIX}.py")
}

/// Expands the given inputs into a sorted list of Python files.
///
/// Files are taken as given; directories are walked with gitignore semantics,
/// skipping the default excluded folders plus `exclude`.
pub fn collect_python_files(inputs: &[PathBuf], exclude: &[String]) -> Vec<PathBuf> {
    use ignore::WalkBuilder;

    let mut excludes: Vec<String> = DEFAULT_EXCLUDE_FOLDERS()
        .iter()
        .map(|&s| s.to_owned())
        .collect();
    excludes.extend(exclude.iter().cloned());

    let mut files = Vec::new();
    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
            continue;
        }

        let root = input.clone();
        let excludes_for_filter = excludes.clone();
        // Skip excluded directories at traversal time so we never descend into
        // virtualenvs or build output.
        let walker = WalkBuilder::new(input)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .filter_entry(move |entry| {
                if entry.path() == root {
                    return true;
                }
                if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
                    return true;
                }
                entry
                    .file_name()
                    .to_str()
                    .is_none_or(|name| !is_excluded(name, &excludes_for_filter))
            })
            .build();

        for result in walker {
            match result {
                Ok(entry) => {
                    let path = entry.path();
                    if entry.file_type().is_some_and(|ft| ft.is_file())
                        && path.extension().is_some_and(|ext| ext == "py")
                    {
                        files.push(path.to_path_buf());
                    }
                }
                Err(e) => tracing::debug!("walk error: {e}"),
            }
        }
    }

    files.sort();
    files.dedup();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_collect_skips_excluded_dirs() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let root = temp.path();
        fs::create_dir_all(root.join("pkg"))?;
        fs::create_dir_all(root.join(".venv/lib"))?;
        fs::write(root.join("pkg/loops.py"), "x = 1\n")?;
        fs::write(root.join("pkg/notes.txt"), "not python")?;
        fs::write(root.join(".venv/lib/site.py"), "y = 2\n")?;

        let files = collect_python_files(&[root.to_path_buf()], &[]);
        assert_eq!(files, vec![root.join("pkg/loops.py")]);
        Ok(())
    }

    #[test]
    fn test_optimized_file_name() {
        assert_eq!(
            optimized_file_name(Path::new("scripts/test1.py")),
            "test1_optimized.py"
        );
    }

    #[test]
    fn test_is_excluded_wildcard() {
        let excludes = vec!["*.egg-info".to_owned(), "build".to_owned()];
        assert!(is_excluded("pkg.egg-info", &excludes));
        assert!(is_excluded("build", &excludes));
        assert!(!is_excluded("src", &excludes));
    }
}
