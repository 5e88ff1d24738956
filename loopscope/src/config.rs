use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{CONFIG_FILENAME, PYPROJECT_FILENAME};
use crate::rewrite::RewriteConfig;

#[derive(Debug, Deserialize, Default, Clone)]
/// Top-level configuration struct.
pub struct Config {
    #[serde(default)]
    /// The `[loopscope]` section.
    pub loopscope: LoopscopeConfig,
    /// The path to the configuration file this was loaded from.
    /// Set during `load_from_path`, `None` if using defaults.
    #[serde(skip)]
    pub config_file_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
/// Configuration options for loopscope. Every key is optional; command-line
/// flags take precedence.
pub struct LoopscopeConfig {
    /// `range(n)` loops with `n` above this are reported.
    pub high_iteration_threshold: Option<u64>,
    /// Whether to flatten nested loops.
    pub flatten: Option<bool>,
    /// Whether to vectorize element-wise loops.
    pub vectorize: Option<bool>,
    /// Whether to run the runtime and memory profilers.
    pub profile: Option<bool>,
    /// Interpreter used for profiling.
    pub python: Option<String>,
    /// Directory receiving rewritten files.
    pub output_dir: Option<PathBuf>,
    /// Path of the HTML report.
    pub report: Option<PathBuf>,
    /// Extra folder names (or `*.suffix` patterns) to skip when walking.
    pub exclude: Option<Vec<String>>,
}

impl LoopscopeConfig {
    /// Rule toggles, defaulting to every rule enabled.
    #[must_use]
    pub fn rewrite_config(&self) -> RewriteConfig {
        RewriteConfig {
            flatten: self.flatten.unwrap_or(true),
            vectorize: self.vectorize.unwrap_or(true),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
struct PyProject {
    tool: ToolConfig,
}

#[derive(Debug, Deserialize, Clone)]
struct ToolConfig {
    loopscope: LoopscopeConfig,
}

impl Config {
    /// Loads configuration starting from a specific path and traversing up.
    ///
    /// In each directory `.loopscope.toml` wins over `pyproject.toml`; a
    /// `pyproject.toml` without a `[tool.loopscope]` table is skipped.
    #[must_use]
    pub fn load_from_path(path: &Path) -> Self {
        let mut current = path.to_path_buf();
        if current.is_file() {
            current.pop();
        }

        loop {
            let loopscope_toml = current.join(CONFIG_FILENAME);
            if loopscope_toml.exists() {
                if let Some(mut config) = read_toml::<Config>(&loopscope_toml) {
                    config.config_file_path = Some(loopscope_toml);
                    return config;
                }
            }

            let pyproject_toml = current.join(PYPROJECT_FILENAME);
            if pyproject_toml.exists() {
                if let Some(pyproject) = read_toml::<PyProject>(&pyproject_toml) {
                    return Config {
                        loopscope: pyproject.tool.loopscope,
                        config_file_path: Some(pyproject_toml),
                    };
                }
            }

            if !current.pop() {
                break;
            }
        }

        Config::default()
    }
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let content = fs::read_to_string(path).ok()?;
    match toml::from_str::<T>(&content) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "ignoring config file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_path_no_config() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from_path(dir.path());
        assert_eq!(config.loopscope, LoopscopeConfig::default());
        assert!(config.config_file_path.is_none());
    }

    #[test]
    fn test_load_from_path_loopscope_toml() {
        let dir = TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join(".loopscope.toml")).unwrap();
        writeln!(
            file,
            r"[loopscope]
high_iteration_threshold = 500
vectorize = false
"
        )
        .unwrap();

        let config = Config::load_from_path(dir.path());
        assert_eq!(config.loopscope.high_iteration_threshold, Some(500));
        assert_eq!(
            config.loopscope.rewrite_config(),
            RewriteConfig {
                flatten: true,
                vectorize: false
            }
        );
    }

    #[test]
    fn test_load_from_path_pyproject_toml() {
        let dir = TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join("pyproject.toml")).unwrap();
        writeln!(
            file,
            r#"[tool.loopscope]
python = "python3.12"
exclude = ["notebooks"]
"#
        )
        .unwrap();

        let config = Config::load_from_path(dir.path());
        assert_eq!(config.loopscope.python.as_deref(), Some("python3.12"));
        assert_eq!(config.loopscope.exclude, Some(vec!["notebooks".to_owned()]));
    }

    #[test]
    fn test_pyproject_without_tool_table_is_skipped() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("pkg");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("pyproject.toml"), "[project]\nname = \"demo\"\n").unwrap();
        std::fs::write(
            dir.path().join(".loopscope.toml"),
            "[loopscope]\nprofile = false\n",
        )
        .unwrap();

        let config = Config::load_from_path(&nested);
        assert_eq!(config.loopscope.profile, Some(false));
    }

    #[test]
    fn test_load_from_file_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".loopscope.toml"),
            "[loopscope]\noutput_dir = \"out\"\n",
        )
        .unwrap();
        let py_file = dir.path().join("loops.py");
        std::fs::write(&py_file, "x = 1").unwrap();

        let config = Config::load_from_path(&py_file);
        assert_eq!(config.loopscope.output_dir, Some(PathBuf::from("out")));
    }
}
