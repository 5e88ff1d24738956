//! Dynamic profiling of the analyzed program.
//!
//! Both profilers run the target script under a Python interpreter with its
//! own stdout captured away, and return the profiler's text report.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::debug;

use crate::constants::DEFAULT_PYTHON;

const RUNTIME_PROBE: &str = r#"
import contextlib, cProfile, io, pstats, runpy, sys
path = sys.argv[1]
sys.argv = [path]
profiler = cProfile.Profile()
with contextlib.redirect_stdout(io.StringIO()):
    profiler.enable()
    try:
        runpy.run_path(path, run_name="__main__")
    except SystemExit:
        pass
    finally:
        profiler.disable()
report = io.StringIO()
pstats.Stats(profiler, stream=report).sort_stats("cumulative").print_stats()
print(report.getvalue())
"#;

const MEMORY_PROBE: &str = r#"
import contextlib, io, runpy, sys, tracemalloc
path = sys.argv[1]
sys.argv = [path]
tracemalloc.start()
with contextlib.redirect_stdout(io.StringIO()):
    try:
        runpy.run_path(path, run_name="__main__")
    except SystemExit:
        pass
_, peak = tracemalloc.get_traced_memory()
tracemalloc.stop()
print(f"Peak memory usage: {peak / (1024 * 1024):.2f} MB")
"#;

/// Errors raised while profiling a script.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("script not found: {0}")]
    MissingScript(PathBuf),
    #[error("failed to start '{python}': {source}")]
    Spawn {
        python: String,
        #[source]
        source: std::io::Error,
    },
    #[error("profiled script exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

/// Source of execution-time and memory reports for a script.
pub trait Profiler {
    /// Function-level timing report sorted by cumulative time.
    ///
    /// # Errors
    /// Fails when the script is missing, the interpreter cannot be started or
    /// the script raises.
    fn profile_runtime(&self, script: &Path) -> Result<String, ProfileError>;

    /// Single line `Peak memory usage: X.XX MB`.
    ///
    /// # Errors
    /// Same conditions as [`Profiler::profile_runtime`].
    fn profile_memory(&self, script: &Path) -> Result<String, ProfileError>;
}

/// Profiles scripts with `cProfile` and `tracemalloc` in a child interpreter.
#[derive(Debug, Clone)]
pub struct PythonProfiler {
    python: String,
}

impl Default for PythonProfiler {
    fn default() -> Self {
        Self::new(DEFAULT_PYTHON)
    }
}

impl PythonProfiler {
    #[must_use]
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    fn run(&self, probe: &str, script: &Path) -> Result<String, ProfileError> {
        if !script.is_file() {
            return Err(ProfileError::MissingScript(script.to_path_buf()));
        }
        debug!(python = %self.python, script = %script.display(), "profiling");
        let output = Command::new(&self.python)
            .arg("-c")
            .arg(probe)
            .arg(script)
            .output()
            .map_err(|source| ProfileError::Spawn {
                python: self.python.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProfileError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_owned())
    }
}

impl Profiler for PythonProfiler {
    fn profile_runtime(&self, script: &Path) -> Result<String, ProfileError> {
        self.run(RUNTIME_PROBE, script)
    }

    fn profile_memory(&self, script: &Path) -> Result<String, ProfileError> {
        self.run(MEMORY_PROBE, script)
    }
}

/// Runs both profilers and joins their output for the report.
///
/// Failures do not abort the caller; they become a note in the text.
pub fn profile_summary(profiler: &dyn Profiler, script: &Path) -> String {
    let mut sections = Vec::with_capacity(2);
    for (label, result) in [
        ("Runtime profile", profiler.profile_runtime(script)),
        ("Memory profile", profiler.profile_memory(script)),
    ] {
        match result {
            Ok(text) => sections.push(format!("{label}:\n{text}")),
            Err(err) => {
                debug!(%err, "profiling failed");
                sections.push(format!("{label}: profiling unavailable ({err})"));
            }
        }
    }
    sections.join("\n\n")
}
