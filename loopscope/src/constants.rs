//! Shared constants: thresholds, injected import names, file names.

use rustc_hash::FxHashSet;
use std::sync::OnceLock;

/// Name of the project-level configuration file.
pub const CONFIG_FILENAME: &str = ".loopscope.toml";

/// Name of the Python project file that may carry a `[tool.loopscope]` table.
pub const PYPROJECT_FILENAME: &str = "pyproject.toml";

/// A `range(n)` loop is reported as high-iteration when `n` exceeds this value.
pub const DEFAULT_HIGH_ITERATION_THRESHOLD: u64 = 1000;

/// Directory that receives rewritten sources.
pub const DEFAULT_OUTPUT_DIR: &str = "optimized_code";

/// Default HTML report path.
pub const DEFAULT_REPORT_FILE: &str = "report.html";

/// Suffix appended to the stem of rewritten files.
pub const OPTIMIZED_SUFFIX: &str = "_optimized";

/// Interpreter used by the profilers when none is configured.
pub const DEFAULT_PYTHON: &str = "python3";

/// Builtin whose single literal argument bounds a loop's iteration count.
pub const RANGE_BUILTIN: &str = "range";

/// Builtin used as the collection argument of a vectorizable loop.
pub const LEN_BUILTIN: &str = "len";

/// Module providing cross-product iteration.
pub const ITERTOOLS_MODULE: &str = "itertools";

/// Attribute of [`ITERTOOLS_MODULE`] used by loop flattening.
pub const PRODUCT_ATTR: &str = "product";

/// Module providing vectorized numeric arrays.
pub const NUMPY_MODULE: &str = "numpy";

/// Conventional binding for [`NUMPY_MODULE`].
pub const NUMPY_ALIAS: &str = "np";

/// Attribute of the numpy binding used to build an array.
pub const ARRAY_ATTR: &str = "array";

/// Set of folders to exclude by default.
pub fn get_default_exclude_folders() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        let mut s = FxHashSet::default();
        s.insert("__pycache__");
        s.insert(".git");
        s.insert(".pytest_cache");
        s.insert(".mypy_cache");
        s.insert(".tox");
        s.insert("build");
        s.insert("dist");
        s.insert("*.egg-info");
        s.insert("venv");
        s.insert(".venv");
        s.insert(DEFAULT_OUTPUT_DIR);
        s
    })
}

pub use get_default_exclude_folders as DEFAULT_EXCLUDE_FOLDERS;
