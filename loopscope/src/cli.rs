use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Help text for configuration file options, shown at the bottom of --help.
const CONFIG_HELP: &str = "\
CONFIGURATION FILE (.loopscope.toml or [tool.loopscope] in pyproject.toml):
  Looked up from the first input path upwards. Command-line flags win.

  [loopscope]
  high_iteration_threshold = 1000   # Report range(n) loops with n above this
  flatten = true                    # Flatten nested loops with itertools.product
  vectorize = true                  # Replace element-wise loops with numpy
  profile = true                    # Run cProfile and tracemalloc on the script
  python = \"python3\"                # Interpreter used for profiling
  output_dir = \"optimized_code\"     # Where rewritten files are written
  report = \"report.html\"            # HTML report path
  exclude = [\"notebooks\"]           # Extra folders to skip

LOGGING:
  Set LOOPSCOPE_LOG (e.g. LOOPSCOPE_LOG=loopscope=trace) to control log output.
";

/// Options for output formatting and verbosity.
#[derive(Args, Debug, Default, Clone)]
pub struct OutputOptions {
    /// Output raw JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output for debugging (shows files being analyzed).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode: only print the final status lines.
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Options controlling the analysis and rewrite passes.
#[derive(Args, Debug, Default, Clone)]
#[allow(clippy::struct_excessive_bools)] // CLI flags are legitimately booleans
pub struct AnalysisOptions {
    /// Report `range(n)` loops with `n` above this value.
    #[arg(long, global = true)]
    pub threshold: Option<u64>,

    /// Do not flatten nested loops.
    #[arg(long, global = true)]
    pub no_flatten: bool,

    /// Do not vectorize element-wise loops.
    #[arg(long, global = true)]
    pub no_vectorize: bool,

    /// Folders to exclude when walking directories.
    #[arg(long, alias = "exclude-folder", global = true)]
    pub exclude: Vec<String>,
}

/// Options for the full optimize run.
#[derive(Args, Debug, Default, Clone)]
pub struct OptimizeOptions {
    /// Directory receiving `<name>_optimized.py` files.
    #[arg(long, short = 'o')]
    pub output_dir: Option<PathBuf>,

    /// Path of the HTML report.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Skip the runtime and memory profilers.
    #[arg(long)]
    pub no_profile: bool,

    /// Python interpreter used for profiling.
    #[arg(long)]
    pub python: Option<String>,
}

/// Command line interface configuration using `clap`.
#[derive(Parser, Debug)]
#[command(
    name = "loopscope",
    author,
    version,
    about = "loopscope - Find and rewrite slow loop patterns in Python code",
    long_about = None,
    after_help = CONFIG_HELP
)]
pub struct Cli {
    #[command(subcommand)]
    /// Subcommand to run; without one, files are analyzed, rewritten and profiled.
    pub command: Option<Commands>,

    /// Python files or directories to optimize.
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    /// Options for the full optimize run.
    pub optimize: OptimizeOptions,

    #[command(flatten)]
    /// Detector and rewrite toggles.
    pub analysis: AnalysisOptions,

    #[command(flatten)]
    /// Output formatting options.
    pub output: OutputOptions,
}

#[derive(Subcommand, Debug)]
/// Available subcommands.
pub enum Commands {
    /// Report loop patterns without rewriting or profiling.
    Analyze {
        /// Python files or directories to analyze.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print the rewritten source of one file to stdout.
    Rewrite {
        /// Python file to rewrite.
        file: PathBuf,
    },
}
