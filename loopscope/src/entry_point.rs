use crate::cli::{Cli, Commands};
use crate::commands::Settings;
use crate::config::Config;
use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Runs loopscope with the given arguments.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run_with_args(args: Vec<String>) -> Result<i32> {
    run_with_args_to(args, &mut std::io::stdout())
}

/// Run loopscope with the given arguments, writing output to the specified writer.
///
/// This is the testable version of `run_with_args` that allows output capture.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run_with_args_to<W: std::io::Write>(args: Vec<String>, writer: &mut W) -> Result<i32> {
    let mut program_args = vec!["loopscope".to_owned()];
    program_args.extend(args);
    let cli_var = match Cli::try_parse_from(program_args) {
        Ok(c) => c,
        Err(e) => match e.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                write!(writer, "{e}")?;
                writer.flush()?;
                return Ok(0);
            }
            _ => {
                eprint!("{e}");
                return Ok(1);
            }
        },
    };

    crate::logging::init(cli_var.output.verbose);

    let paths: &[PathBuf] = match &cli_var.command {
        Some(Commands::Analyze { paths }) => paths,
        Some(Commands::Rewrite { file }) => std::slice::from_ref(file),
        None => &cli_var.paths,
    };

    if paths.is_empty() {
        eprintln!("Error: no input files given. Run 'loopscope --help' for usage.");
        return Ok(1);
    }
    if let Some(missing) = crate::commands::missing_input(paths) {
        eprintln!(
            "Error: The file or directory '{}' does not exist.",
            missing.display()
        );
        return Ok(1);
    }

    // Load config from the first path
    let config_path = paths.first().map_or(Path::new("."), PathBuf::as_path);
    let config = Config::load_from_path(config_path);
    if let Some(file) = &config.config_file_path {
        tracing::debug!(config = %file.display(), "loaded configuration");
    }
    let settings = merge_settings(&cli_var, &config);

    if cli_var.output.verbose && !settings.json {
        eprintln!("[VERBOSE] loopscope v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("[VERBOSE] Using {} threads", rayon::current_num_threads());
        eprintln!("[VERBOSE] Settings: {settings:?}");
        eprintln!();
    }

    match &cli_var.command {
        Some(Commands::Analyze { paths }) => crate::commands::run_analyze(paths, &settings, writer),
        Some(Commands::Rewrite { file }) => crate::commands::run_rewrite(file, &settings, writer),
        None => crate::commands::run_optimize(&cli_var.paths, &settings, writer),
    }
}

/// Applies command-line flags on top of the configuration file values.
fn merge_settings(cli: &Cli, config: &Config) -> Settings {
    let file = &config.loopscope;
    let defaults = Settings::default();

    let mut rewrite = file.rewrite_config();
    rewrite.flatten &= !cli.analysis.no_flatten;
    rewrite.vectorize &= !cli.analysis.no_vectorize;

    let mut exclude = file.exclude.clone().unwrap_or_default();
    exclude.extend(cli.analysis.exclude.iter().cloned());

    Settings {
        threshold: cli
            .analysis
            .threshold
            .or(file.high_iteration_threshold)
            .unwrap_or(defaults.threshold),
        rewrite,
        exclude,
        output_dir: cli
            .optimize
            .output_dir
            .clone()
            .or_else(|| file.output_dir.clone())
            .unwrap_or(defaults.output_dir),
        report: cli
            .optimize
            .report
            .clone()
            .or_else(|| file.report.clone())
            .unwrap_or(defaults.report),
        profile: !cli.optimize.no_profile && file.profile.unwrap_or(true),
        python: cli
            .optimize
            .python
            .clone()
            .or_else(|| file.python.clone())
            .unwrap_or(defaults.python),
        json: cli.output.json,
        quiet: cli.output.quiet,
    }
}
