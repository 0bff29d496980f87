//! Volante CLI entry point
//!
//! ## Usage
//!
//! ```bash
//! volante init                          # Scaffold settings, manifest, data table
//! volante plan                          # Show what the manifest would run
//! volante validate --datatables dir    # Check manifest + data files
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use volante_cli::{handlers, CliConfig, CliResult, ColorChoice, Verbosity};

#[derive(Debug, Parser)]
#[command(name = "volante", version, about = "Keyword-driven test automation harness")]
struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// When to colorize output
    #[arg(long, global = true, value_enum, default_value_t = ColorArg::Auto)]
    color: ColorArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ColorArg {
    Auto,
    Always,
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve the manifest against the settings and show what would run
    Plan(PlanArgs),
    /// Check the settings, manifest and data files for problems
    Validate(ValidateArgs),
    /// Scaffold a starter project layout
    Init(InitArgs),
}

#[derive(Debug, clap::Args)]
struct PlanArgs {
    /// Settings file
    #[arg(long, default_value = "settings.yaml")]
    settings: PathBuf,

    /// Run manifest file
    #[arg(long, default_value = "manifest.yaml")]
    manifest: PathBuf,

    /// Run configuration name (defaults to the one in the settings)
    #[arg(long)]
    run_configuration: Option<String>,

    /// Emit machine-readable JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, clap::Args)]
struct ValidateArgs {
    /// Settings file
    #[arg(long, default_value = "settings.yaml")]
    settings: PathBuf,

    /// Run manifest file
    #[arg(long, default_value = "manifest.yaml")]
    manifest: PathBuf,

    /// Data table directory; per-module data checks are skipped without it
    #[arg(long)]
    datatables: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
struct InitArgs {
    /// Target directory
    #[arg(long, default_value = ".")]
    dir: PathBuf,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(config.verbosity);

    match &cli.command {
        Commands::Plan(args) => handlers::plan(
            &config,
            &args.settings,
            &args.manifest,
            args.run_configuration.as_deref(),
            args.json,
        ),
        Commands::Validate(args) => handlers::validate(
            &config,
            &args.settings,
            &args.manifest,
            args.datatables.as_deref(),
        ),
        Commands::Init(args) => handlers::init(&config, &args.dir),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else {
        match cli.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    };
    CliConfig::new()
        .with_verbosity(verbosity)
        .with_color(cli.color.into())
}

fn init_tracing(verbosity: Verbosity) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.tracing_filter()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
