mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use commands::generate::GenerateArgs;
use commands::list::ListArgs;
use commands::run::RunArgs;
use commands::validate::ValidateArgs;

/// Benchmark matrix generator and runner for concurrent data structures
#[derive(Parser, Debug)]
#[command(name = "qbench", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: the built-in configuration)
    #[arg(long, short = 'c', value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the command lines of a sweep without running them
    Generate(GenerateArgs),

    /// Generate a sweep and run every command line
    Run(RunArgs),

    /// List variants, scenarios and profiles
    List(ListArgs),

    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Generate(args) => commands::generate::execute(config, args),
        Commands::Run(args) => commands::run::execute(config, args).await,
        Commands::List(args) => commands::list::execute(config, args),
        Commands::Validate(args) => commands::validate::execute(config, args),
    }
}

/// `-v` flags win over `RUST_LOG`; with neither, only warnings are shown
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
