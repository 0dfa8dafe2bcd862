use crate::commands::{load_config, SweepArgs};
use crate::output;

use std::io::{self, Write};
use std::path::Path;

use clap::{Args, ValueEnum};
use color_eyre::Result;

use matrix_core::MatrixDriver;

/// Output format for generated command lines
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    /// One command line per line
    #[default]
    Text,
    /// JSON array of {command_line, output_path}
    Json,
}

/// Print the command lines of a sweep
#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub sweep: SweepArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

pub fn execute(config_path: Option<&Path>, args: GenerateArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let scenario = config.scenarios.get(&args.sweep.scenario)?;
    let axes = args.sweep.axes(&config)?;

    let sweep = MatrixDriver::generate(scenario, &config.catalog, &axes)?;
    if sweep.is_empty() {
        output::warning("sweep is empty; check the thread, work and variant axes");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        Format::Text => {
            for invocation in sweep.iter() {
                writeln!(out, "{}", invocation?.command_line)?;
            }
        }
        Format::Json => {
            let invocations = sweep.invocations()?;
            serde_json::to_writer_pretty(&mut out, &invocations)?;
            writeln!(out)?;
        }
    }
    out.flush()?;

    output::dim(&format!(
        "{} for scenario '{}'",
        output::plural(sweep.len(), "command line"),
        scenario.name
    ));
    Ok(())
}
