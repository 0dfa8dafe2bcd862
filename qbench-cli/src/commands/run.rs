use crate::commands::{load_config, SweepArgs};
use crate::output;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use color_eyre::eyre::bail;
use color_eyre::Result;

use matrix_core::{
    progress_channel, MatrixDriver, RunEvent, RunRequest, Runner, Shell, ShellRunner,
};

/// Generate a sweep and run it through the shell
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub sweep: SweepArgs,

    /// Working directory for the benchmark commands
    #[arg(long, value_name = "DIR")]
    pub working_dir: Option<PathBuf>,

    /// Kill a benchmark after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Run commands through bash instead of sh
    #[arg(long)]
    pub bash: bool,

    /// Do not create the output directory before running
    #[arg(long)]
    pub no_create_dir: bool,
}

pub async fn execute(config_path: Option<&Path>, args: RunArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let scenario = config.scenarios.get(&args.sweep.scenario)?;
    let axes = args.sweep.axes(&config)?;

    let sweep = MatrixDriver::generate(scenario, &config.catalog, &axes)?;
    if sweep.is_empty() {
        bail!("nothing to run: the sweep is empty; check the thread, work and variant axes");
    }
    let invocations = sweep.invocations()?;

    output::info(&format!(
        "Scenario '{}': {} across {}",
        scenario.name,
        output::plural(invocations.len(), "run"),
        output::plural(axes.variants.len(), "variant"),
    ));

    let (tx, mut rx) = progress_channel();
    let mut runner = ShellRunner::new()
        .with_create_directory(!args.no_create_dir)
        .with_progress(tx);
    if let Some(dir) = args.working_dir {
        runner = runner.with_working_dir(dir);
    }
    if let Some(secs) = args.timeout {
        runner = runner.with_timeout(Duration::from_secs(secs));
    }
    if args.bash {
        runner = runner.with_shell(Shell::Bash);
    }

    let request = RunRequest::new(&invocations, &axes);
    let total = invocations.len();

    // The runner owns the only sender, so the event loop ends when it is dropped
    let run = async move { runner.run(request).await };
    let report = async {
        while let Some(event) = rx.recv().await {
            print_event(&event, total);
        }
    };
    let (result, ()) = tokio::join!(run, report);
    let summary = result?;

    if summary.success() {
        Ok(())
    } else {
        for path in &summary.failures {
            output::dim(&format!("  failed: {}", path.display()));
        }
        bail!("{} failed", output::plural(summary.failed, "benchmark"))
    }
}

fn print_event(event: &RunEvent, total: usize) {
    match event {
        RunEvent::SweepStarted { total, directory } => {
            println!();
            output::header(&format!(
                "Running {} into '{}'",
                output::plural(*total, "benchmark"),
                directory
            ));
        }

        RunEvent::InvocationStarted {
            index,
            command_line,
        } => {
            output::status(&format!("[{}/{}]", index + 1, total), command_line);
        }

        RunEvent::InvocationCompleted {
            output_path,
            exit_code,
            duration,
            stderr,
            ..
        } => {
            if *exit_code == Some(0) {
                output::check(&format!(
                    "{} ({:.2}s)",
                    output_path.display(),
                    duration.as_secs_f64()
                ));
            } else {
                let code = exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "killed".to_string());
                output::failure(&format!("{} (exit {})", output_path.display(), code));
                for line in stderr.lines() {
                    output::run_error(line);
                }
            }
        }

        RunEvent::SweepCompleted { summary } => {
            println!();
            if summary.success() {
                output::success(&format!(
                    "{} completed in {:.2}s",
                    output::plural(summary.succeeded, "benchmark"),
                    summary.duration.as_secs_f64()
                ));
            } else {
                output::failure(&format!(
                    "{} of {} failed after {:.2}s",
                    summary.failed,
                    output::plural(summary.total, "benchmark"),
                    summary.duration.as_secs_f64()
                ));
            }
        }
    }
}
