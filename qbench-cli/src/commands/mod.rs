pub mod generate;
pub mod list;
pub mod run;
pub mod validate;

use crate::output;

use std::path::Path;

use clap::Args;
use color_eyre::eyre::bail;
use color_eyre::Result;

use matrix_core::{BenchConfig, ConfigError, ConfigParser, SweepAxes};
use tracing::debug;

/// Output directory when neither `--dir` nor anything else says otherwise
pub const DEFAULT_DIRECTORY: &str = "tmp/";

/// Axis selection shared by `generate` and `run`
#[derive(Args, Debug, Clone, Default)]
pub struct SweepArgs {
    /// Scenario to expand (see `qbench list scenarios`)
    pub scenario: String,

    /// Machine profile supplying default axes (default: the configured default profile)
    #[arg(long, short = 'p', value_name = "NAME")]
    pub profile: Option<String>,

    /// Variants to sweep, in order
    #[arg(long, value_delimiter = ',', value_name = "ID,...")]
    pub variants: Vec<String>,

    /// Thread counts to sweep
    #[arg(long, short = 't', value_delimiter = ',', value_name = "N,...")]
    pub threads: Vec<u32>,

    /// Work values to sweep
    #[arg(long, short = 'w', value_delimiter = ',', value_name = "N,...")]
    pub works: Vec<u64>,

    /// Partition values, applied to variants that declare a partition flag
    #[arg(long, value_delimiter = ',', value_name = "N,...")]
    pub partitions: Vec<u64>,

    /// Global thread cap
    #[arg(long, value_name = "N")]
    pub max_threads: Option<u32>,

    /// Output directory for benchmark results
    #[arg(long, short = 'd', value_name = "DIR")]
    pub dir: Option<String>,

    /// Collect performance counters
    #[arg(long)]
    pub perf: bool,

    /// Prefill forwarded to the runner and bindable as {prefill}
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub prefill: u64,
}

impl SweepArgs {
    /// Start from the selected profile, then apply every override given on the command line
    pub fn axes(&self, config: &BenchConfig) -> Result<SweepAxes> {
        let directory = self.dir.as_deref().unwrap_or(DEFAULT_DIRECTORY);

        let mut axes = match config.select_profile(self.profile.as_deref())? {
            Some(profile) => SweepAxes::from_profile(profile, directory),
            None => SweepAxes::new(Vec::new(), Vec::new(), Vec::new(), directory),
        };

        if !self.variants.is_empty() {
            axes.variants = self.variants.clone();
        }
        if !self.threads.is_empty() {
            axes.threads = self.threads.clone();
        }
        if !self.works.is_empty() {
            axes.works = self.works.clone();
        }
        if !self.partitions.is_empty() {
            axes.partitions = self.partitions.clone();
        }
        if let Some(cap) = self.max_threads {
            axes.max_threads = cap;
        }

        if axes.variants.is_empty() {
            bail!("no variants selected; pass --variants or --profile");
        }

        Ok(axes.with_perf(self.perf).with_prefill(self.prefill))
    }
}

/// Load the configuration, listing every validation problem before failing
pub fn load_config(path: Option<&Path>) -> Result<BenchConfig> {
    debug!(path = ?path, "loading configuration");
    match ConfigParser::load(path) {
        Ok(config) => Ok(config),
        Err(ConfigError::Invalid { errors }) => {
            output::error(&format!("{} configuration error(s):", errors.len()));
            for error in &errors {
                output::error(&format!("  - [{}] {}", error.path, error.message));
                if let Some(suggestion) = &error.suggestion {
                    output::info(&format!("    Suggestion: {}", suggestion));
                }
            }
            bail!("invalid configuration")
        }
        Err(e) => Err(e.into()),
    }
}
