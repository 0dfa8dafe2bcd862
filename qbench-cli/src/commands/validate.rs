use crate::output;

use std::path::Path;

use clap::Args;
use color_eyre::eyre::bail;
use color_eyre::Result;

use matrix_core::{ConfigParser, ConfigValidator, MatrixDriver, SweepAxes};

/// Validate a configuration file
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Also expand every scenario against every profile and report the run counts
    #[arg(long)]
    pub sweeps: bool,
}

pub fn execute(config_path: Option<&Path>, args: ValidateArgs) -> Result<()> {
    // Step 1: Parse YAML syntax
    let file = match config_path {
        Some(path) => {
            if !path.exists() {
                bail!("Configuration file not found: {}", path.display());
            }
            output::status("Validating", &format!("{}", path.display()));
            ConfigParser::parse_file(path)
        }
        None => {
            output::status("Validating", "built-in configuration");
            ConfigParser::builtin()
        }
    };
    let file = match file {
        Ok(file) => file,
        Err(e) => {
            output::error(&format!("Parse error: {}", e));
            bail!("configuration could not be parsed");
        }
    };
    output::check("YAML syntax valid");

    // Step 2: Semantic validation, reporting everything at once
    if let Err(errors) = ConfigValidator::validate(&file) {
        output::error(&format!("{} validation error(s):", errors.len()));
        for error in &errors {
            output::error(&format!("  - [{}] {}", error.path, error.message));
            if let Some(suggestion) = &error.suggestion {
                output::info(&format!("    Suggestion: {}", suggestion));
            }
        }
        bail!("invalid configuration");
    }
    output::check("Semantic validation passed");

    // Step 3: Compile into catalog, scenarios and profiles
    let config = file.compile()?;
    output::check(&format!(
        "Structure: {} variants, {} scenarios, {} profiles",
        config.catalog.len(),
        config.scenarios.len(),
        config.profiles.len()
    ));

    // Step 4: Expand sweeps (optional)
    if args.sweeps {
        output::status("Expanding", "scenarios against profiles...");
        let mut failures = 0;
        for profile in config.profiles.values() {
            let axes = SweepAxes::from_profile(profile, "tmp/");
            for scenario in config.scenarios.iter() {
                match MatrixDriver::generate(scenario, &config.catalog, &axes) {
                    Ok(sweep) if sweep.is_empty() => output::warning(&format!(
                        "{} x {}: sweep is empty",
                        profile.name, scenario.name
                    )),
                    Ok(sweep) => output::check(&format!(
                        "{} x {}: {}",
                        profile.name,
                        scenario.name,
                        output::plural(sweep.len(), "run")
                    )),
                    Err(e) => {
                        failures += 1;
                        output::warning(&format!("{} x {}: {}", profile.name, scenario.name, e));
                    }
                }
            }
        }
        if failures > 0 {
            output::info(&format!(
                "{} cannot be swept with its profile as-is; narrow the axes on the command line",
                output::plural(failures, "combination")
            ));
        }
    }

    println!();
    output::success("Configuration is valid");
    Ok(())
}
