use crate::commands::load_config;

use std::path::Path;

use clap::{Args, ValueEnum};
use color_eyre::Result;

use matrix_core::BenchConfig;

/// What to list
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListKind {
    Variants,
    Scenarios,
    Profiles,
}

/// List the contents of the configuration
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list this kind of entry (default: everything)
    #[arg(value_enum)]
    pub kind: Option<ListKind>,
}

pub fn execute(config_path: Option<&Path>, args: ListArgs) -> Result<()> {
    let config = load_config(config_path)?;

    match args.kind {
        Some(ListKind::Variants) => print_variants(&config),
        Some(ListKind::Scenarios) => print_scenarios(&config),
        Some(ListKind::Profiles) => print_profiles(&config),
        None => {
            println!("Variants:");
            print_variants(&config);
            println!("\nScenarios:");
            print_scenarios(&config);
            println!("\nProfiles:");
            print_profiles(&config);
        }
    }
    Ok(())
}

fn print_variants(config: &BenchConfig) {
    for (id, entry) in config.catalog.entries() {
        let mut line = format!("  {:<24}", id);
        if let Some(exe) = &entry.executable {
            line.push_str(&format!(" exe: {}", exe.command_line()));
        }
        if let Some(flag) = &entry.partition_flag {
            line.push_str(&format!(" partition: -{}", flag));
        }
        if let Some(cap) = entry.max_threads {
            line.push_str(&format!(" max_threads: {}", cap));
        }
        println!("{}", line.trim_end());
    }
}

fn print_scenarios(config: &BenchConfig) {
    for scenario in config.scenarios.iter() {
        println!("  {:<16} {}", scenario.name, scenario.filename.source());
    }
}

fn print_profiles(config: &BenchConfig) {
    for (name, profile) in &config.profiles {
        let default = if config.default_profile.as_deref() == Some(name.as_str()) {
            " (default)"
        } else {
            ""
        };
        let threads: Vec<String> = profile.threads.iter().map(u32::to_string).collect();
        println!(
            "  {}{}: {} variants, {} works, threads [{}]",
            name,
            default,
            profile.variants.len(),
            profile.works.len(),
            threads.join(", ")
        );
    }
}
