// Configuration Data Models
// Serde types for the YAML document declaring variants, scenarios and profiles

use crate::catalog::{ExecutableSpec, VariantCatalog, VariantEntry};
use crate::error::{ConfigError, ConfigResult};
use crate::sweep::{Profile, Scenario, ScenarioTable, DEFAULT_PERF_FLAGS};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root of a configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Flags rendered through `{perf}` unless a scenario overrides them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perf_flags: Option<String>,

    /// Profile used when the caller does not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,

    #[serde(default)]
    pub variants: BTreeMap<String, VariantConfig>,

    #[serde(default)]
    pub scenarios: BTreeMap<String, ScenarioConfig>,

    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileConfig>,
}

/// One variant. `exe` is split on whitespace into executable name and flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariantConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exe: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_flag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_threads: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    pub command: String,
    pub filename: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perf_flags: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    #[serde(default)]
    pub variants: Vec<String>,

    pub threads: Vec<u32>,

    #[serde(default)]
    pub works: Vec<u64>,

    #[serde(default)]
    pub partitions: Vec<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_threads: Option<u32>,
}

/// Compiled, immutable configuration handed to the matrix driver
#[derive(Debug, Clone, Default)]
pub struct BenchConfig {
    pub catalog: VariantCatalog,
    pub scenarios: ScenarioTable,
    pub profiles: BTreeMap<String, Profile>,
    pub default_profile: Option<String>,
}

impl BenchConfig {
    pub fn profile(&self, name: &str) -> ConfigResult<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                name: name.to_string(),
                available: self.profiles.keys().cloned().collect(),
            })
    }

    /// The named profile, else the configured default, else none
    pub fn select_profile(&self, name: Option<&str>) -> ConfigResult<Option<&Profile>> {
        match name.or(self.default_profile.as_deref()) {
            Some(name) => self.profile(name).map(Some),
            None => Ok(None),
        }
    }
}

impl ConfigFile {
    /// Build the catalog, scenario table and profiles.
    ///
    /// Stops at the first problem; `ConfigValidator` reports all of them.
    pub fn compile(&self) -> ConfigResult<BenchConfig> {
        let mut catalog = VariantCatalog::new();
        for (id, variant) in &self.variants {
            catalog = catalog.with_variant(id.clone(), variant.to_entry(id)?);
        }

        let default_perf = self.perf_flags.as_deref().unwrap_or(DEFAULT_PERF_FLAGS);
        let mut scenarios = ScenarioTable::new();
        for (name, scenario) in &self.scenarios {
            let perf_flags = scenario.perf_flags.as_deref().unwrap_or(default_perf);
            scenarios.insert(
                Scenario::new(name.clone(), &scenario.command, &scenario.filename)?
                    .with_perf_flags(perf_flags),
            );
        }

        let mut profiles = BTreeMap::new();
        for (name, profile) in &self.profiles {
            for id in &profile.variants {
                catalog.resolve(id)?;
            }
            profiles.insert(name.clone(), profile.to_profile(name));
        }

        if let Some(name) = &self.default_profile {
            if !profiles.contains_key(name) {
                return Err(ConfigError::UnknownProfile {
                    name: name.clone(),
                    available: profiles.keys().cloned().collect(),
                });
            }
        }

        Ok(BenchConfig {
            catalog,
            scenarios,
            profiles,
            default_profile: self.default_profile.clone(),
        })
    }
}

impl VariantConfig {
    fn to_entry(&self, id: &str) -> ConfigResult<VariantEntry> {
        let executable = match &self.exe {
            Some(exe) => Some(
                ExecutableSpec::parse(exe)
                    .ok_or_else(|| ConfigError::EmptyExecutable { id: id.to_string() })?,
            ),
            None => None,
        };

        if self.max_threads == Some(0) {
            return Err(ConfigError::ZeroThreadCap { id: id.to_string() });
        }

        Ok(VariantEntry {
            executable,
            partition_flag: self.partition_flag.clone(),
            max_threads: self.max_threads,
        })
    }
}

impl ProfileConfig {
    fn to_profile(&self, name: &str) -> Profile {
        Profile {
            name: name.to_string(),
            variants: self.variants.clone(),
            threads: self.threads.clone(),
            works: self.works.clone(),
            partitions: self.partitions.clone(),
            max_threads: self.max_threads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConfigFile {
        let mut file = ConfigFile {
            perf_flags: Some("-perf_all".to_string()),
            default_profile: Some("small".to_string()),
            ..Default::default()
        };
        file.variants.insert("ms".to_string(), VariantConfig::default());
        file.variants.insert(
            "sq".to_string(),
            VariantConfig {
                exe: None,
                partition_flag: Some("k".to_string()),
                max_threads: Some(8),
            },
        );
        file.scenarios.insert(
            "enq".to_string(),
            ScenarioConfig {
                command: "@../prodcon-{exe} -producers {thread} > {filename}".to_string(),
                filename: "@{directory}{variant}-t{thread}-c{work}.txt".to_string(),
                perf_flags: None,
            },
        );
        file.profiles.insert(
            "small".to_string(),
            ProfileConfig {
                variants: vec!["ms".to_string(), "sq".to_string()],
                threads: vec![1, 2],
                works: vec![0],
                partitions: vec![],
                max_threads: Some(2),
            },
        );
        file
    }

    #[test]
    fn test_compile_sample() {
        let config = sample().compile().unwrap();

        assert_eq!(config.catalog.len(), 2);
        assert_eq!(config.catalog.max_threads("sq").unwrap(), Some(8));
        assert_eq!(config.scenarios.get("enq").unwrap().perf_flags, "-perf_all");

        let profile = config.select_profile(None).unwrap().unwrap();
        assert_eq!(profile.name, "small");
        assert_eq!(profile.max_threads, Some(2));
    }

    #[test]
    fn test_compile_rejects_unknown_profile_variant() {
        let mut file = sample();
        file.profiles
            .get_mut("small")
            .unwrap()
            .variants
            .push("wf".to_string());
        assert!(matches!(
            file.compile(),
            Err(ConfigError::UnknownVariant { ref id, .. }) if id == "wf"
        ));
    }

    #[test]
    fn test_compile_rejects_blank_exe_and_zero_cap() {
        let mut file = sample();
        file.variants.get_mut("ms").unwrap().exe = Some("  ".to_string());
        assert!(matches!(file.compile(), Err(ConfigError::EmptyExecutable { .. })));

        let mut file = sample();
        file.variants.get_mut("ms").unwrap().max_threads = Some(0);
        assert!(matches!(file.compile(), Err(ConfigError::ZeroThreadCap { .. })));
    }

    #[test]
    fn test_unknown_profile_lookup() {
        let config = sample().compile().unwrap();
        match config.profile("b9").unwrap_err() {
            ConfigError::UnknownProfile { available, .. } => assert_eq!(available, vec!["small"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_scenario_perf_override() {
        let mut file = sample();
        file.scenarios.get_mut("enq").unwrap().perf_flags = Some("-perf_cache".to_string());
        let config = file.compile().unwrap();
        assert_eq!(config.scenarios.get("enq").unwrap().perf_flags, "-perf_cache");
    }
}
