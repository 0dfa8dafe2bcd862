// Sweep Descriptor
// Scenarios (command + file-name template pairs), machine profiles and sweep axes

use crate::catalog::VariantId;
use crate::error::{ConfigError, ConfigResult};
use crate::template::{Placeholder, Template};

use std::collections::BTreeMap;

/// Flags appended through `{perf}` when performance collection is requested
pub const DEFAULT_PERF_FLAGS: &str = "-perf";

/// A named invocation scenario with its compiled templates
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub command: Template,
    pub filename: Template,
    pub perf_flags: String,
}

impl Scenario {
    /// Compile both templates. The file-name template cannot reference
    /// `{filename}` since that is what it produces.
    pub fn new(name: impl Into<String>, command: &str, filename: &str) -> ConfigResult<Self> {
        let name = name.into();

        let command = Template::parse(command).map_err(|source| ConfigError::Template {
            scenario: name.clone(),
            field: "command",
            source,
        })?;
        let filename = Template::parse(filename).map_err(|source| ConfigError::Template {
            scenario: name.clone(),
            field: "filename",
            source,
        })?;

        if filename.references(Placeholder::Filename) {
            return Err(ConfigError::Template {
                scenario: name,
                field: "filename",
                source: crate::template::TemplateError::Unbound(Placeholder::Filename),
            });
        }

        Ok(Self {
            name,
            command,
            filename,
            perf_flags: DEFAULT_PERF_FLAGS.to_string(),
        })
    }

    pub fn with_perf_flags(mut self, flags: impl Into<String>) -> Self {
        self.perf_flags = flags.into();
        self
    }
}

/// Scenarios by name
#[derive(Debug, Clone, Default)]
pub struct ScenarioTable {
    scenarios: BTreeMap<String, Scenario>,
}

impl ScenarioTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, scenario: Scenario) {
        self.scenarios.insert(scenario.name.clone(), scenario);
    }

    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.insert(scenario);
        self
    }

    pub fn get(&self, name: &str) -> ConfigResult<&Scenario> {
        self.scenarios
            .get(name)
            .ok_or_else(|| ConfigError::UnknownScenario {
                name: name.to_string(),
                available: self.names().map(str::to_string).collect(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scenarios.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.values()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

/// Axis defaults for a particular benchmarking host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub variants: Vec<VariantId>,
    pub threads: Vec<u32>,
    pub works: Vec<u64>,
    pub partitions: Vec<u64>,
    pub max_threads: Option<u32>,
}

/// The axes crossed by one sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepAxes {
    pub variants: Vec<VariantId>,
    pub works: Vec<u64>,
    pub threads: Vec<u32>,
    /// Partition values; empty means the partition axis is not swept
    pub partitions: Vec<u64>,
    /// Always empty or ending in '/'
    pub directory: String,
    pub max_threads: u32,
    pub collect_perf: bool,
    pub prefill: u64,
}

impl SweepAxes {
    pub fn new(
        variants: Vec<VariantId>,
        works: Vec<u64>,
        threads: Vec<u32>,
        directory: impl AsRef<str>,
    ) -> Self {
        Self {
            variants,
            works,
            threads,
            partitions: Vec::new(),
            directory: normalize_directory(directory.as_ref()),
            max_threads: u32::MAX,
            collect_perf: false,
            prefill: 0,
        }
    }

    /// Start from a profile's axes
    pub fn from_profile(profile: &Profile, directory: impl AsRef<str>) -> Self {
        let mut axes = Self::new(
            profile.variants.clone(),
            profile.works.clone(),
            profile.threads.clone(),
            directory,
        );
        axes.partitions = profile.partitions.clone();
        if let Some(cap) = profile.max_threads {
            axes.max_threads = cap;
        }
        axes
    }

    pub fn with_max_threads(mut self, cap: u32) -> Self {
        self.max_threads = cap;
        self
    }

    pub fn with_partitions(mut self, partitions: Vec<u64>) -> Self {
        self.partitions = partitions;
        self
    }

    pub fn with_perf(mut self, collect_perf: bool) -> Self {
        self.collect_perf = collect_perf;
        self
    }

    pub fn with_prefill(mut self, prefill: u64) -> Self {
        self.prefill = prefill;
        self
    }

    pub fn with_directory(mut self, directory: impl AsRef<str>) -> Self {
        self.directory = normalize_directory(directory.as_ref());
        self
    }

    /// Reject repeated values within an axis; they would yield colliding runs
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(id) = first_duplicate(&self.variants) {
            return Err(ConfigError::DuplicateVariant { id });
        }
        if let Some(value) = first_duplicate(&self.works) {
            return Err(ConfigError::DuplicateAxisValue {
                axis: "work",
                value,
            });
        }
        if let Some(value) = first_duplicate(&self.threads) {
            return Err(ConfigError::DuplicateAxisValue {
                axis: "thread",
                value: value as u64,
            });
        }
        if let Some(value) = first_duplicate(&self.partitions) {
            return Err(ConfigError::DuplicateAxisValue {
                axis: "partition",
                value,
            });
        }
        Ok(())
    }
}

/// Append the trailing '/' that file-name templates rely on
pub fn normalize_directory(directory: &str) -> String {
    if directory.is_empty() || directory.ends_with('/') {
        directory.to_string()
    } else {
        format!("{}/", directory)
    }
}

fn first_duplicate<T: PartialEq + Clone>(values: &[T]) -> Option<T> {
    values
        .iter()
        .enumerate()
        .find(|(i, v)| values[..*i].contains(v))
        .map(|(_, v)| v.clone())
}
