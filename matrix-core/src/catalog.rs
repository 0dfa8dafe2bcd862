// Variant Catalog
// Maps algorithm-variant identifiers to executables, partition flags and thread caps

use crate::error::{ConfigError, ConfigResult};

use serde::Serialize;
use std::collections::BTreeMap;

/// Short algorithm-variant identifier, unique within a catalog
pub type VariantId = String;

/// Executable to invoke for a variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutableSpec {
    pub name: String,
    pub extra_flags: Vec<String>,
}

impl ExecutableSpec {
    /// Default spec: the executable is named after the variant, no extra flags
    pub fn identity(id: &str) -> Self {
        Self {
            name: id.to_string(),
            extra_flags: Vec::new(),
        }
    }

    /// Split a whitespace-separated command ("dq-partrr -partitions 1").
    /// Returns `None` for a blank string.
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let name = parts.next()?;
        Some(Self {
            name,
            extra_flags: parts.collect(),
        })
    }

    /// Name followed by the extra flags, single-space separated
    pub fn command_line(&self) -> String {
        if self.extra_flags.is_empty() {
            return self.name.clone();
        }
        format!("{} {}", self.name, self.extra_flags.join(" "))
    }
}

/// Tunable partition/parallelism parameter bound to a concrete value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionParam {
    pub flag: String,
    pub value: u64,
}

impl PartitionParam {
    pub fn new(flag: impl Into<String>, value: u64) -> Self {
        Self {
            flag: flag.into(),
            value,
        }
    }

    /// Flag as it appears on the command line: `-p`
    pub fn flag_arg(&self) -> String {
        format!("-{}", self.flag)
    }
}

/// Catalog entry for one variant. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantEntry {
    /// Override; `None` means the identity executable
    pub executable: Option<ExecutableSpec>,
    /// Name of the partition flag the variant accepts
    pub partition_flag: Option<String>,
    /// Hard parallelism cap
    pub max_threads: Option<u32>,
}

impl VariantEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_executable(mut self, command: &str) -> Self {
        self.executable = ExecutableSpec::parse(command);
        self
    }

    pub fn with_partition_flag(mut self, flag: impl Into<String>) -> Self {
        self.partition_flag = Some(flag.into());
        self
    }

    pub fn with_max_threads(mut self, cap: u32) -> Self {
        self.max_threads = Some(cap);
        self
    }
}

/// Immutable variant catalog
#[derive(Debug, Clone, Default)]
pub struct VariantCatalog {
    entries: BTreeMap<VariantId, VariantEntry>,
}

impl VariantCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variant(mut self, id: impl Into<VariantId>, entry: VariantEntry) -> Self {
        self.entries.insert(id.into(), entry);
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All variant ids, sorted
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &VariantEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Look up an entry; unknown ids are a configuration error
    pub fn resolve(&self, id: &str) -> ConfigResult<&VariantEntry> {
        self.entries
            .get(id)
            .ok_or_else(|| ConfigError::UnknownVariant {
                id: id.to_string(),
                suggestion: self.suggest(id),
            })
    }

    /// The override executable if one is configured, else the identity default
    pub fn resolve_executable(&self, id: &str) -> ConfigResult<ExecutableSpec> {
        let entry = self.resolve(id)?;
        Ok(entry
            .executable
            .clone()
            .unwrap_or_else(|| ExecutableSpec::identity(id)))
    }

    /// Partition flag name, `None` when the axis does not apply to this variant
    pub fn resolve_partition_flag(&self, id: &str) -> ConfigResult<Option<&str>> {
        Ok(self.resolve(id)?.partition_flag.as_deref())
    }

    pub fn max_threads(&self, id: &str) -> ConfigResult<Option<u32>> {
        Ok(self.resolve(id)?.max_threads)
    }

    fn suggest(&self, id: &str) -> Option<String> {
        let needle = id.to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.entries
            .keys()
            .find(|known| {
                let known = known.to_lowercase();
                known.starts_with(&needle) || needle.starts_with(&known)
            })
            .or_else(|| {
                // One character dropped or added
                self.entries.keys().find(|known| {
                    let known = known.to_lowercase();
                    known.len().abs_diff(needle.len()) == 1
                        && (is_subsequence(&needle, &known) || is_subsequence(&known, &needle))
                })
            })
            .cloned()
    }
}

fn is_subsequence(short: &str, long: &str) -> bool {
    let mut long = long.chars();
    short.chars().all(|c| long.any(|l| l == c))
}
