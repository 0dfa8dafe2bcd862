// Template Engine
// Renders command and file-name templates against a sweep point's bindings

use crate::template::lexer::{tokenize, Segment};
use crate::template::TemplateError;

use serde::Serialize;
use std::fmt;

/// Every name a template may reference.
///
/// The vocabulary is closed: command and file-name templates share it so
/// scenarios can be swapped without touching the matrix driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placeholder {
    /// Executable name followed by its extra flags
    Exe,
    /// Variant identifier
    Variant,
    /// Thread count
    Thread,
    /// Workload value
    Work,
    /// Output directory (always ends in '/')
    Directory,
    /// Partition flag (`-p`), empty when the variant has none
    PartitionFlag,
    /// Partition value, empty when the variant has none
    Partition,
    /// Performance-collection flags, empty unless requested
    Perf,
    /// Prefill count forwarded to the runner
    Prefill,
    /// Rendered output file path
    Filename,
}

impl Placeholder {
    pub const ALL: [Placeholder; 10] = [
        Placeholder::Exe,
        Placeholder::Variant,
        Placeholder::Thread,
        Placeholder::Work,
        Placeholder::Directory,
        Placeholder::PartitionFlag,
        Placeholder::Partition,
        Placeholder::Perf,
        Placeholder::Prefill,
        Placeholder::Filename,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Placeholder::Exe => "exe",
            Placeholder::Variant => "variant",
            Placeholder::Thread => "thread",
            Placeholder::Work => "work",
            Placeholder::Directory => "directory",
            Placeholder::PartitionFlag => "partition_flag",
            Placeholder::Partition => "partition",
            Placeholder::Perf => "perf",
            Placeholder::Prefill => "prefill",
            Placeholder::Filename => "filename",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Concrete values for one sweep point.
///
/// One field per [`Placeholder`]; `None` means unbound and rendering a template
/// that references it fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    pub exe: Option<String>,
    pub variant: Option<String>,
    pub thread: Option<String>,
    pub work: Option<String>,
    pub directory: Option<String>,
    pub partition_flag: Option<String>,
    pub partition: Option<String>,
    pub perf: Option<String>,
    pub prefill: Option<String>,
    pub filename: Option<String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a placeholder, replacing any previous value
    pub fn with(mut self, placeholder: Placeholder, value: impl Into<String>) -> Self {
        *self.slot_mut(placeholder) = Some(value.into());
        self
    }

    pub fn set(&mut self, placeholder: Placeholder, value: impl Into<String>) {
        *self.slot_mut(placeholder) = Some(value.into());
    }

    pub fn get(&self, placeholder: Placeholder) -> Option<&str> {
        match placeholder {
            Placeholder::Exe => self.exe.as_deref(),
            Placeholder::Variant => self.variant.as_deref(),
            Placeholder::Thread => self.thread.as_deref(),
            Placeholder::Work => self.work.as_deref(),
            Placeholder::Directory => self.directory.as_deref(),
            Placeholder::PartitionFlag => self.partition_flag.as_deref(),
            Placeholder::Partition => self.partition.as_deref(),
            Placeholder::Perf => self.perf.as_deref(),
            Placeholder::Prefill => self.prefill.as_deref(),
            Placeholder::Filename => self.filename.as_deref(),
        }
    }

    fn slot_mut(&mut self, placeholder: Placeholder) -> &mut Option<String> {
        match placeholder {
            Placeholder::Exe => &mut self.exe,
            Placeholder::Variant => &mut self.variant,
            Placeholder::Thread => &mut self.thread,
            Placeholder::Work => &mut self.work,
            Placeholder::Directory => &mut self.directory,
            Placeholder::PartitionFlag => &mut self.partition_flag,
            Placeholder::Partition => &mut self.partition,
            Placeholder::Perf => &mut self.perf,
            Placeholder::Prefill => &mut self.prefill,
            Placeholder::Filename => &mut self.filename,
        }
    }
}

/// A parsed template.
///
/// Everything up to and including the first `@` is the conditional prefix.
/// It is substituted like the rest of the template (so it is still subject to
/// the binding check) and then cut away from the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
    marker: Option<usize>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let segments = tokenize(source)?;

        let marker = segments.iter().position(|s| *s == Segment::Marker);

        Ok(Self {
            source: source.to_string(),
            segments,
            marker,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn has_prefix(&self) -> bool {
        self.marker.is_some()
    }

    /// Distinct placeholders in order of first appearance, prefix included
    pub fn placeholders(&self) -> Vec<Placeholder> {
        collect_placeholders(&self.segments)
    }

    /// Distinct placeholders that survive into the rendered output
    pub fn body_placeholders(&self) -> Vec<Placeholder> {
        let start = self.marker.map(|m| m + 1).unwrap_or(0);
        collect_placeholders(&self.segments[start..])
    }

    pub fn references(&self, placeholder: Placeholder) -> bool {
        self.segments
            .iter()
            .any(|s| *s == Segment::Placeholder(placeholder))
    }

    /// Check that every placeholder the template uses is bound, without rendering
    pub fn check(&self, bindings: &Bindings) -> Result<(), TemplateError> {
        match self
            .placeholders()
            .into_iter()
            .find(|p| bindings.get(*p).is_none())
        {
            Some(unbound) => Err(TemplateError::Unbound(unbound)),
            None => Ok(()),
        }
    }

    /// Substitute every placeholder, then drop the prefix up to and including the marker
    pub fn render(&self, bindings: &Bindings) -> Result<String, TemplateError> {
        let mut output = String::with_capacity(self.source.len() + 32);
        let mut cut = 0;

        for segment in &self.segments {
            match segment {
                Segment::Text(text) => output.push_str(text),
                Segment::Placeholder(placeholder) => {
                    let value = bindings
                        .get(*placeholder)
                        .ok_or(TemplateError::Unbound(*placeholder))?;
                    output.push_str(value);
                }
                Segment::Marker => cut = output.len(),
            }
        }

        Ok(output.split_off(cut))
    }
}

fn collect_placeholders(segments: &[Segment]) -> Vec<Placeholder> {
    let mut found = Vec::new();
    for segment in segments {
        if let Segment::Placeholder(p) = segment {
            if !found.contains(p) {
                found.push(*p);
            }
        }
    }
    found
}
