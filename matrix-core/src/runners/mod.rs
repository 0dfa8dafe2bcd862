// Runners Module
// The collaborator that executes a generated sweep, plus progress events

pub mod events;
pub mod shell;

pub use events::{progress_channel, ProgressReceiver, ProgressSender, RunEvent};
pub use shell::{Shell, ShellRunner};

use crate::matrix::Invocation;
use crate::sweep::SweepAxes;

use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Everything a runner receives for one sweep
#[derive(Debug, Clone)]
pub struct RunRequest<'a> {
    pub invocations: &'a [Invocation],
    pub directory: &'a str,
    pub prefill: u64,
    pub performance: bool,
}

impl<'a> RunRequest<'a> {
    pub fn new(invocations: &'a [Invocation], axes: &'a SweepAxes) -> Self {
        Self {
            invocations,
            directory: &axes.directory,
            prefill: axes.prefill,
            performance: axes.collect_perf,
        }
    }
}

/// Totals reported once a sweep has been run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Output files of the runs that exited non-zero (or timed out)
    pub failures: Vec<PathBuf>,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl RunSummary {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Errors that stop a sweep. A benchmark exiting non-zero is not one of them.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to create output directory '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn shell '{shell}': {source}")]
    Spawn {
        shell: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Executes the invocations of one sweep
#[async_trait::async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self, request: RunRequest<'_>) -> Result<RunSummary, RunnerError>;
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}
