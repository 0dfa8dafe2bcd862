// Run Events
// Progress reporting while a sweep executes

use crate::runners::RunSummary;

use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Sender for run progress events
pub type ProgressSender = mpsc::UnboundedSender<RunEvent>;

/// Receiver for run progress events
pub type ProgressReceiver = mpsc::UnboundedReceiver<RunEvent>;

/// Create a new progress channel
pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}

/// Events emitted while running a sweep
#[derive(Debug, Clone)]
pub enum RunEvent {
    SweepStarted {
        total: usize,
        directory: String,
    },

    InvocationStarted {
        index: usize,
        command_line: String,
    },

    InvocationCompleted {
        index: usize,
        output_path: PathBuf,
        /// `None` when the process was killed or timed out
        exit_code: Option<i32>,
        duration: Duration,
        stderr: String,
    },

    SweepCompleted {
        summary: RunSummary,
    },
}

impl RunEvent {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            RunEvent::InvocationCompleted { exit_code, .. } if *exit_code != Some(0)
        )
    }
}
