// Shell Runner
// Runs each generated command line through a shell, one after another

use crate::matrix::Invocation;
use crate::runners::{ProgressSender, RunEvent, RunRequest, RunSummary, Runner, RunnerError};

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Shells the runner can use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    /// sh on Unix
    Default,
    Bash,
}

impl Shell {
    fn get_command(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            Shell::Default => ("sh", &["-c"]),
            Shell::Bash => ("bash", &["-c"]),
        }
    }
}

/// Outcome of a single command
#[derive(Debug, Clone)]
struct CommandOutcome {
    exit_code: Option<i32>,
    stderr: String,
    duration: Duration,
}

/// Sequential shell runner.
///
/// Command lines carry their own output redirection, so only the exit code
/// and stderr are collected. A failing benchmark is recorded and the sweep
/// moves on; nothing is retried.
pub struct ShellRunner {
    shell: Shell,
    working_dir: Option<PathBuf>,
    create_directory: bool,
    timeout: Option<Duration>,
    progress: Option<ProgressSender>,
}

impl ShellRunner {
    pub fn new() -> Self {
        Self {
            shell: Shell::Default,
            working_dir: None,
            create_directory: true,
            timeout: None,
            progress: None,
        }
    }

    pub fn with_shell(mut self, shell: Shell) -> Self {
        self.shell = shell;
        self
    }

    /// Directory commands run in (relative executables like `../prodcon-ms` resolve from here)
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_create_directory(mut self, create: bool) -> Self {
        self.create_directory = create;
        self
    }

    /// Kill a benchmark that runs longer than this
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_progress(mut self, sender: ProgressSender) -> Self {
        self.progress = Some(sender);
        self
    }

    fn emit(&self, event: RunEvent) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(event);
        }
    }

    fn environment(request: &RunRequest<'_>) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("BENCH_OUTPUT_DIR".to_string(), request.directory.to_string());
        env.insert("BENCH_PREFILL".to_string(), request.prefill.to_string());
        env.insert(
            "BENCH_PERFORMANCE".to_string(),
            if request.performance { "1" } else { "0" }.to_string(),
        );
        env
    }

    async fn prepare_directory(&self, directory: &str) -> Result<(), RunnerError> {
        if !self.create_directory || directory.is_empty() {
            return Ok(());
        }

        let path = match &self.working_dir {
            Some(base) => base.join(directory),
            None => PathBuf::from(directory),
        };
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|source| RunnerError::CreateDirectory {
                path: path.display().to_string(),
                source,
            })
    }

    async fn run_command(
        &self,
        invocation: &Invocation,
        env: &HashMap<String, String>,
    ) -> Result<CommandOutcome, RunnerError> {
        let (shell_cmd, shell_args) = self.shell.get_command();

        let mut cmd = Command::new(shell_cmd);
        cmd.args(shell_args);
        cmd.arg(&invocation.command_line);
        cmd.envs(env);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let started = Instant::now();
        let child = cmd.spawn().map_err(|source| RunnerError::Spawn {
            shell: shell_cmd,
            source,
        })?;

        let output = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(result) => result,
                Err(_) => {
                    return Ok(CommandOutcome {
                        exit_code: None,
                        stderr: format!("timed out after {:?}", timeout),
                        duration: started.elapsed(),
                    });
                }
            },
            None => child.wait_with_output().await,
        };

        Ok(match output {
            Ok(output) => CommandOutcome {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
                duration: started.elapsed(),
            },
            Err(e) => CommandOutcome {
                exit_code: None,
                stderr: format!("failed waiting for process: {}", e),
                duration: started.elapsed(),
            },
        })
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Runner for ShellRunner {
    async fn run(&self, request: RunRequest<'_>) -> Result<RunSummary, RunnerError> {
        let started = Instant::now();
        let total = request.invocations.len();

        self.prepare_directory(request.directory).await?;

        info!(
            total,
            directory = %request.directory,
            prefill = request.prefill,
            performance = request.performance,
            "starting sweep"
        );
        self.emit(RunEvent::SweepStarted {
            total,
            directory: request.directory.to_string(),
        });

        let env = Self::environment(&request);
        let mut summary = RunSummary {
            total,
            ..Default::default()
        };

        for (index, invocation) in request.invocations.iter().enumerate() {
            debug!(index, command = %invocation.command_line, "running benchmark");
            self.emit(RunEvent::InvocationStarted {
                index,
                command_line: invocation.command_line.clone(),
            });

            let outcome = self.run_command(invocation, &env).await?;

            if outcome.exit_code == Some(0) {
                summary.succeeded += 1;
            } else {
                warn!(
                    index,
                    exit_code = ?outcome.exit_code,
                    output = %invocation.output_path.display(),
                    "benchmark failed"
                );
                summary.failed += 1;
                summary.failures.push(invocation.output_path.clone());
            }

            self.emit(RunEvent::InvocationCompleted {
                index,
                output_path: invocation.output_path.clone(),
                exit_code: outcome.exit_code,
                duration: outcome.duration,
                stderr: outcome.stderr,
            });
        }

        summary.duration = started.elapsed();
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            duration_ms = summary.duration.as_millis() as u64,
            "sweep finished"
        );
        self.emit(RunEvent::SweepCompleted {
            summary: summary.clone(),
        });

        Ok(summary)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::runners::progress_channel;

    fn invocation(command_line: &str, output_path: &str) -> Invocation {
        Invocation {
            command_line: command_line.to_string(),
            output_path: PathBuf::from(output_path),
        }
    }

    #[tokio::test]
    async fn test_runs_commands_in_order() {
        let temp = tempfile::tempdir().unwrap();
        let invocations = vec![
            invocation("echo first > out/a.txt", "out/a.txt"),
            invocation("echo second > out/b.txt", "out/b.txt"),
        ];
        let request = RunRequest {
            invocations: &invocations,
            directory: "out/",
            prefill: 0,
            performance: false,
        };

        let runner = ShellRunner::new().with_working_dir(temp.path());
        let summary = runner.run(request).await.unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 2);
        assert!(summary.success());
        let a = std::fs::read_to_string(temp.path().join("out/a.txt")).unwrap();
        assert_eq!(a.trim(), "first");
        assert!(temp.path().join("out/b.txt").exists());
    }

    #[tokio::test]
    async fn test_failure_is_recorded_and_sweep_continues() {
        let temp = tempfile::tempdir().unwrap();
        let invocations = vec![
            invocation("echo broken >&2; exit 3", "x/fail.txt"),
            invocation("true", "x/ok.txt"),
        ];
        let request = RunRequest {
            invocations: &invocations,
            directory: "x/",
            prefill: 0,
            performance: false,
        };

        let (tx, mut rx) = progress_channel();
        let runner = ShellRunner::new()
            .with_working_dir(temp.path())
            .with_progress(tx);
        let summary = runner.run(request).await.unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failures, vec![PathBuf::from("x/fail.txt")]);

        drop(runner);
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert!(matches!(events[0], RunEvent::SweepStarted { total: 2, .. }));
        let failed: Vec<_> = events.iter().filter(|e| e.is_failure()).collect();
        assert_eq!(failed.len(), 1);
        match failed[0] {
            RunEvent::InvocationCompleted {
                exit_code, stderr, ..
            } => {
                assert_eq!(*exit_code, Some(3));
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(matches!(events.last(), Some(RunEvent::SweepCompleted { .. })));
    }

    #[tokio::test]
    async fn test_environment_is_exported() {
        let temp = tempfile::tempdir().unwrap();
        let invocations = vec![invocation(
            "echo $BENCH_PREFILL $BENCH_PERFORMANCE $BENCH_OUTPUT_DIR > env.txt",
            "env.txt",
        )];
        let request = RunRequest {
            invocations: &invocations,
            directory: "",
            prefill: 500,
            performance: true,
        };

        ShellRunner::new()
            .with_working_dir(temp.path())
            .run(request)
            .await
            .unwrap();

        let env = std::fs::read_to_string(temp.path().join("env.txt")).unwrap();
        assert_eq!(env.trim(), "500 1");
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let temp = tempfile::tempdir().unwrap();
        let invocations = vec![invocation("sleep 5", "slow.txt")];
        let request = RunRequest {
            invocations: &invocations,
            directory: "",
            prefill: 0,
            performance: false,
        };

        let summary = ShellRunner::new()
            .with_working_dir(temp.path())
            .with_timeout(Duration::from_millis(100))
            .run(request)
            .await
            .unwrap();

        assert_eq!(summary.failed, 1);
    }
}
