//! Process runner implementation
//!
//! Spawns programs directly with file redirection. Each child leads its own
//! process group so a timeout can take down everything it forked.

use async_trait::async_trait;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::fs::{File, OpenOptions};
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use super::{CommandSpec, ExecutionOutcome, Redirects, Runner, Sink};
use crate::error::{GraderError, Result};

/// Runner that executes programs directly on the host
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run a program, waiting at most `timeout` for it to finish
    pub async fn execute(
        &self,
        cmd: &CommandSpec,
        redirects: &Redirects,
        timeout: Option<Duration>,
    ) -> Result<ExecutionOutcome> {
        debug!(
            "Running {:?} (stdin={:?}, stdout={:?}, timeout={:?})",
            cmd.to_vec(),
            redirects.stdin,
            redirects.stdout,
            timeout
        );

        let stdin = match &redirects.stdin {
            Some(path) => Stdio::from(open_input(path)?),
            None => Stdio::inherit(),
        };
        let stdout = open_sink(&redirects.stdout)?;
        let stderr = open_sink(&redirects.stderr)?;

        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .stdin(stdin)
            .stdout(stdout)
            .stderr(stderr)
            .process_group(0)
            .kill_on_drop(true);
        if let Some(dir) = &cmd.work_dir {
            command.current_dir(dir);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to spawn {}: {}", cmd.program, e);
                return Ok(ExecutionOutcome::SpawnFailed {
                    reason: e.to_string(),
                });
            }
        };

        let status = match timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    debug!("{} exceeded {:?}, killing it", cmd.program, limit);
                    terminate(&mut child).await;
                    return Ok(ExecutionOutcome::TimedOut);
                }
            },
            None => child.wait().await,
        }
        .map_err(|e| GraderError::io("waitpid", &cmd.program, e))?;

        let code = exit_code(status);
        debug!("{} finished with exit code {}", cmd.program, code);
        Ok(ExecutionOutcome::Completed(code))
    }
}

#[async_trait]
impl Runner for ProcessRunner {
    async fn run(
        &self,
        cmd: &CommandSpec,
        redirects: &Redirects,
        timeout: Option<Duration>,
    ) -> Result<ExecutionOutcome> {
        self.execute(cmd, redirects, timeout).await
    }
}

fn open_input(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| GraderError::Redirect {
        path: path.to_path_buf(),
        source,
    })
}

fn open_sink(sink: &Sink) -> Result<Stdio> {
    let (path, file) = match sink {
        Sink::Null => return Ok(Stdio::null()),
        Sink::Truncate(path) => (
            path,
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path),
        ),
        Sink::Append(path) => (path, OpenOptions::new().append(true).create(true).open(path)),
    };

    file.map(Stdio::from).map_err(|source| GraderError::Redirect {
        path: path.clone(),
        source,
    })
}

/// Kill the child's whole process group and reap the child
async fn terminate(child: &mut Child) {
    if let Some(pid) = child.id() {
        if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            warn!("Failed to kill process group {}: {}", pid, e);
        }
    }
    if let Err(e) = child.kill().await {
        warn!("Failed to reap timed out child: {}", e);
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => -1,
    }
}
