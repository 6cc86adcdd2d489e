//! Runner module - Execution abstraction layer
//!
//! This module spawns external commands (compiler, submission binaries, the
//! standalone comparator) with file redirection and an optional wall-clock
//! timeout, and reports a raw `ExecutionOutcome`.
//!
//! The runner module does NOT:
//! - Compare outputs or decide grades
//! - Know where submissions live or how they are compiled

pub mod process;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

/// Command specification for execution
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Program path or name
    pub program: String,
    /// Arguments to the program
    pub args: Vec<String>,
    /// Working directory
    pub work_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            work_dir: None,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(|a| a.into()).collect();
        self
    }

    pub fn with_work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.work_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Create from a command vector (first element is program, rest are args)
    pub fn from_vec(cmd: &[String]) -> Self {
        let mut iter = cmd.iter();
        let program = iter.next().cloned().unwrap_or_default();
        let args: Vec<String> = iter.cloned().collect();
        Self {
            program,
            args,
            work_dir: None,
        }
    }

    /// Convert to a vector of strings (program + args)
    pub fn to_vec(&self) -> Vec<String> {
        let mut v = vec![self.program.clone()];
        v.extend(self.args.clone());
        v
    }
}

/// Destination of a child's output stream
#[derive(Debug, Clone, PartialEq)]
pub enum Sink {
    /// Fresh file, truncated before the run
    Truncate(PathBuf),
    /// Shared log, appended to across runs
    Append(PathBuf),
    /// Discard
    Null,
}

/// I/O redirection for a single run
#[derive(Debug, Clone)]
pub struct Redirects {
    /// Read stdin from this file, otherwise inherit
    pub stdin: Option<PathBuf>,
    pub stdout: Sink,
    pub stderr: Sink,
}

impl Redirects {
    pub fn new(stdout: Sink, stderr: Sink) -> Self {
        Self {
            stdin: None,
            stdout,
            stderr,
        }
    }

    pub fn with_stdin(mut self, path: impl AsRef<Path>) -> Self {
        self.stdin = Some(path.as_ref().to_path_buf());
        self
    }
}

impl Default for Redirects {
    fn default() -> Self {
        Self::new(Sink::Null, Sink::Null)
    }
}

/// Execution outcome (raw, no grade interpretation)
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// Program ran to completion. Death by signal N is reported as 128 + N.
    Completed(i32),
    /// Wall-clock limit expired and the process group was killed
    TimedOut,
    /// Program could not be started at all
    SpawnFailed { reason: String },
}

impl ExecutionOutcome {
    /// Check if execution was successful (exited with code 0)
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Completed(0))
    }

    /// Exit code if the program completed
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecutionOutcome::Completed(code) => Some(*code),
            _ => None,
        }
    }
}

/// Runner trait for executing programs
#[async_trait]
pub trait Runner: Send + Sync {
    /// Run a command with the given redirection and optional timeout.
    ///
    /// Failing to open a redirection target is an `Err`; failing to start the
    /// program is `Ok(ExecutionOutcome::SpawnFailed)`.
    async fn run(
        &self,
        cmd: &CommandSpec,
        redirects: &Redirects,
        timeout: Option<Duration>,
    ) -> Result<ExecutionOutcome>;
}

// Re-exports
pub use process::ProcessRunner;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_from_vec() {
        let cmd = CommandSpec::from_vec(&["gcc".into(), "-o".into(), "a.out".into()]);
        assert_eq!(cmd.program, "gcc");
        assert_eq!(cmd.args, vec!["-o", "a.out"]);
        assert_eq!(cmd.to_vec(), vec!["gcc", "-o", "a.out"]);
    }

    #[test]
    fn test_command_from_empty_vec() {
        let cmd = CommandSpec::from_vec(&[]);
        assert!(cmd.program.is_empty());
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn test_outcome_exit_code() {
        assert!(ExecutionOutcome::Completed(0).is_success());
        assert!(!ExecutionOutcome::Completed(3).is_success());
        assert_eq!(ExecutionOutcome::Completed(3).exit_code(), Some(3));
        assert_eq!(ExecutionOutcome::TimedOut.exit_code(), None);
    }
}
