//! Compiler module - Submission source discovery and compilation
//!
//! Finds the single C source file of a submission directory and turns it into
//! a binary inside the submission's private working directory.
//!
//! The compiler itself is an opaque external command; it is configured as a
//! template where `{source}` and `{binary}` are substituted per submission.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::FailureReason;
use crate::error::{GraderError, Result};
use crate::runner::{CommandSpec, ExecutionOutcome, Redirects, Runner, Sink};

/// File name of the compiled binary inside a working directory
pub const BINARY_NAME: &str = "a.out";

/// Default compile command template
pub const DEFAULT_COMPILE_COMMAND: &[&str] = &["gcc", "-o", "{binary}", "{source}"];

/// Outcome of resolving a submission to a binary
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Compiled(PathBuf),
    Failed(FailureReason),
}

fn is_c_source(name: &str) -> bool {
    name.ends_with(".c") || name.ends_with(".C")
}

/// Find the C source file directly inside `dir`.
///
/// When several files qualify, the lexicographically first name wins.
pub fn find_source(dir: &Path) -> Result<Option<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| GraderError::io("opendir", dir, e))?;

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| GraderError::io("readdir", dir, e))?;
        let name = entry.file_name();
        if !is_c_source(&name.to_string_lossy()) {
            continue;
        }
        let path = entry.path();
        if path.is_file() {
            candidates.push(path);
        }
    }

    candidates.sort();
    if candidates.len() > 1 {
        warn!(
            "Multiple source files in {:?}, using the first of {:?}",
            dir, candidates
        );
    }
    Ok(candidates.into_iter().next())
}

/// Compiler invocation settings
#[derive(Debug, Clone)]
pub struct Compiler {
    command: Vec<String>,
    timeout: Duration,
    error_log: PathBuf,
}

impl Compiler {
    pub fn new(command: Vec<String>, timeout: Duration, error_log: impl Into<PathBuf>) -> Self {
        Self {
            command,
            timeout,
            error_log: error_log.into(),
        }
    }

    /// Fill the command template for one source file
    pub fn command_for(&self, source: &Path, binary: &Path) -> CommandSpec {
        let source = source.to_string_lossy();
        let binary = binary.to_string_lossy();
        let filled: Vec<String> = self
            .command
            .iter()
            .map(|arg| {
                arg.replace("{source}", &source)
                    .replace("{binary}", &binary)
            })
            .collect();
        CommandSpec::from_vec(&filled)
    }

    /// Compile `source` into `binary`
    pub async fn compile<R: Runner + ?Sized>(
        &self,
        runner: &R,
        source: &Path,
        binary: &Path,
    ) -> Result<Resolution> {
        let cmd = self.command_for(source, binary);
        if cmd.program.is_empty() {
            return Err(GraderError::Config("compile command is empty".into()));
        }

        debug!("Compiling with {:?}", cmd.to_vec());

        let log = Sink::Append(self.error_log.clone());
        let redirects = Redirects::new(log.clone(), log);
        let outcome = runner.run(&cmd, &redirects, Some(self.timeout)).await?;

        match outcome {
            done if done.is_success() && binary.is_file() => {
                info!("Compiled {:?}", source);
                Ok(Resolution::Compiled(binary.to_path_buf()))
            }
            done if done.is_success() => {
                warn!("Compiler succeeded but {:?} was not produced", binary);
                Ok(Resolution::Failed(FailureReason::CompilationError))
            }
            ExecutionOutcome::Completed(code) => {
                info!("Compilation of {:?} failed with exit code {}", source, code);
                Ok(Resolution::Failed(FailureReason::CompilationError))
            }
            ExecutionOutcome::TimedOut => {
                warn!("Compilation of {:?} timed out after {:?}", source, self.timeout);
                Ok(Resolution::Failed(FailureReason::CompilationError))
            }
            ExecutionOutcome::SpawnFailed { reason } => Err(GraderError::Spawn {
                program: cmd.program,
                reason,
            }),
        }
    }

    /// Locate the submission's source and compile it into `work_dir`
    pub async fn resolve<R: Runner + ?Sized>(
        &self,
        runner: &R,
        submission_dir: &Path,
        work_dir: &Path,
    ) -> Result<Resolution> {
        let Some(source) = find_source(submission_dir)? else {
            info!("No source file in {:?}", submission_dir);
            return Ok(Resolution::Failed(FailureReason::NoSourceFile));
        };

        self.compile(runner, &source, &work_dir.join(BINARY_NAME))
            .await
    }
}
