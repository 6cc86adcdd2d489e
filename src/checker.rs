//! Checker module
//!
//! Decides how a submission's output is classified against the reference
//! output. By default the standalone `compare` command is run as a private
//! subprocess and its exit code is read back as the classification; the
//! library comparator can be used in-process instead.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::comparator::{self, Classification};
use crate::error::{GraderError, Result};
use crate::runner::{CommandSpec, ExecutionOutcome, Redirects, Runner, Sink};

/// Default timeout for the comparator subprocess (in seconds)
pub const DEFAULT_CHECKER_TIMEOUT_SECS: u64 = 30;

/// Where the comparison runs
#[derive(Debug, Clone, PartialEq)]
pub enum ComparatorMode {
    /// Run this `compare` executable and read its exit code
    External(PathBuf),
    /// Call the library comparator directly
    InProcess,
}

impl ComparatorMode {
    /// The `compare` executable shipped next to the running binary
    pub fn sibling_executable() -> Result<Self> {
        let exe = std::env::current_exe()
            .map_err(|e| GraderError::io("current_exe", "grader", e))?;
        Ok(ComparatorMode::External(exe.with_file_name("compare")))
    }
}

/// Convert the comparator's exit outcome to a classification
fn outcome_to_classification(outcome: ExecutionOutcome) -> Result<Classification> {
    match outcome {
        ExecutionOutcome::Completed(code) => Classification::from_exit_code(code).ok_or_else(|| {
            warn!("Unknown comparator exit code: {}", code);
            GraderError::Comparator(format!("unexpected exit code {}", code))
        }),
        ExecutionOutcome::TimedOut => Err(GraderError::Comparator(format!(
            "timed out after {}s",
            DEFAULT_CHECKER_TIMEOUT_SECS
        ))),
        ExecutionOutcome::SpawnFailed { reason } => Err(GraderError::Spawn {
            program: "compare".into(),
            reason,
        }),
    }
}

/// Classify `output` against `expected`
pub async fn run_checker<R: Runner + ?Sized>(
    runner: &R,
    mode: &ComparatorMode,
    output: &Path,
    expected: &Path,
    error_log: &Path,
) -> Result<Classification> {
    let classification = match mode {
        ComparatorMode::External(program) => {
            debug!("Running comparator {:?} on {:?} and {:?}", program, output, expected);

            let cmd = CommandSpec::new(program.to_string_lossy()).with_args([
                output.to_string_lossy(),
                expected.to_string_lossy(),
            ]);
            let log = Sink::Append(error_log.to_path_buf());
            let redirects = Redirects::new(log.clone(), log);

            let outcome = runner
                .run(
                    &cmd,
                    &redirects,
                    Some(Duration::from_secs(DEFAULT_CHECKER_TIMEOUT_SECS)),
                )
                .await?;
            outcome_to_classification(outcome)?
        }
        ComparatorMode::InProcess => {
            let (a, b) = (output.to_path_buf(), expected.to_path_buf());
            tokio::task::spawn_blocking(move || comparator::compare_files(&a, &b))
                .await
                .map_err(|e| GraderError::Comparator(e.to_string()))?
                .map_err(|e| GraderError::io("compare", output, e))?
        }
    };

    info!("Output classified as {}", classification);
    Ok(classification)
}
