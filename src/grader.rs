//! Grading pipeline
//!
//! Walks the submission directories of a grading task one at a time:
//! resolve and compile the source, run the binary on the reference input under
//! the run timeout, classify its output, and append exactly one record to the
//! report. Failures that belong to a submission become grades; anything else
//! aborts the run.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::checker::run_checker;
use crate::compiler::{Compiler, Resolution};
use crate::config::{GradingTask, Settings};
use crate::core::utils::safe_remove;
use crate::core::{FailureReason, Grade, GradeRecord};
use crate::error::{GraderError, Result};
use crate::report::ReportWriter;
use crate::runner::{CommandSpec, ExecutionOutcome, ProcessRunner, Redirects, Runner, Sink};

/// Captured stdout of a submission run, inside its working directory
const OUTPUT_NAME: &str = "output.txt";

/// One student's folder under the target directory
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub name: String,
    pub dir: PathBuf,
}

/// List submission directories in name order. Non-directories are skipped.
pub fn discover_submissions(target_dir: &Path) -> Result<Vec<Submission>> {
    let entries =
        std::fs::read_dir(target_dir).map_err(|e| GraderError::io("opendir", target_dir, e))?;

    let mut submissions = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| GraderError::io("readdir", target_dir, e))?;
        let path = entry.path();
        let metadata = std::fs::metadata(&path).map_err(|e| GraderError::io("stat", &path, e))?;
        if !metadata.is_dir() {
            debug!("Skipping non-directory {:?}", path);
            continue;
        }
        submissions.push(Submission {
            name: entry.file_name().to_string_lossy().into_owned(),
            dir: path,
        });
    }

    submissions.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(submissions)
}

/// Per-grade counts of a finished run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GradingSummary {
    counts: BTreeMap<Grade, usize>,
}

impl GradingSummary {
    fn record(&mut self, grade: Grade) {
        *self.counts.entry(grade).or_default() += 1;
    }

    pub fn count(&self, grade: Grade) -> usize {
        self.counts.get(&grade).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

impl fmt::Display for GradingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} graded", self.total())?;
        for (grade, count) in &self.counts {
            write!(f, ", {}={}", grade.reason(), count)?;
        }
        Ok(())
    }
}

pub struct Grader<R: Runner = ProcessRunner> {
    runner: R,
    compiler: Compiler,
    settings: Settings,
}

impl Grader<ProcessRunner> {
    pub fn new(settings: Settings) -> Self {
        Self::with_runner(ProcessRunner::new(), settings)
    }
}

impl<R: Runner> Grader<R> {
    pub fn with_runner(runner: R, settings: Settings) -> Self {
        let compiler = Compiler::new(
            settings.compile_command.clone(),
            settings.compile_timeout,
            settings.error_log_path.clone(),
        );
        Self {
            runner,
            compiler,
            settings,
        }
    }

    /// Grade every submission of `task`, writing the report as it goes
    pub async fn run(&self, task: &GradingTask) -> Result<GradingSummary> {
        safe_remove(&self.settings.error_log_path)?;
        safe_remove(&self.settings.report_path)?;
        task.validate()?;

        let mut report = ReportWriter::create(&self.settings.report_path)?;
        let submissions = discover_submissions(&task.target_dir)?;
        info!(
            "Grading {} submissions from {:?} into {:?}",
            submissions.len(),
            task.target_dir,
            report.path()
        );

        let mut summary = GradingSummary::default();
        for submission in &submissions {
            let grade = self.grade_submission(submission, task).await?;
            report.append(&GradeRecord::new(&submission.name, grade))?;
            summary.record(grade);
            info!("{}: {} ({})", submission.name, grade.score(), grade);
        }

        info!("Finished: {}", summary);
        Ok(summary)
    }

    /// Grade one submission inside a private working directory.
    ///
    /// The directory holds the binary and the captured output and is removed
    /// before this returns, whatever the outcome.
    pub async fn grade_submission(
        &self,
        submission: &Submission,
        task: &GradingTask,
    ) -> Result<Grade> {
        let work_dir = tempfile::Builder::new()
            .prefix("grader-")
            .tempdir()
            .map_err(|e| GraderError::io("mkdtemp", std::env::temp_dir(), e))?;
        let work_path = work_dir.path().to_path_buf();

        let graded = self.grade_in(submission, task, &work_path).await;
        let cleanup = work_dir.close();

        let grade = graded?;
        cleanup.map_err(|e| GraderError::io("remove", &work_path, e))?;
        Ok(grade)
    }

    async fn grade_in(
        &self,
        submission: &Submission,
        task: &GradingTask,
        work_dir: &Path,
    ) -> Result<Grade> {
        debug!("Grading {} in {:?}", submission.name, work_dir);

        let binary = match self
            .compiler
            .resolve(&self.runner, &submission.dir, work_dir)
            .await?
        {
            Resolution::Compiled(binary) => binary,
            Resolution::Failed(reason) => return Ok(reason.into()),
        };

        let output = work_dir.join(OUTPUT_NAME);
        let cmd = CommandSpec::new(binary.to_string_lossy()).with_work_dir(work_dir);
        let redirects = Redirects::new(
            Sink::Truncate(output.clone()),
            Sink::Append(self.settings.error_log_path.clone()),
        )
        .with_stdin(&task.input_file);

        match self
            .runner
            .run(&cmd, &redirects, Some(self.settings.run_timeout))
            .await?
        {
            ExecutionOutcome::TimedOut => {
                info!(
                    "{} timed out after {:?}",
                    submission.name, self.settings.run_timeout
                );
                return Ok(FailureReason::Timeout.into());
            }
            ExecutionOutcome::SpawnFailed { reason } => {
                warn!(
                    "Compiled binary of {} could not be started: {}",
                    submission.name, reason
                );
                return Ok(FailureReason::CompilationError.into());
            }
            completed => {
                if let Some(code) = completed.exit_code().filter(|&code| code != 0) {
                    debug!("{} exited with code {}", submission.name, code);
                }
            }
        }

        let classification = run_checker(
            &self.runner,
            &self.settings.comparator,
            &output,
            &task.expected_output,
            &self.settings.error_log_path,
        )
        .await?;
        Ok(classification.into())
    }
}
