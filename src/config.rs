//! Grader configuration
//!
//! Two sources:
//! - the grading task file: three newline-separated paths (target directory,
//!   reference input, reference output)
//! - run settings: built-in defaults, then an optional TOML file named by
//!   `GRADER_SETTINGS`, then `GRADER_*` environment variables

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use tracing::{debug, info};

use crate::checker::ComparatorMode;
use crate::compiler::DEFAULT_COMPILE_COMMAND;
use crate::error::{GraderError, Result};

/// The three paths a grading run works on
#[derive(Debug, Clone, PartialEq)]
pub struct GradingTask {
    pub target_dir: PathBuf,
    pub input_file: PathBuf,
    pub expected_output: PathBuf,
}

impl GradingTask {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| GraderError::io("read", path, e))?;
        Self::parse(&content)
    }

    /// Parse the task file. Blank lines are skipped.
    pub fn parse(content: &str) -> Result<Self> {
        let mut lines = content
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty());

        let mut next = |what: &str| {
            lines
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| GraderError::Config(format!("missing {} path", what)))
        };

        Ok(Self {
            target_dir: next("target directory")?,
            input_file: next("input file")?,
            expected_output: next("output file")?,
        })
    }

    /// Verify the target is a directory and both reference files are regular files
    pub fn validate(&self) -> Result<()> {
        if !self.target_dir.is_dir() {
            return Err(GraderError::InvalidTargetDir(self.target_dir.clone()));
        }
        if !self.input_file.is_file() {
            return Err(GraderError::MissingInputFile(self.input_file.clone()));
        }
        if !self.expected_output.is_file() {
            return Err(GraderError::MissingOutputFile(self.expected_output.clone()));
        }
        Ok(())
    }
}

/// Run settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// CSV report (default: ./results.csv)
    pub report_path: PathBuf,
    /// Log receiving stderr of every spawned process (default: ./errors.txt)
    pub error_log_path: PathBuf,
    /// Wall-clock limit for a submission run (default: 5s)
    pub run_timeout: Duration,
    /// Wall-clock limit for compilation (default: 30s)
    pub compile_timeout: Duration,
    /// Compile command template with `{source}` and `{binary}` placeholders
    pub compile_command: Vec<String>,
    pub comparator: ComparatorMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            report_path: PathBuf::from("./results.csv"),
            error_log_path: PathBuf::from("./errors.txt"),
            run_timeout: Duration::from_secs(5),
            compile_timeout: Duration::from_secs(30),
            compile_command: DEFAULT_COMPILE_COMMAND
                .iter()
                .map(|s| s.to_string())
                .collect(),
            comparator: ComparatorMode::InProcess,
        }
    }
}

/// Raw TOML settings file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    report: Option<PathBuf>,
    error_log: Option<PathBuf>,
    timeout_secs: Option<u64>,
    compile_timeout_secs: Option<u64>,
    compile_command: Option<Vec<String>>,
    comparator: Option<String>,
}

fn parse_comparator(value: &str) -> ComparatorMode {
    match value {
        "in-process" => ComparatorMode::InProcess,
        path => ComparatorMode::External(PathBuf::from(path)),
    }
}

fn parse_raw(content: &str) -> anyhow::Result<RawSettings> {
    toml::from_str(content).context("Invalid settings file")
}

/// A zero limit would fail every process, so it is rejected
fn timeout_from_secs(key: &str, secs: u64) -> anyhow::Result<Duration> {
    if secs == 0 {
        anyhow::bail!("{} must be greater than zero", key);
    }
    Ok(Duration::from_secs(secs))
}

fn into_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(|s| s.to_string()).collect()
}

impl Settings {
    /// Load settings for the `grader` binary.
    ///
    /// Unless configured otherwise the comparator is the `compare` executable
    /// installed next to the running binary.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_with(
            |key| std::env::var(key).ok(),
            ComparatorMode::sibling_executable,
        )
    }

    fn load_with(
        lookup: impl Fn(&str) -> Option<String>,
        sibling: impl FnOnce() -> Result<ComparatorMode>,
    ) -> anyhow::Result<Self> {
        let mut settings = Self::default();
        let mut comparator_configured = lookup("GRADER_COMPARATOR").is_some();

        if let Some(path) = lookup("GRADER_SETTINGS") {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings file {}", path))?;
            let raw = parse_raw(&content)?;
            comparator_configured |= raw.comparator.is_some();
            settings.merge_raw(raw)?;
            info!("Loaded settings from {}", path);
        }

        settings.apply_overrides(&lookup)?;
        if !comparator_configured {
            settings.comparator = sibling()?;
        }
        debug!("Effective settings: {:?}", settings);
        Ok(settings)
    }

    /// Overlay values from a TOML document
    pub fn merge_toml(&mut self, content: &str) -> anyhow::Result<()> {
        self.merge_raw(parse_raw(content)?)
    }

    fn merge_raw(&mut self, raw: RawSettings) -> anyhow::Result<()> {
        if let Some(report) = raw.report {
            self.report_path = report;
        }
        if let Some(error_log) = raw.error_log {
            self.error_log_path = error_log;
        }
        if let Some(secs) = raw.timeout_secs {
            self.run_timeout = timeout_from_secs("timeout_secs", secs)?;
        }
        if let Some(secs) = raw.compile_timeout_secs {
            self.compile_timeout = timeout_from_secs("compile_timeout_secs", secs)?;
        }
        if let Some(command) = raw.compile_command {
            if command.is_empty() {
                anyhow::bail!("compile_command must not be empty");
            }
            self.compile_command = command;
        }
        if let Some(comparator) = raw.comparator {
            self.comparator = parse_comparator(&comparator);
        }
        Ok(())
    }

    /// Overlay `GRADER_*` variables resolved through `lookup`
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<()> {
        let parse_secs = |key: &str, value: String| -> anyhow::Result<Duration> {
            let secs = value
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid {}: {}", key, value))?;
            timeout_from_secs(key, secs)
        };

        if let Some(report) = lookup("GRADER_REPORT") {
            self.report_path = report.into();
        }
        if let Some(error_log) = lookup("GRADER_ERROR_LOG") {
            self.error_log_path = error_log.into();
        }
        if let Some(value) = lookup("GRADER_TIMEOUT_SECS") {
            self.run_timeout = parse_secs("GRADER_TIMEOUT_SECS", value)?;
        }
        if let Some(value) = lookup("GRADER_COMPILE_TIMEOUT_SECS") {
            self.compile_timeout = parse_secs("GRADER_COMPILE_TIMEOUT_SECS", value)?;
        }
        if let Some(command) = lookup("GRADER_COMPILE_COMMAND") {
            let command = into_command(&command);
            if command.is_empty() {
                anyhow::bail!("GRADER_COMPILE_COMMAND must not be empty");
            }
            self.compile_command = command;
        }
        if let Some(comparator) = lookup("GRADER_COMPARATOR") {
            self.comparator = parse_comparator(&comparator);
        }
        Ok(())
    }
}
