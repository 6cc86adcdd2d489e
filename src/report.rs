//! Append-only CSV report
//!
//! One `name,score,reason` line per submission. Fields are not quoted, so
//! commas in names are replaced before writing.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::utils::sanitize_field;
use crate::core::GradeRecord;
use crate::error::{GraderError, Result};

pub struct ReportWriter {
    path: PathBuf,
    file: File,
}

impl ReportWriter {
    /// Create the report, clearing whatever a previous run left behind
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| GraderError::io("open", &path, e))?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record and flush it to disk
    pub fn append(&mut self, record: &GradeRecord) -> Result<()> {
        let name = sanitize_field(&record.name);
        if name != record.name {
            warn!("Submission name {:?} written as {:?}", record.name, name);
        }

        let line = format_line(&name, record);
        self.file
            .write_all(line.as_bytes())
            .and_then(|_| self.file.flush())
            .map_err(|e| GraderError::io("write", &self.path, e))?;

        debug!("Report line: {}", line.trim_end());
        Ok(())
    }
}

fn format_line(name: &str, record: &GradeRecord) -> String {
    format!("{},{},{}\n", name, record.score(), record.reason())
}
