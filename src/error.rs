//! Fatal (system-local) errors
//!
//! Everything in here aborts the whole run. Failures that belong to a single
//! submission are modelled separately as [`crate::core::grade::FailureReason`].

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraderError {
    #[error("Not a valid directory: {}", .0.display())]
    InvalidTargetDir(PathBuf),

    #[error("Input file not exist: {}", .0.display())]
    MissingInputFile(PathBuf),

    #[error("Output file not exist: {}", .0.display())]
    MissingOutputFile(PathBuf),

    #[error("Error in: {op} ({}): {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error in: redirect ({}): {source}", .path.display())]
    Redirect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error in: spawn ({program}): {reason}")]
    Spawn { program: String, reason: String },

    #[error("Error in: compare: {0}")]
    Comparator(String),

    #[error("Error in: config: {0}")]
    Config(String),
}

impl GraderError {
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, GraderError>;
