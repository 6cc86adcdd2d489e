//! Standalone comparator: `compare <file-a> <file-b>`
//!
//! Exits with 1 (identical), 2 (different) or 3 (similar); 255 on error.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};

fn run() -> Result<grader::Classification> {
    let args: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    let [a, b] = args.as_slice() else {
        bail!("Usage: compare <file-a> <file-b>");
    };

    grader::compare_files(a, b)
        .with_context(|| format!("Error in: compare {:?} {:?}", a, b))
}

fn main() -> ExitCode {
    match run() {
        Ok(classification) => ExitCode::from(classification.exit_code() as u8),
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::from(255)
        }
    }
}
