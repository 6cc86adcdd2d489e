use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::error::{GraderError, Result};

/// Remove a file if it exists. A missing file is not an error.
pub fn safe_remove(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed stale file {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(GraderError::io("remove", path, e)),
    }
}

/// Make a value safe to use as an unquoted CSV field
pub fn sanitize_field(value: &str) -> String {
    value.replace([',', '\n', '\r'], "_")
}
