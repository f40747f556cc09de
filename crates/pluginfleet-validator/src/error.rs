//! Engine-internal I/O errors.
//!
//! These never escape a check; they are rendered into issues.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("Read error: {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot list {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
