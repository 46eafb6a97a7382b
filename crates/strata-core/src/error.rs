//! Error types for strata-core

use std::path::PathBuf;

/// Result type for strata-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in strata-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A source could not be opened or read; its store stays not ready
    #[error("Failed to read source {path}: {source}")]
    SourceOpen {
        path: PathBuf,
        #[source]
        source: strata_fs::Error,
    },

    /// The merged output could not be written
    #[error("Failed to write merged output {path}: {source}")]
    Destination {
        path: PathBuf,
        #[source]
        source: strata_fs::Error,
    },

    /// A job file is well-formed but describes an impossible merge
    #[error("Invalid job: {message}")]
    InvalidJob { message: String },

    /// Record or layout error from strata-records
    #[error(transparent)]
    Records(#[from] strata_records::Error),

    /// Filesystem error from strata-fs
    #[error(transparent)]
    Fs(#[from] strata_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn invalid_job(message: impl Into<String>) -> Self {
        Self::InvalidJob {
            message: message.into(),
        }
    }
}
