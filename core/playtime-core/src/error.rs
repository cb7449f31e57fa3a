//! Error types for playtime-core operations.
//!
//! Persistence functions return these; the tracker facade catches and logs
//! them so a bad disk never surfaces to the polling host.

use std::path::PathBuf;

/// All errors that can occur in playtime-core operations.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("History path has no parent directory: {0}")]
    NoParentDir(PathBuf),
}

impl TrackerError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        TrackerError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        TrackerError::Json {
            context: context.into(),
            source,
        }
    }
}

/// Convenience type alias for Results using TrackerError.
pub type Result<T> = std::result::Result<T, TrackerError>;
