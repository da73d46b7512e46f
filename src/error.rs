//! Error types for cloudsec-monitor

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while monitoring sources
#[derive(Debug, Error)]
pub enum MonitorError {
    /// A source file is missing or its command could not be spawned
    #[error("Source '{tag}' unavailable: {reason}")]
    SourceUnavailable {
        tag: String,
        reason: String,
    },

    /// Appending to a sink file failed
    #[error("Failed to append to {}: {source}", .path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading from a live stream failed
    #[error("Stream error on '{tag}': {source}")]
    Stream {
        tag: String,
        #[source]
        source: std::io::Error,
    },
}

impl MonitorError {
    /// Build a `SourceUnavailable` error
    pub fn unavailable(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            tag: tag.into(),
            reason: reason.into(),
        }
    }

    /// Build a `Sink` error for the given file
    pub fn sink(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Sink {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the source could not be acquired at all
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. })
    }
}

/// Result type alias for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;
