//! Error Types
//!
//! Structured error handling for the caching pipeline and its collaborators.
//! Every terminal failure of an invocation surfaces as exactly one of these.

/// Errors reported by the caching pipeline and its collaborators
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Failed to resolve absolute path for '{path}': {reason}")]
    PathResolution { path: String, reason: String },

    #[error("Source does not exist: {0}")]
    SourceNotFound(String),

    #[error("Source stream is not readable: {0}")]
    SourceUnreadable(String),

    #[error("Source reported an invalid length: {0}")]
    InvalidSourceLength(String),

    #[error("Failed to write destination file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Preferences error: {0}")]
    Preferences(String),

    #[error("Failed to start forwarded command '{command}': {reason}")]
    ProcessStart { command: String, reason: String },
}

impl CacheError {
    /// Wrap an I/O error from the destination-write side of the pipeline
    pub fn write(path: &std::path::Path, source: std::io::Error) -> Self {
        CacheError::Write {
            path: path.display().to_string(),
            source,
        }
    }
}
