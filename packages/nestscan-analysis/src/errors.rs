//! Error types for nestscan-analysis

use thiserror::Error;

/// Main error type for analysis runs
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Corpus enumeration or unit decode failure
    #[error("class file error: {0}")]
    Classfile(#[from] nestscan_classfile::ClassfileError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Broken internal invariant (e.g. the two-pass ordering guarantee)
    #[error("internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Create an internal-invariant error
    pub fn internal(msg: impl Into<String>) -> Self {
        AnalysisError::Internal(msg.into())
    }
}

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
