//! Error types for wfknn.

use std::path::PathBuf;
use thiserror::Error;

/// wfknn error types.
///
/// Every variant is fatal for the run: the harness never retries and never
/// salvages partial results.
#[derive(Error, Debug)]
pub enum WfError {
    /// Configuration rejected before any work began
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unreadable file or directory
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A token that is neither a number nor the missing sentinel
    #[error("Malformed feature token {token:?} in {path}")]
    MalformedToken { path: PathBuf, token: String },

    /// Feature file with the wrong number of tokens
    #[error("Feature count mismatch in {path}: expected {expected}, got {got}")]
    FeatureCount {
        path: PathBuf,
        expected: usize,
        got: usize,
    },

    /// Not enough distinct unmonitored sites in the data directory
    #[error("Failed to read {wanted} unmonitored sites, found only {found}")]
    InsufficientUnmonitored { wanted: usize, found: usize },

    /// Worker pool could not be created
    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// CSV writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WfError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WfError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for wfknn operations.
pub type Result<T> = std::result::Result<T, WfError>;
