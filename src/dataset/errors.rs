//! Dataset store errors

use thiserror::Error;

/// Result type for dataset store operations
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Dataset store errors
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset not found: {0}")]
    NotFound(String),

    #[error("Invalid dataset id: '{0}'")]
    InvalidId(String),

    #[error("Dataset already exists: {0}")]
    AlreadyExists(String),

    #[error("Failed to read dataset '{id}': {source}")]
    Io {
        id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed dataset '{id}': {reason}")]
    Malformed { id: String, reason: String },

    #[error("Dataset store lock poisoned")]
    Poisoned,
}

impl DatasetError {
    /// Returns true if the dataset simply does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatasetError::NotFound(_))
    }
}
