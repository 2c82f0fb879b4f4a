use dagdrive_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the storage driver.
#[derive(Debug, Error)]
pub enum DriverError {
    /// No object resolves at the logical path.
    #[error("path not found: {path}")]
    PathNotFound { path: String },

    /// The logical path cannot be mapped under the storage root.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// An offset points past the end of the existing content.
    #[error("invalid offset {offset} for {path}")]
    InvalidOffset { path: String, offset: u64 },

    #[error("{operation} is not supported by this driver")]
    Unsupported { operation: &'static str },

    /// The configured root does not name a published path.
    #[error("invalid storage root {root:?}: {reason}")]
    InvalidRoot { root: String, reason: String },

    /// The identity query needed to qualify the root failed.
    #[error("could not resolve local identity: {0}")]
    IdentityResolution(#[source] StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriverError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PathNotFound { .. })
    }

    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;
