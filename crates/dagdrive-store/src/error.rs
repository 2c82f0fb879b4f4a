use dagdrive_types::TypeError;

/// Errors from content-store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Nothing resolves at the queried path.
    #[error("no link named {path}")]
    NoSuchEntry { path: String },

    /// A link removal named a link the object does not have.
    #[error("no link named {name} to remove")]
    LinkNotFound { name: String },

    /// The path resolved to a directory where file content was expected.
    #[error("not a file: {path}")]
    NotAFile { path: String },

    /// The path traversed through a file as if it were a directory.
    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    /// The path or link name cannot be expressed in the store.
    #[error("invalid store path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// The daemon answered with an error the client does not classify.
    #[error("daemon error ({status}): {message}")]
    Daemon { status: u16, message: String },

    /// Network failure talking to the daemon.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid daemon address: {0}")]
    Url(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed response or object encoding.
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("type error: {0}")]
    Type(#[from] TypeError),
}

impl StoreError {
    /// True for the "no link named" condition raised by path resolution.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoSuchEntry { .. })
    }

    /// True when a link removal found nothing to remove.
    pub fn is_link_not_found(&self) -> bool {
        matches!(self, Self::LinkNotFound { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
