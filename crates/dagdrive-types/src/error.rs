use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("content hash must not be empty")]
    EmptyHash,

    #[error("invalid content hash {hash:?}: {reason}")]
    InvalidHash { hash: String, reason: String },

    #[error("unknown link kind: {0}")]
    UnknownLinkKind(String),
}
