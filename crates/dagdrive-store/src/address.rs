//! Parsing of store paths.
//!
//! The store addresses objects three ways:
//!
//! - `/ipns/<name>/seg/...` through a published name
//! - `/ipfs/<hash>/seg/...` through an immutable hash
//! - `<hash>/seg/...` as shorthand for the `/ipfs/` form

use dagdrive_types::ContentHash;

use crate::error::{StoreError, StoreResult};

/// Where resolution of a [`StorePath`] starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathRoot {
    /// A mutable published name.
    Name(String),
    /// An immutable object.
    Hash(ContentHash),
}

/// A parsed store path: a root followed by link names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorePath {
    pub root: PathRoot,
    pub segments: Vec<String>,
}

impl StorePath {
    /// Parse a store path, rejecting anything outside `/ipns` and `/ipfs`.
    pub fn parse(path: &str) -> StoreResult<Self> {
        let invalid = |reason: &str| StoreError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = path.split('/').filter(|p| !p.is_empty());
        let root = if path.starts_with('/') {
            let namespace = parts.next().ok_or_else(|| invalid("empty path"))?;
            let root = parts
                .next()
                .ok_or_else(|| invalid("missing name or hash after namespace"))?;
            match namespace {
                "ipns" => PathRoot::Name(root.to_string()),
                "ipfs" => PathRoot::Hash(ContentHash::new(root)?),
                _ => return Err(invalid("namespace must be /ipns or /ipfs")),
            }
        } else {
            let root = parts.next().ok_or_else(|| invalid("empty path"))?;
            PathRoot::Hash(ContentHash::new(root)?)
        };

        let segments = parts.map(str::to_string).collect();
        Ok(Self { root, segments })
    }
}
