use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Content-addressed identifier for an object in the store.
///
/// The encoding belongs to the store: the daemon hands out multibase CIDs,
/// the in-memory store hands out hex BLAKE3 digests. The driver never looks
/// inside a hash, it only passes it back to the store. Identical content
/// always yields the same `ContentHash`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Wrap a hash string issued by the store.
    ///
    /// Rejects empty strings and anything containing a path separator or
    /// whitespace, since hashes are spliced into store paths verbatim.
    pub fn new(hash: impl Into<String>) -> Result<Self, TypeError> {
        let hash = hash.into();
        if hash.is_empty() {
            return Err(TypeError::EmptyHash);
        }
        if let Some(ch) = hash.chars().find(|c| *c == '/' || c.is_whitespace()) {
            return Err(TypeError::InvalidHash {
                reason: format!("contains forbidden character {ch:?}"),
                hash,
            });
        }
        Ok(Self(hash))
    }

    /// Hex-encode a raw 32-byte digest. Used by stores that compute their
    /// own hashes rather than receiving them from a daemon.
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        Self(hex::encode(digest))
    }

    /// The hash as issued by the store.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for log lines (first 12 characters).
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(12)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }

    /// Immutable store path addressing this object, `/ipfs/<hash>`.
    pub fn ipfs_path(&self) -> String {
        format!("/ipfs/{}", self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.short())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

impl AsRef<str> for ContentHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
