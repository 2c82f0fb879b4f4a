use dagdrive_types::ContentHash;

/// Domain-separated BLAKE3 content hasher.
///
/// The domain tag is prepended to every hash computation so that a file and
/// a directory with identical encoded bytes never share a hash.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for file objects.
    pub const FILE: Self = Self {
        domain: "dagdrive-file-v1",
    };
    /// Hasher for directory objects.
    pub const DIRECTORY: Self = Self {
        domain: "dagdrive-dir-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ContentHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ContentHash::from_digest(hasher.finalize().as_bytes())
    }
}
