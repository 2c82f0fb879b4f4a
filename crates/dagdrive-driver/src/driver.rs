use std::collections::HashMap;
use std::io::Read;
use std::time::SystemTime;

use dagdrive_store::{ContentStore, HttpContentStore};
use serde::Serialize;

use crate::config::DriverConfig;
use crate::error::{DriverError, DriverResult};
use crate::ops::ObjectOps;
use crate::path::PathResolver;

/// Name this driver registers under.
pub const DRIVER_NAME: &str = "ipfs";

/// Metadata about the object at a logical path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub path: String,
    /// Content length for files, zero for directories.
    pub size: u64,
    /// Always `None`: the store does not track modification times.
    pub mod_time: Option<SystemTime>,
    pub is_dir: bool,
}

/// The storage-driver surface.
///
/// Paths are logical keys relative to the driver's root.
pub trait StorageDriver: Send + Sync {
    fn name(&self) -> &'static str;

    fn get_content(&self, path: &str) -> DriverResult<Vec<u8>>;

    fn put_content(&self, path: &str, content: &[u8]) -> DriverResult<()>;

    /// Stream content starting `offset` bytes in.
    fn reader(&self, path: &str, offset: u64) -> DriverResult<Box<dyn Read + Send>>;

    /// Replace the content past `offset` with everything `content` yields.
    /// Returns the number of existing bytes kept.
    fn write_stream(&self, path: &str, offset: u64, content: &mut dyn Read) -> DriverResult<u64>;

    fn stat(&self, path: &str) -> DriverResult<FileInfo>;

    /// Logical paths of the direct children of `path`.
    fn list(&self, path: &str) -> DriverResult<Vec<String>>;

    fn move_object(&self, source: &str, dest: &str) -> DriverResult<()>;

    fn delete(&self, path: &str) -> DriverResult<()>;

    /// Direct-fetch URL for `path`. Unsupported unless a driver says otherwise.
    fn url_for(&self, _path: &str, _options: &HashMap<String, String>) -> DriverResult<String> {
        Err(DriverError::Unsupported { operation: "url_for" })
    }
}

/// Storage driver over a content-addressed store, rooted at a published name.
pub struct DagDriver<S> {
    ops: ObjectOps<S>,
}

impl<S: ContentStore> DagDriver<S> {
    /// Build a driver over `store`, qualifying a self-referential `root`
    /// with the store's identity.
    pub fn new(store: S, root: &str) -> DriverResult<Self> {
        let resolver = PathResolver::resolve(root, &store)?;
        Ok(Self {
            ops: ObjectOps::new(store, resolver),
        })
    }

    /// The qualified storage root.
    pub fn root(&self) -> &str {
        self.ops.resolver().root()
    }

    /// The name each write republishes.
    pub fn published_name(&self) -> &str {
        self.ops.resolver().published_name()
    }
}

impl DagDriver<HttpContentStore> {
    /// Connect to the daemon named by `config`.
    pub fn from_config(config: &DriverConfig) -> DriverResult<Self> {
        config.validate()?;
        let store = HttpContentStore::new(&config.addr)?;
        Self::new(store, &config.root)
    }
}

impl<S: ContentStore> StorageDriver for DagDriver<S> {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn get_content(&self, path: &str) -> DriverResult<Vec<u8>> {
        self.ops.read_all(path)
    }

    fn put_content(&self, path: &str, content: &[u8]) -> DriverResult<()> {
        self.ops.put(path, content)
    }

    fn reader(&self, path: &str, offset: u64) -> DriverResult<Box<dyn Read + Send>> {
        self.ops.read(path, offset)
    }

    fn write_stream(&self, path: &str, offset: u64, content: &mut dyn Read) -> DriverResult<u64> {
        self.ops.write(path, offset, content)
    }

    fn stat(&self, path: &str) -> DriverResult<FileInfo> {
        self.ops.stat(path)
    }

    fn list(&self, path: &str) -> DriverResult<Vec<String>> {
        self.ops.list(path)
    }

    fn move_object(&self, source: &str, dest: &str) -> DriverResult<()> {
        self.ops.move_object(source, dest)
    }

    fn delete(&self, path: &str) -> DriverResult<()> {
        self.ops.delete(path)
    }
}
