use std::io::Read;
use std::sync::Arc;

use dagdrive_types::{ContentHash, Identity, ObjectListing};

use crate::error::StoreResult;

/// Template for [`ContentStore::new_object`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectTemplate {
    /// An empty unixfs directory.
    UnixfsDir,
}

impl ObjectTemplate {
    /// Name of the template on the daemon RPC.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnixfsDir => "unixfs-dir",
        }
    }
}

/// Content-addressed Merkle-DAG store with mutable published names.
///
/// All calls block the calling thread for one round-trip. Implementations:
/// - never mutate an object in place; patches return new hashes
/// - report a missing path as `StoreError::NoSuchEntry`
/// - report removal of an absent link as `StoreError::LinkNotFound`
/// - apply `publish` as last-write-wins on the name
pub trait ContentStore: Send + Sync {
    /// Store `data` as a file object and return its hash.
    fn add(&self, data: &mut dyn Read) -> StoreResult<ContentHash>;

    /// Stream the content of the file object at `path`.
    fn cat(&self, path: &str) -> StoreResult<Box<dyn Read + Send>>;

    /// Resolve `path` and describe the object found there.
    fn file_list(&self, path: &str) -> StoreResult<ObjectListing>;

    /// Copy the directory object `hash` without the link `name`.
    fn patch_rm_link(&self, hash: &ContentHash, name: &str) -> StoreResult<ContentHash>;

    /// Copy the directory object `hash` with `name` linking to `target`,
    /// replacing any existing link of that name.
    fn patch_add_link(
        &self,
        hash: &ContentHash,
        name: &str,
        target: &ContentHash,
    ) -> StoreResult<ContentHash>;

    /// Create an empty object from a template.
    fn new_object(&self, template: ObjectTemplate) -> StoreResult<ContentHash>;

    /// Point the published `name` at `hash`.
    fn publish(&self, name: &str, hash: &ContentHash) -> StoreResult<()>;

    /// Identity of the local store node.
    fn id(&self) -> StoreResult<Identity>;

    /// Convenience wrapper over [`ContentStore::add`] for buffered content.
    fn add_bytes(&self, data: &[u8]) -> StoreResult<ContentHash> {
        let mut reader = data;
        self.add(&mut reader)
    }
}

impl<S: ContentStore + ?Sized> ContentStore for Arc<S> {
    fn add(&self, data: &mut dyn Read) -> StoreResult<ContentHash> {
        (**self).add(data)
    }

    fn cat(&self, path: &str) -> StoreResult<Box<dyn Read + Send>> {
        (**self).cat(path)
    }

    fn file_list(&self, path: &str) -> StoreResult<ObjectListing> {
        (**self).file_list(path)
    }

    fn patch_rm_link(&self, hash: &ContentHash, name: &str) -> StoreResult<ContentHash> {
        (**self).patch_rm_link(hash, name)
    }

    fn patch_add_link(
        &self,
        hash: &ContentHash,
        name: &str,
        target: &ContentHash,
    ) -> StoreResult<ContentHash> {
        (**self).patch_add_link(hash, name, target)
    }

    fn new_object(&self, template: ObjectTemplate) -> StoreResult<ContentHash> {
        (**self).new_object(template)
    }

    fn publish(&self, name: &str, hash: &ContentHash) -> StoreResult<()> {
        (**self).publish(name, hash)
    }

    fn id(&self) -> StoreResult<Identity> {
        (**self).id()
    }
}
