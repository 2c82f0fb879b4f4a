use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use dagdrive_types::{ContentHash, Identity, Link, LinkKind, ObjectListing};
use tracing::trace;

use crate::address::{PathRoot, StorePath};
use crate::error::{StoreError, StoreResult};
use crate::hasher::ContentHasher;
use crate::traits::{ContentStore, ObjectTemplate};

/// Identity reported by a store built with [`InMemoryContentStore::new`].
pub const DEFAULT_IDENTITY: &str = "12D3KooWInMemoryStore";

#[derive(Clone, Debug, PartialEq, Eq)]
enum Node {
    File(Vec<u8>),
    Directory(BTreeMap<String, Link>),
}

impl Node {
    fn kind(&self) -> LinkKind {
        match self {
            Self::File(_) => LinkKind::File,
            Self::Directory(_) => LinkKind::Directory,
        }
    }

    /// Cumulative size: content length for files, sum of link sizes for
    /// directories.
    fn size(&self) -> u64 {
        match self {
            Self::File(data) => data.len() as u64,
            Self::Directory(links) => links.values().map(|l| l.size).sum(),
        }
    }

    fn compute_hash(&self) -> StoreResult<ContentHash> {
        match self {
            Self::File(data) => Ok(ContentHasher::FILE.hash(data)),
            Self::Directory(links) => {
                // BTreeMap iteration is name-ordered, so the encoding is canonical.
                let entries: Vec<&Link> = links.values().collect();
                let data = serde_json::to_vec(&entries)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(ContentHasher::DIRECTORY.hash(&data))
            }
        }
    }
}

/// Number of calls made to each [`ContentStore`] method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallStats {
    pub add: u64,
    pub cat: u64,
    pub file_list: u64,
    pub rm_link: u64,
    pub add_link: u64,
    pub new_object: u64,
    pub publish: u64,
    pub id: u64,
}

impl CallStats {
    pub fn total(&self) -> u64 {
        self.add
            + self.cat
            + self.file_list
            + self.rm_link
            + self.add_link
            + self.new_object
            + self.publish
            + self.id
    }
}

#[derive(Default)]
struct Counters {
    add: AtomicU64,
    cat: AtomicU64,
    file_list: AtomicU64,
    rm_link: AtomicU64,
    add_link: AtomicU64,
    new_object: AtomicU64,
    publish: AtomicU64,
    id: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CallStats {
        CallStats {
            add: self.add.load(Ordering::Relaxed),
            cat: self.cat.load(Ordering::Relaxed),
            file_list: self.file_list.load(Ordering::Relaxed),
            rm_link: self.rm_link.load(Ordering::Relaxed),
            add_link: self.add_link.load(Ordering::Relaxed),
            new_object: self.new_object.load(Ordering::Relaxed),
            publish: self.publish.load(Ordering::Relaxed),
            id: self.id.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        for counter in [
            &self.add,
            &self.cat,
            &self.file_list,
            &self.rm_link,
            &self.add_link,
            &self.new_object,
            &self.publish,
            &self.id,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// In-memory, HashMap-based content store.
///
/// Objects and published names are held behind `RwLock`s. Both maps are
/// insert-only from the point of view of any single call, so a poisoned lock
/// still guards consistent data and is recovered rather than reported.
///
/// Every trait call is counted; see [`InMemoryContentStore::stats`].
pub struct InMemoryContentStore {
    objects: RwLock<HashMap<ContentHash, Node>>,
    names: RwLock<HashMap<String, ContentHash>>,
    identity: Identity,
    counters: Counters,
}

impl InMemoryContentStore {
    /// Create an empty store reporting [`DEFAULT_IDENTITY`].
    pub fn new() -> Self {
        Self::with_identity(DEFAULT_IDENTITY)
    }

    /// Create an empty store reporting the given identity.
    pub fn with_identity(id: impl Into<String>) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            names: RwLock::new(HashMap::new()),
            identity: Identity::new(id),
            counters: Counters::default(),
        }
    }

    /// Number of objects currently stored, reachable or not.
    pub fn len(&self) -> usize {
        self.objects().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects().is_empty()
    }

    /// Current target of a published name.
    pub fn resolve_name(&self, name: &str) -> Option<ContentHash> {
        self.names().get(name).cloned()
    }

    /// Sorted list of every published name.
    pub fn published_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names().keys().cloned().collect();
        names.sort();
        names
    }

    /// Snapshot of the per-method call counters.
    pub fn stats(&self) -> CallStats {
        self.counters.snapshot()
    }

    /// Zero every call counter.
    pub fn reset_stats(&self) {
        self.counters.reset();
    }

    fn objects(&self) -> RwLockReadGuard<'_, HashMap<ContentHash, Node>> {
        self.objects.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn objects_mut(&self) -> RwLockWriteGuard<'_, HashMap<ContentHash, Node>> {
        self.objects.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn names(&self) -> RwLockReadGuard<'_, HashMap<String, ContentHash>> {
        self.names.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, node: Node) -> StoreResult<ContentHash> {
        let hash = node.compute_hash()?;
        // Same hash always means same content, so an existing entry is kept.
        self.objects_mut().entry(hash.clone()).or_insert(node);
        Ok(hash)
    }

    fn node(&self, hash: &ContentHash) -> StoreResult<Node> {
        self.objects()
            .get(hash)
            .cloned()
            .ok_or_else(|| StoreError::NoSuchEntry {
                path: hash.ipfs_path(),
            })
    }

    fn directory(&self, hash: &ContentHash) -> StoreResult<BTreeMap<String, Link>> {
        match self.node(hash)? {
            Node::Directory(links) => Ok(links),
            Node::File(_) => Err(StoreError::NotADirectory {
                path: hash.ipfs_path(),
            }),
        }
    }

    fn resolve(&self, path: &str) -> StoreResult<(ContentHash, Node)> {
        let not_found = || StoreError::NoSuchEntry {
            path: path.to_string(),
        };

        let parsed = StorePath::parse(path)?;
        let mut hash = match parsed.root {
            PathRoot::Name(name) => self.resolve_name(&name).ok_or_else(not_found)?,
            PathRoot::Hash(hash) => hash,
        };

        let objects = self.objects();
        let mut node = objects.get(&hash).ok_or_else(not_found)?;
        for segment in &parsed.segments {
            let links = match node {
                Node::Directory(links) => links,
                Node::File(_) => {
                    return Err(StoreError::NotADirectory {
                        path: path.to_string(),
                    })
                }
            };
            let link = links.get(segment).ok_or_else(not_found)?;
            hash = link.hash.clone();
            node = objects.get(&hash).ok_or_else(not_found)?;
        }
        Ok((hash, node.clone()))
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentStore for InMemoryContentStore {
    fn add(&self, data: &mut dyn Read) -> StoreResult<ContentHash> {
        Counters::bump(&self.counters.add);
        let mut buf = Vec::new();
        data.read_to_end(&mut buf)?;
        self.insert(Node::File(buf))
    }

    fn cat(&self, path: &str) -> StoreResult<Box<dyn Read + Send>> {
        Counters::bump(&self.counters.cat);
        match self.resolve(path)? {
            (_, Node::File(data)) => Ok(Box::new(Cursor::new(data))),
            (_, Node::Directory(_)) => Err(StoreError::NotAFile {
                path: path.to_string(),
            }),
        }
    }

    fn file_list(&self, path: &str) -> StoreResult<ObjectListing> {
        Counters::bump(&self.counters.file_list);
        let (hash, node) = self.resolve(path)?;
        let links = match &node {
            Node::File(_) => Vec::new(),
            Node::Directory(links) => links.values().cloned().collect(),
        };
        Ok(ObjectListing {
            hash,
            kind: node.kind(),
            size: node.size(),
            links,
        })
    }

    fn patch_rm_link(&self, hash: &ContentHash, name: &str) -> StoreResult<ContentHash> {
        Counters::bump(&self.counters.rm_link);
        let mut links = self.directory(hash)?;
        if links.remove(name).is_none() {
            return Err(StoreError::LinkNotFound {
                name: name.to_string(),
            });
        }
        let new_hash = self.insert(Node::Directory(links))?;
        trace!(%hash, %new_hash, name, "rm-link");
        Ok(new_hash)
    }

    fn patch_add_link(
        &self,
        hash: &ContentHash,
        name: &str,
        target: &ContentHash,
    ) -> StoreResult<ContentHash> {
        Counters::bump(&self.counters.add_link);
        if name.is_empty() || name.contains('/') {
            return Err(StoreError::InvalidPath {
                path: name.to_string(),
                reason: "link names must be a single non-empty segment".into(),
            });
        }
        let mut links = self.directory(hash)?;
        let child = self.node(target)?;
        links.insert(
            name.to_string(),
            Link::new(name, target.clone(), child.size(), child.kind()),
        );
        let new_hash = self.insert(Node::Directory(links))?;
        trace!(%hash, %new_hash, name, %target, "add-link");
        Ok(new_hash)
    }

    fn new_object(&self, template: ObjectTemplate) -> StoreResult<ContentHash> {
        Counters::bump(&self.counters.new_object);
        match template {
            ObjectTemplate::UnixfsDir => self.insert(Node::Directory(BTreeMap::new())),
        }
    }

    fn publish(&self, name: &str, hash: &ContentHash) -> StoreResult<()> {
        Counters::bump(&self.counters.publish);
        // Refuse to publish a dangling hash.
        self.node(hash)?;
        self.names
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), hash.clone());
        trace!(name, %hash, "publish");
        Ok(())
    }

    fn id(&self) -> StoreResult<Identity> {
        Counters::bump(&self.counters.id);
        Ok(self.identity.clone())
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentStore")
            .field("identity", &self.identity.id)
            .field("object_count", &self.len())
            .finish()
    }
}
