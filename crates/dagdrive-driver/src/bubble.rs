//! Bubble publishing: propagating a changed hash up to the published name.
//!
//! Links are embedded in parent objects by hash, so replacing the object at
//! `/ipns/<name>/a/b/c` invalidates the objects at `a/b`, `a`, and the root.
//! [`BubblePublisher::publish`] rewrites each ancestor bottom-up and finally
//! points `<name>` at the new root. A write at depth `n` below the name costs
//! `n` rewrite steps and one publish, independent of directory sizes.
//!
//! # Failure and concurrency
//!
//! The name only ever moves to a fully linked root, and only in the final
//! step. A failure part way up leaves the rewritten ancestors orphaned and
//! the name untouched.
//!
//! The name is shared state with no coordination. Two bubbles started from
//! the same root each build a chain from what they observed, and the later
//! publish silently discards the earlier one's changes. Callers that need
//! more must serialize their writers.

use dagdrive_store::{ContentStore, ObjectTemplate};
use dagdrive_types::ContentHash;
use tracing::debug;

use crate::error::{DriverError, DriverResult};
use crate::path::{split, NAME_NAMESPACE};

/// Outcome of a completed bubble pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BubbleReport {
    /// Name that was republished.
    pub published_name: String,
    /// Root hash the name now resolves to.
    pub root_hash: ContentHash,
    /// Number of ancestor objects rewritten.
    pub steps: usize,
}

/// Rewrites ancestor directories and republishes the root name.
pub struct BubblePublisher<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: ContentStore + ?Sized> BubblePublisher<'a, S> {
    /// Create a publisher writing through `store`.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Link `hash` at the store path `path` (e.g. `/ipns/<name>/a/b`) and
    /// republish `<name>`.
    ///
    /// Missing ancestors are created from empty directory objects.
    pub fn publish(&self, path: &str, hash: ContentHash) -> DriverResult<BubbleReport> {
        let under_names = path
            .strip_prefix(NAME_NAMESPACE)
            .is_some_and(|rest| rest.starts_with('/'));
        if !under_names {
            return Err(DriverError::invalid_path(path, "not under /ipns"));
        }
        debug!(path, %hash, "bubbling content");

        let mut path = path.to_string();
        let mut hash = hash;
        let mut steps = 0;

        loop {
            let (parent, child) = split(&path);
            if child.is_empty() {
                return Err(DriverError::invalid_path(&path, "empty path segment"));
            }

            if parent == NAME_NAMESPACE {
                self.store.publish(child, &hash)?;
                debug!(name = child, %hash, steps, "published");
                return Ok(BubbleReport {
                    published_name: child.to_string(),
                    root_hash: hash,
                    steps,
                });
            }
            if parent.is_empty() {
                return Err(DriverError::invalid_path(&path, "not under /ipns"));
            }

            let old_parent = self.current_or_empty(parent)?;
            let stripped = match self.store.patch_rm_link(&old_parent, child) {
                Ok(stripped) => stripped,
                Err(e) if e.is_link_not_found() => old_parent.clone(),
                Err(e) => return Err(e.into()),
            };
            let new_parent = self.store.patch_add_link(&stripped, child, &hash)?;

            debug!(
                parent,
                child,
                old = %old_parent,
                new = %new_parent,
                "rewrote ancestor"
            );

            steps += 1;
            hash = new_parent;
            path = parent.to_string();
        }
    }

    /// Hash of the directory at `path`, or of a fresh empty directory when
    /// nothing exists there yet.
    fn current_or_empty(&self, path: &str) -> DriverResult<ContentHash> {
        match self.store.file_list(path) {
            Ok(listing) => Ok(listing.hash),
            Err(e) if e.is_not_found() => Ok(self.store.new_object(ObjectTemplate::UnixfsDir)?),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagdrive_store::{InMemoryContentStore, StoreError};
    use dagdrive_types::{Identity, ObjectListing};
    use std::io::Read;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn read(store: &InMemoryContentStore, path: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        store.cat(path).unwrap().read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn creates_missing_ancestors() {
        let store = InMemoryContentStore::new();
        let leaf = store.add_bytes(b"layer").unwrap();

        let report = BubblePublisher::new(&store)
            .publish("/ipns/peer/reg/blobs/sha256", leaf.clone())
            .unwrap();

        assert_eq!(report.published_name, "peer");
        assert_eq!(report.steps, 3);
        assert_eq!(store.resolve_name("peer"), Some(report.root_hash));
        assert_eq!(read(&store, "/ipns/peer/reg/blobs/sha256"), b"layer");
        assert!(store.file_list("/ipns/peer/reg/blobs").unwrap().is_dir());
    }

    #[test]
    fn preserves_siblings() {
        let store = InMemoryContentStore::new();
        let bubble = BubblePublisher::new(&store);
        bubble
            .publish("/ipns/peer/a/one", store.add_bytes(b"1").unwrap())
            .unwrap();
        bubble
            .publish("/ipns/peer/a/two", store.add_bytes(b"2").unwrap())
            .unwrap();
        bubble
            .publish("/ipns/peer/b", store.add_bytes(b"3").unwrap())
            .unwrap();

        let a = store.file_list("/ipns/peer/a").unwrap();
        let mut names: Vec<_> = a.child_names().collect();
        names.sort();
        assert_eq!(names, vec!["one", "two"]);
        assert_eq!(read(&store, "/ipns/peer/b"), b"3");
    }

    #[test]
    fn replaces_existing_link() {
        let store = InMemoryContentStore::new();
        let bubble = BubblePublisher::new(&store);
        bubble
            .publish("/ipns/peer/f", store.add_bytes(b"old").unwrap())
            .unwrap();
        bubble
            .publish("/ipns/peer/f", store.add_bytes(b"new").unwrap())
            .unwrap();
        assert_eq!(read(&store, "/ipns/peer/f"), b"new");
        assert_eq!(store.file_list("/ipns/peer").unwrap().links.len(), 1);
    }

    #[test]
    fn step_count_tracks_depth_not_width() {
        let store = InMemoryContentStore::new();
        let bubble = BubblePublisher::new(&store);
        for i in 0..20 {
            bubble
                .publish(&format!("/ipns/peer/wide/f{i}"), store.add_bytes(&[i]).unwrap())
                .unwrap();
        }

        for depth in 1..6 {
            let path: String = (0..depth).map(|d| format!("/n{depth}_{d}")).collect();
            store.reset_stats();
            let report = bubble
                .publish(&format!("/ipns/peer/wide{path}"), store.add_bytes(b"x").unwrap())
                .unwrap();
            let stats = store.stats();
            // `wide` plus `depth` segments below the name.
            assert_eq!(report.steps, depth + 1);
            assert_eq!(stats.add_link, (depth + 1) as u64);
            assert_eq!(stats.rm_link, (depth + 1) as u64);
            assert_eq!(stats.file_list, (depth + 1) as u64);
            assert_eq!(stats.publish, 1);
        }
    }

    #[test]
    fn publishing_the_name_itself_takes_no_steps() {
        let store = InMemoryContentStore::new();
        let dir = store.new_object(ObjectTemplate::UnixfsDir).unwrap();
        let report = BubblePublisher::new(&store)
            .publish("/ipns/peer", dir.clone())
            .unwrap();
        assert_eq!(report.steps, 0);
        assert_eq!(store.resolve_name("peer"), Some(dir));
    }

    #[test]
    fn rejects_paths_outside_names() {
        let store = InMemoryContentStore::new();
        let hash = store.add_bytes(b"x").unwrap();
        let bubble = BubblePublisher::new(&store);
        for path in ["/ipfs/QmRoot/a", "/data/a", "/ipns", "/ipnsx/a", "/ipns/peer/"] {
            let result = bubble.publish(path, hash.clone());
            assert!(matches!(result, Err(DriverError::InvalidPath { .. })), "{path}");
        }
        assert!(store.published_names().is_empty());
    }

    /// Store whose `patch_add_link` fails once armed.
    struct FailingStore {
        inner: InMemoryContentStore,
        fail_add_link: AtomicBool,
    }

    impl ContentStore for FailingStore {
        fn add(&self, data: &mut dyn Read) -> dagdrive_store::StoreResult<ContentHash> {
            self.inner.add(data)
        }
        fn cat(&self, path: &str) -> dagdrive_store::StoreResult<Box<dyn Read + Send>> {
            self.inner.cat(path)
        }
        fn file_list(&self, path: &str) -> dagdrive_store::StoreResult<ObjectListing> {
            self.inner.file_list(path)
        }
        fn patch_rm_link(
            &self,
            hash: &ContentHash,
            name: &str,
        ) -> dagdrive_store::StoreResult<ContentHash> {
            self.inner.patch_rm_link(hash, name)
        }
        fn patch_add_link(
            &self,
            hash: &ContentHash,
            name: &str,
            target: &ContentHash,
        ) -> dagdrive_store::StoreResult<ContentHash> {
            if self.fail_add_link.load(Ordering::SeqCst) {
                return Err(StoreError::Daemon {
                    status: 500,
                    message: "connection reset".into(),
                });
            }
            self.inner.patch_add_link(hash, name, target)
        }
        fn new_object(
            &self,
            template: ObjectTemplate,
        ) -> dagdrive_store::StoreResult<ContentHash> {
            self.inner.new_object(template)
        }
        fn publish(&self, name: &str, hash: &ContentHash) -> dagdrive_store::StoreResult<()> {
            self.inner.publish(name, hash)
        }
        fn id(&self) -> dagdrive_store::StoreResult<Identity> {
            self.inner.id()
        }
    }

    #[test]
    fn store_failure_leaves_name_untouched() {
        let store = FailingStore {
            inner: InMemoryContentStore::new(),
            fail_add_link: AtomicBool::new(false),
        };
        let bubble = BubblePublisher::new(&store);
        bubble
            .publish("/ipns/peer/a", store.add_bytes(b"before").unwrap())
            .unwrap();
        let before = store.inner.resolve_name("peer");

        store.fail_add_link.store(true, Ordering::SeqCst);
        let err = bubble
            .publish("/ipns/peer/c/b", store.add_bytes(b"after").unwrap())
            .unwrap_err();
        assert!(matches!(err, DriverError::Store(StoreError::Daemon { .. })));
        assert_eq!(store.inner.resolve_name("peer"), before);
    }
}
