//! Per-path object primitives built on the path resolver, the content store
//! and the bubble publisher.
//!
//! Reads resolve the full path against the store directly. Every mutation
//! adds or patches objects and then bubbles the change up to the published
//! name.

use std::io::{self, Read};

use dagdrive_store::{ContentStore, StoreError};
use dagdrive_types::ContentHash;
use tracing::{debug, warn};

use crate::bubble::BubblePublisher;
use crate::driver::FileInfo;
use crate::error::{DriverError, DriverResult};
use crate::path::{normalize, split, PathResolver};

/// Both "no link named" and traversal through a file mean nothing resolves.
fn resolves_nothing(err: &StoreError) -> bool {
    err.is_not_found() || matches!(err, StoreError::NotADirectory { .. })
}

fn not_found_as(path: &str) -> impl FnOnce(StoreError) -> DriverError + '_ {
    move |err| {
        if resolves_nothing(&err) {
            DriverError::PathNotFound {
                path: path.to_string(),
            }
        } else {
            DriverError::Store(err)
        }
    }
}

/// Object operations over a content store rooted at a published name.
pub struct ObjectOps<S> {
    store: S,
    resolver: PathResolver,
}

impl<S: ContentStore> ObjectOps<S> {
    /// Create operations over `store`, with paths resolved by `resolver`.
    pub fn new(store: S, resolver: PathResolver) -> Self {
        Self { store, resolver }
    }

    /// The underlying content store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The resolver mapping logical paths under the qualified root.
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    fn bubble(&self) -> BubblePublisher<'_, S> {
        BubblePublisher::new(&self.store)
    }

    /// Stream the content at `path`, skipping the first `offset` bytes.
    pub fn read(&self, path: &str, offset: u64) -> DriverResult<Box<dyn Read + Send>> {
        let full = self.resolver.full_path(path)?;
        let mut reader = self.store.cat(&full).map_err(not_found_as(path))?;
        let skipped = io::copy(&mut reader.by_ref().take(offset), &mut io::sink())?;
        if skipped < offset {
            return Err(DriverError::InvalidOffset {
                path: path.to_string(),
                offset,
            });
        }
        Ok(reader)
    }

    /// Fetch and buffer the whole content at `path`.
    pub fn read_all(&self, path: &str) -> DriverResult<Vec<u8>> {
        let full = self.resolver.full_path(path)?;
        let mut reader = self.store.cat(&full).map_err(not_found_as(path))?;
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;
        debug!(path, bytes = content.len(), "read content");
        Ok(content)
    }

    /// Store `content` at `path`, replacing whatever was there.
    pub fn put(&self, path: &str, content: &[u8]) -> DriverResult<()> {
        let full = self.leaf_full_path(path)?;
        let hash = self.store.add_bytes(content)?;
        debug!(path, %hash, bytes = content.len(), "put content");
        self.bubble().publish(&full, hash)?;
        Ok(())
    }

    /// Keep the first `offset` bytes of the existing content at `path`,
    /// append everything from `reader`, and store the result.
    ///
    /// When nothing exists at `path` the offset is ignored. Returns the
    /// number of existing bytes kept ahead of the appended data.
    pub fn write(&self, path: &str, offset: u64, reader: &mut dyn Read) -> DriverResult<u64> {
        let full = self.leaf_full_path(path)?;

        let (hash, kept) = match self.store.cat(&full) {
            Ok(mut existing) => {
                let mut buf = Vec::new();
                let copied = existing.by_ref().take(offset).read_to_end(&mut buf)? as u64;
                if copied < offset {
                    return Err(DriverError::InvalidOffset {
                        path: path.to_string(),
                        offset,
                    });
                }
                reader.read_to_end(&mut buf)?;
                (self.store.add_bytes(&buf)?, copied)
            }
            Err(e) if resolves_nothing(&e) => (self.store.add(reader)?, 0),
            Err(e) => return Err(e.into()),
        };

        debug!(path, %hash, kept, "wrote content");
        self.bubble().publish(&full, hash)?;
        Ok(kept)
    }

    /// Describe the object at `path`. Directories report a size of zero.
    pub fn stat(&self, path: &str) -> DriverResult<FileInfo> {
        let full = self.resolver.full_path(path)?;
        let listing = self.store.file_list(&full).map_err(not_found_as(path))?;
        let is_dir = listing.is_dir();
        Ok(FileInfo {
            path: normalize(path)?,
            size: if is_dir { 0 } else { listing.size },
            mod_time: None,
            is_dir,
        })
    }

    /// Logical paths of the direct children of `path`.
    pub fn list(&self, path: &str) -> DriverResult<Vec<String>> {
        let full = self.resolver.full_path(path)?;
        let listing = self.store.file_list(&full).map_err(not_found_as(path))?;
        listing
            .child_names()
            .map(|name| {
                let child = format!("{full}/{name}");
                self.resolver
                    .relative(&child)
                    .ok_or_else(|| DriverError::invalid_path(&child, "outside the storage root"))
            })
            .collect()
    }

    /// Move the object at `source` to `dest`.
    ///
    /// Runs two bubble passes: the first publishes the tree without
    /// `source`, the second links the same object at `dest`. A reader can
    /// observe the object missing in between, and a failed second pass
    /// leaves it missing.
    pub fn move_object(&self, source: &str, dest: &str) -> DriverResult<()> {
        let src_full = self.leaf_full_path(source)?;
        let dst_full = self.leaf_full_path(dest)?;

        if src_full == dst_full {
            self.store.file_list(&src_full).map_err(not_found_as(source))?;
            return Ok(());
        }
        if dst_full.starts_with(&format!("{src_full}/")) {
            return Err(DriverError::invalid_path(
                dest,
                format!("destination is inside source {source}"),
            ));
        }

        let moved = self.unlink(&src_full, source)?;

        if let Err(err) = self.bubble().publish(&dst_full, moved.clone()) {
            warn!(
                source,
                dest,
                hash = %moved,
                error = %err,
                "move removed source but failed to link destination"
            );
            return Err(err);
        }
        debug!(source, dest, hash = %moved, "moved");
        Ok(())
    }

    /// Remove the object at `path` and everything below it.
    pub fn delete(&self, path: &str) -> DriverResult<()> {
        let full = self.leaf_full_path(path)?;
        let removed = self.unlink(&full, path)?;
        debug!(path, hash = %removed, "deleted");
        Ok(())
    }

    /// Full path for a put, write, move or delete. The root directory is
    /// never replaced or unlinked.
    fn leaf_full_path(&self, path: &str) -> DriverResult<String> {
        let full = self.resolver.full_path(path)?;
        if self.resolver.is_root(&full) {
            return Err(DriverError::invalid_path(
                path,
                "the storage root cannot be written, moved or deleted",
            ));
        }
        Ok(full)
    }

    /// Drop the link at `full` from its parent, bubble the parent, and
    /// return the hash the link pointed at.
    fn unlink(&self, full: &str, logical: &str) -> DriverResult<ContentHash> {
        let (parent_path, name) = split(full);
        let parent = self
            .store
            .file_list(parent_path)
            .map_err(not_found_as(logical))?;
        let target = parent
            .link(name)
            .map(|l| l.hash.clone())
            .ok_or_else(|| DriverError::PathNotFound {
                path: logical.to_string(),
            })?;

        let stripped = match self.store.patch_rm_link(&parent.hash, name) {
            Ok(hash) => hash,
            Err(e) if e.is_link_not_found() => {
                return Err(DriverError::PathNotFound {
                    path: logical.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        self.bubble().publish(parent_path, stripped)?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagdrive_store::InMemoryContentStore;
    use proptest::prelude::*;
    use std::sync::Arc;

    const ROOT: &str = "/ipns/peer/registry";

    fn ops() -> ObjectOps<Arc<InMemoryContentStore>> {
        ObjectOps::new(
            Arc::new(InMemoryContentStore::with_identity("peer")),
            PathResolver::new(ROOT).unwrap(),
        )
    }

    fn read_stream(mut reader: Box<dyn Read + Send>) -> Vec<u8> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).unwrap();
        buf
    }

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    // -----------------------------------------------------------------------
    // Reads and writes
    // -----------------------------------------------------------------------

    #[test]
    fn put_then_read_all() {
        let ops = ops();
        ops.put("/a/b/c", b"payload").unwrap();
        assert_eq!(ops.read_all("/a/b/c").unwrap(), b"payload");
        assert_eq!(ops.read_all("a//b/c/").unwrap(), b"payload");
    }

    #[test]
    fn write_at_zero_round_trips() {
        let ops = ops();
        let kept = ops.write("/blob", 0, &mut &b"hello"[..]).unwrap();
        assert_eq!(kept, 0);
        assert_eq!(ops.read_all("/blob").unwrap(), b"hello");
    }

    #[test]
    fn write_appends_at_offset() {
        let ops = ops();
        ops.write("/blob", 0, &mut &b"hello "[..]).unwrap();
        let kept = ops.write("/blob", 6, &mut &b"world"[..]).unwrap();
        assert_eq!(kept, 6);
        assert_eq!(ops.read_all("/blob").unwrap(), b"hello world");
    }

    #[test]
    fn write_truncates_to_offset_before_appending() {
        let ops = ops();
        ops.put("/blob", b"abcdef").unwrap();
        let kept = ops.write("/blob", 2, &mut &b"XY"[..]).unwrap();
        assert_eq!(kept, 2);
        assert_eq!(ops.read_all("/blob").unwrap(), b"abXY");
    }

    #[test]
    fn write_past_end_fails_and_publishes_nothing() {
        let ops = ops();
        ops.put("/blob", b"abc").unwrap();
        let before = ops.store().resolve_name("peer");
        let err = ops.write("/blob", 4, &mut &b"x"[..]).unwrap_err();
        assert!(matches!(err, DriverError::InvalidOffset { offset: 4, .. }));
        assert_eq!(ops.store().resolve_name("peer"), before);
        assert_eq!(ops.read_all("/blob").unwrap(), b"abc");
    }

    #[test]
    fn write_to_new_path_ignores_offset() {
        let ops = ops();
        let kept = ops.write("/fresh", 100, &mut &b"data"[..]).unwrap();
        assert_eq!(kept, 0);
        assert_eq!(ops.read_all("/fresh").unwrap(), b"data");
    }

    #[test]
    fn read_skips_offset() {
        let ops = ops();
        ops.put("/blob", b"0123456789").unwrap();
        assert_eq!(read_stream(ops.read("/blob", 0).unwrap()), b"0123456789");
        assert_eq!(read_stream(ops.read("/blob", 4).unwrap()), b"456789");
        assert_eq!(read_stream(ops.read("/blob", 10).unwrap()), b"");
    }

    #[test]
    fn read_past_end_is_invalid_offset() {
        let ops = ops();
        ops.put("/blob", b"abc").unwrap();
        assert!(matches!(
            ops.read("/blob", 4),
            Err(DriverError::InvalidOffset { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Stat and list
    // -----------------------------------------------------------------------

    #[test]
    fn stat_classifies_files_and_directories() {
        let ops = ops();
        ops.put("/a/b", b"12345").unwrap();

        let file = ops.stat("/a/b").unwrap();
        assert!(!file.is_dir);
        assert_eq!(file.size, 5);
        assert_eq!(file.path, "/a/b");
        assert!(file.mod_time.is_none());

        let dir = ops.stat("a").unwrap();
        assert!(dir.is_dir);
        assert_eq!(dir.size, 0);
        assert_eq!(dir.path, "/a");
    }

    #[test]
    fn list_reflects_writes() {
        let ops = ops();
        ops.put("/a/b", b"1").unwrap();
        ops.put("/a/c", b"2").unwrap();
        ops.put("/other", b"3").unwrap();

        assert_eq!(sorted(ops.list("/a").unwrap()), vec!["/a/b", "/a/c"]);
        assert_eq!(sorted(ops.list("/a/").unwrap()), vec!["/a/b", "/a/c"]);
        assert_eq!(sorted(ops.list("/").unwrap()), vec!["/a", "/other"]);
        assert!(ops.stat("/a").unwrap().is_dir);
    }

    #[test]
    fn list_of_file_is_empty() {
        let ops = ops();
        ops.put("/f", b"x").unwrap();
        assert!(ops.list("/f").unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Move and delete
    // -----------------------------------------------------------------------

    #[test]
    fn move_relocates_content() {
        let ops = ops();
        ops.put("/src/blob", b"moving").unwrap();
        ops.move_object("/src/blob", "/dst/deep/blob").unwrap();

        assert_eq!(ops.read_all("/dst/deep/blob").unwrap(), b"moving");
        assert!(ops.stat("/src/blob").unwrap_err().is_not_found());
        assert!(ops.list("/src").unwrap().is_empty());
    }

    #[test]
    fn move_publishes_twice() {
        let ops = ops();
        ops.put("/src", b"x").unwrap();
        ops.store().reset_stats();
        ops.move_object("/src", "/dst").unwrap();
        assert_eq!(ops.store().stats().publish, 2);
    }

    #[test]
    fn move_overwrites_destination() {
        let ops = ops();
        ops.put("/a", b"new").unwrap();
        ops.put("/b", b"old").unwrap();
        ops.move_object("/a", "/b").unwrap();
        assert_eq!(ops.read_all("/b").unwrap(), b"new");
        assert!(ops.read_all("/a").unwrap_err().is_not_found());
    }

    #[test]
    fn move_of_directory_carries_subtree() {
        let ops = ops();
        ops.put("/dir/x", b"x").unwrap();
        ops.put("/dir/sub/y", b"y").unwrap();
        ops.move_object("/dir", "/renamed").unwrap();
        assert_eq!(ops.read_all("/renamed/sub/y").unwrap(), b"y");
        assert_eq!(sorted(ops.list("/renamed").unwrap()), vec!["/renamed/sub", "/renamed/x"]);
    }

    #[test]
    fn move_missing_source_is_not_found() {
        let ops = ops();
        ops.put("/dir/present", b"x").unwrap();
        assert!(ops.move_object("/dir/absent", "/x").unwrap_err().is_not_found());
        assert!(ops.move_object("/nodir/absent", "/x").unwrap_err().is_not_found());
    }

    #[test]
    fn move_onto_itself_is_a_checked_noop() {
        let ops = ops();
        ops.put("/same", b"x").unwrap();
        ops.store().reset_stats();
        ops.move_object("/same", "same/").unwrap();
        assert_eq!(ops.store().stats().publish, 0);
        assert!(ops.move_object("/ghost", "/ghost").unwrap_err().is_not_found());
    }

    #[test]
    fn move_into_own_subtree_is_rejected() {
        let ops = ops();
        ops.put("/dir/x", b"x").unwrap();
        assert!(matches!(
            ops.move_object("/dir", "/dir/inner"),
            Err(DriverError::InvalidPath { .. })
        ));
        assert_eq!(ops.read_all("/dir/x").unwrap(), b"x");
    }

    #[test]
    fn delete_removes_subtree() {
        let ops = ops();
        ops.put("/dir/a", b"a").unwrap();
        ops.put("/dir/b/c", b"c").unwrap();
        ops.put("/keep", b"k").unwrap();
        ops.delete("/dir").unwrap();

        assert!(ops.stat("/dir").unwrap_err().is_not_found());
        assert!(ops.read_all("/dir/b/c").unwrap_err().is_not_found());
        assert_eq!(ops.list("/").unwrap(), vec!["/keep"]);
    }

    #[test]
    fn second_delete_is_not_found() {
        let ops = ops();
        ops.put("/a/b", b"x").unwrap();
        ops.delete("/a/b").unwrap();
        assert!(ops.delete("/a/b").unwrap_err().is_not_found());
        // The emptied parent survives.
        assert!(ops.stat("/a").unwrap().is_dir);
    }

    #[test]
    fn root_cannot_be_overwritten() {
        let ops = ops();
        ops.put("/blobs/a", b"kept").unwrap();
        let before = ops.store().resolve_name("peer");
        ops.store().reset_stats();

        for root in ["/", ""] {
            assert!(matches!(ops.put(root, b"oops"), Err(DriverError::InvalidPath { .. })));
            assert!(matches!(
                ops.write(root, 0, &mut &b"oops"[..]),
                Err(DriverError::InvalidPath { .. })
            ));
        }

        assert_eq!(ops.store().stats().total(), 0);
        assert_eq!(ops.store().resolve_name("peer"), before);
        assert!(ops.stat("/").unwrap().is_dir);
        assert_eq!(ops.read_all("/blobs/a").unwrap(), b"kept");
        ops.put("/blobs/b", b"later").unwrap();
    }

    #[test]
    fn root_cannot_be_moved_or_deleted() {
        let ops = ops();
        ops.put("/a", b"x").unwrap();
        assert!(matches!(ops.delete("/"), Err(DriverError::InvalidPath { .. })));
        assert!(matches!(ops.move_object("", "/b"), Err(DriverError::InvalidPath { .. })));
        assert!(matches!(ops.move_object("/a", "/"), Err(DriverError::InvalidPath { .. })));
    }

    // -----------------------------------------------------------------------
    // Not found everywhere
    // -----------------------------------------------------------------------

    #[test]
    fn nonexistent_paths_are_not_found_before_first_write() {
        let ops = ops();
        assert!(ops.read_all("/nope").unwrap_err().is_not_found());
        assert!(ops.read("/nope", 0).err().unwrap().is_not_found());
        assert!(ops.stat("/nope").unwrap_err().is_not_found());
        assert!(ops.list("/nope").unwrap_err().is_not_found());
        assert!(ops.delete("/nope").unwrap_err().is_not_found());
    }

    #[test]
    fn nonexistent_paths_are_not_found_after_writes() {
        let ops = ops();
        ops.put("/a/file", b"x").unwrap();
        for path in ["/a/missing", "/missing/deeper", "/a/file/child"] {
            assert!(ops.read_all(path).unwrap_err().is_not_found(), "{path}");
            assert!(ops.stat(path).unwrap_err().is_not_found(), "{path}");
            assert!(ops.list(path).unwrap_err().is_not_found(), "{path}");
            assert!(ops.delete(path).unwrap_err().is_not_found(), "{path}");
        }
    }

    #[test]
    fn parent_segments_are_rejected() {
        let ops = ops();
        assert!(matches!(
            ops.put("/../escape", b"x"),
            Err(DriverError::InvalidPath { .. })
        ));
        assert!(ops.store().published_names().is_empty());
    }

    // -----------------------------------------------------------------------
    // Depth scaling
    // -----------------------------------------------------------------------

    #[test]
    fn write_cost_scales_with_depth() {
        let ops = ops();
        for i in 0..10 {
            ops.put(&format!("/wide/f{i}"), b"x").unwrap();
        }
        for depth in 1..5usize {
            let path: String = (0..depth).map(|d| format!("/n{depth}_{d}")).collect();
            ops.store().reset_stats();
            ops.put(&format!("/wide{path}"), b"y").unwrap();
            // Segments below the published name: "registry", "wide", then `depth`.
            let expected = (depth + 2) as u64;
            let stats = ops.store().stats();
            assert_eq!(stats.add_link, expected);
            assert_eq!(stats.publish, 1);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn write_then_read_returns_payload(
            segments in proptest::collection::vec("[a-z0-9]{1,6}", 1..5),
            payload in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            let ops = ops();
            let path = format!("/{}", segments.join("/"));
            ops.write(&path, 0, &mut payload.as_slice()).unwrap();
            prop_assert_eq!(ops.read_all(&path).unwrap(), payload);
        }

        #[test]
        fn partial_overwrite_concatenates(
            first in proptest::collection::vec(any::<u8>(), 0..64),
            second in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let ops = ops();
            ops.write("/blob", 0, &mut first.as_slice()).unwrap();
            ops.write("/blob", first.len() as u64, &mut second.as_slice()).unwrap();
            let mut expected = first.clone();
            expected.extend_from_slice(&second);
            prop_assert_eq!(ops.read_all("/blob").unwrap(), expected);
        }
    }
}
