//! Content-store protocol for dagdrive.
//!
//! The driver never touches bytes on disk. It talks to a content-addressed
//! Merkle-DAG store through the [`ContentStore`] trait: add and cat file
//! content, list the object at a path, patch links in and out of directory
//! objects, create empty objects, and publish a mutable name.
//!
//! # Backends
//!
//! - [`InMemoryContentStore`] -- `HashMap`-based store with per-call counters,
//!   used as the test double and for embedding
//! - [`HttpContentStore`] -- blocking client for a daemon's `/api/v0` RPC
//!
//! # Protocol Rules
//!
//! 1. Objects are immutable. Every patch returns the hash of a new object.
//! 2. A missing path entry is reported as [`StoreError::NoSuchEntry`].
//! 3. Removing an absent link is reported as [`StoreError::LinkNotFound`].
//! 4. `publish` is last-write-wins. There is no compare-and-swap.

pub mod address;
pub mod error;
pub mod hasher;
pub mod http;
pub mod memory;
pub mod traits;

pub use address::{PathRoot, StorePath};
pub use error::{StoreError, StoreResult};
pub use hasher::ContentHasher;
pub use http::HttpContentStore;
pub use memory::{CallStats, InMemoryContentStore};
pub use traits::{ContentStore, ObjectTemplate};
