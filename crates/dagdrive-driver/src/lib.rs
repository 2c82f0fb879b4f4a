//! Path-addressable storage driver over a content-addressed Merkle-DAG.
//!
//! Clients read and write byte content under hierarchical keys such as
//! `/docker/registry/v2/blobs/...`. Every key lives below a storage root of
//! the form `/ipns/<name>/<prefix>`, where `<name>` is a mutable published
//! name resolving to the current root directory object.
//!
//! Objects in the store are immutable, so a write at depth `n` produces a new
//! file object and then `n` new ancestor directory objects, bottom-up, before
//! `<name>` is republished at the new root. That pass is the
//! [`BubblePublisher`].
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use dagdrive_driver::{DagDriver, StorageDriver};
//! use dagdrive_store::InMemoryContentStore;
//!
//! let store = Arc::new(InMemoryContentStore::new());
//! let driver = DagDriver::new(store, "/ipns/local/docker-registry").unwrap();
//!
//! driver.put_content("/blobs/layer", b"tarball").unwrap();
//! assert_eq!(driver.get_content("/blobs/layer").unwrap(), b"tarball");
//! assert_eq!(driver.list("/blobs").unwrap(), vec!["/blobs/layer"]);
//! ```
//!
//! # Modules
//!
//! - [`path`] -- logical path normalization and root qualification
//! - [`bubble`] -- ancestor rewrite and name publish
//! - [`ops`] -- read, write, stat, list, move and delete primitives
//! - [`driver`] -- the [`StorageDriver`] surface and [`DagDriver`]
//! - [`config`] -- [`DriverConfig`] with defaults, parameter maps and TOML
//! - [`factory`] -- named driver construction

pub mod bubble;
pub mod config;
pub mod driver;
pub mod error;
pub mod factory;
pub mod ops;
pub mod path;

pub use bubble::{BubblePublisher, BubbleReport};
pub use config::{DriverConfig, DEFAULT_ADDR, DEFAULT_ROOT};
pub use driver::{DagDriver, FileInfo, StorageDriver, DRIVER_NAME};
pub use error::{DriverError, DriverResult};
pub use factory::{DagDriverFactory, DriverFactory, DriverRegistry};
pub use ops::ObjectOps;
pub use path::{normalize, PathResolver};

// Re-export the store types callers need to construct a driver.
pub use dagdrive_store::{ContentStore, HttpContentStore, InMemoryContentStore};
