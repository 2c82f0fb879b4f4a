//! Foundation types for dagdrive.
//!
//! dagdrive maps a hierarchical key/value storage contract onto a
//! content-addressed Merkle-DAG store. This crate holds the plain data types
//! shared by the store client and the driver. It performs no I/O.
//!
//! # Key Types
//!
//! - [`ContentHash`] -- Opaque content address issued by the store
//! - [`Link`] -- A named edge from a directory object to a child object
//! - [`LinkKind`] -- Whether a link points at a file or a directory
//! - [`ObjectListing`] -- The resolved view of the object at a path
//! - [`Identity`] -- The local store identity used to qualify published names

pub mod error;
pub mod hash;
pub mod identity;
pub mod link;

pub use error::TypeError;
pub use hash::ContentHash;
pub use identity::Identity;
pub use link::{Link, LinkKind, ObjectListing};
