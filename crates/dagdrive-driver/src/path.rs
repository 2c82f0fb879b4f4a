//! Mapping of logical paths onto store paths under the storage root.
//!
//! Logical paths are `/`-separated and relative to the root no matter how
//! they are spelled: `a/b`, `/a/b` and `//a/./b/` all name the same key. A
//! `..` segment is rejected so a key can never escape the root.

use dagdrive_store::ContentStore;
use tracing::info;

use crate::error::{DriverError, DriverResult};

/// Namespace holding published names. The bubble stops one level below it.
pub const NAME_NAMESPACE: &str = "/ipns";

/// Self-referential root prefix, replaced by the local identity.
pub const SELF_MARKER: &str = "/ipns/local";

/// Normalize a logical path to `/seg/seg`, or `/` for the root.
pub fn normalize(path: &str) -> DriverResult<String> {
    let mut out = String::with_capacity(path.len() + 1);
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(DriverError::invalid_path(path, "'..' segments are not allowed")),
            s => {
                out.push('/');
                out.push_str(s);
            }
        }
    }
    if out.is_empty() {
        out.push('/');
    }
    Ok(out)
}

/// Split a normalized store path into its parent and final segment.
///
/// The parent never carries a trailing separator: `/ipns/peer/a` splits into
/// `/ipns/peer` and `a`.
pub fn split(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("", path),
    }
}

/// Joins logical paths onto a qualified storage root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathResolver {
    root: String,
}

impl PathResolver {
    /// Build a resolver for an already-qualified root such as
    /// `/ipns/<name>/registry`.
    pub fn new(root: &str) -> DriverResult<Self> {
        let invalid = |reason: &str| DriverError::InvalidRoot {
            root: root.to_string(),
            reason: reason.to_string(),
        };
        if !root.starts_with('/') {
            return Err(invalid("root must be absolute"));
        }
        let normalized = normalize(root).map_err(|_| invalid("root must not contain '..'"))?;
        let name = normalized
            .strip_prefix(NAME_NAMESPACE)
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|rest| rest.split('/').next())
            .filter(|name| !name.is_empty());
        if name.is_none() {
            return Err(invalid("root must be a published name path under /ipns/"));
        }
        Ok(Self { root: normalized })
    }

    /// Build a resolver from a configured root, qualifying a self-referential
    /// root with the store's identity first.
    ///
    /// Issues at most one identity query.
    pub fn resolve<S: ContentStore + ?Sized>(root: &str, store: &S) -> DriverResult<Self> {
        let normalized = normalize(root).map_err(|_| DriverError::InvalidRoot {
            root: root.to_string(),
            reason: "root must not contain '..'".into(),
        })?;
        let rest = match normalized.strip_prefix(SELF_MARKER) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => return Self::new(root),
        };
        let identity = store.id().map_err(DriverError::IdentityResolution)?;
        if identity.id.is_empty() || identity.id.contains('/') {
            return Err(DriverError::InvalidRoot {
                root: root.to_string(),
                reason: format!("store reported unusable identity {:?}", identity.id),
            });
        }
        let qualified = format!("{NAME_NAMESPACE}/{}{rest}", identity.id);
        info!(configured = root, root = %qualified, "resolved self-referential root");
        Self::new(&qualified)
    }

    /// The qualified root, e.g. `/ipns/<name>/registry`.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// The published name the root lives under.
    pub fn published_name(&self) -> &str {
        self.root[NAME_NAMESPACE.len() + 1..]
            .split('/')
            .next()
            .unwrap_or_default()
    }

    /// Join a logical path onto the root.
    pub fn full_path(&self, path: &str) -> DriverResult<String> {
        let logical = normalize(path)?;
        if logical == "/" {
            Ok(self.root.clone())
        } else {
            Ok(format!("{}{logical}", self.root))
        }
    }

    /// True when `full_path` is the storage root itself.
    pub fn is_root(&self, full_path: &str) -> bool {
        full_path == self.root
    }

    /// Map a full store path back to its logical path.
    pub fn relative(&self, full_path: &str) -> Option<String> {
        let rest = full_path.strip_prefix(&self.root)?;
        if rest.is_empty() {
            Some("/".to_string())
        } else if rest.starts_with('/') {
            Some(rest.to_string())
        } else {
            None
        }
    }
}
