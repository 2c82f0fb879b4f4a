use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::hash::ContentHash;

/// The kind of object a link (or listing) refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkKind {
    /// Opaque byte content.
    File,
    /// A set of named links.
    Directory,
}

impl LinkKind {
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory)
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "File"),
            Self::Directory => write!(f, "Directory"),
        }
    }
}

impl FromStr for LinkKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "File" | "file" => Ok(Self::File),
            "Directory" | "directory" | "dir" => Ok(Self::Directory),
            other => Err(TypeError::UnknownLinkKind(other.to_string())),
        }
    }
}

/// A named edge embedded in a directory object.
///
/// Names are unique within one directory object. `size` is the cumulative
/// size of the referenced object as reported by the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub name: String,
    pub hash: ContentHash,
    pub size: u64,
    pub kind: LinkKind,
}

impl Link {
    pub fn new(name: impl Into<String>, hash: ContentHash, size: u64, kind: LinkKind) -> Self {
        Self {
            name: name.into(),
            hash,
            size,
            kind,
        }
    }
}

/// The resolved view of the object at a store path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectListing {
    /// Hash of the object the path resolved to.
    pub hash: ContentHash,
    pub kind: LinkKind,
    /// Content length for files. Not meaningful for directories.
    pub size: u64,
    /// Direct children. Always empty for files.
    pub links: Vec<Link>,
}

impl ObjectListing {
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Look up a direct child link by name.
    pub fn link(&self, name: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.name == name)
    }

    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.links.iter().map(|l| l.name.as_str())
    }
}
