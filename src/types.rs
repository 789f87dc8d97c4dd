//! Core types for the in-memory tree.

use std::fmt;
use std::time::SystemTime;

/// The path separator used to tokenize paths.
pub const PATH_SEPARATOR: char = '/';

/// Component names that can never be used for a child.
pub const DISALLOWED_NAMES: [&str; 4] = [".", "..", "/", ""];

/// Stable handle to a node in a [`Tree`](crate::Tree).
///
/// Handles stay valid for as long as the node exists; once the node is freed
/// every operation through the handle fails with
/// [`FsError::InvalidNode`](crate::FsError::InvalidNode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of a node as seen by path resolution and sorting.
///
/// Links report the kind of the node they were created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    /// Leaf node owning content.
    File,
    /// Node owning an ordered set of children.
    Folder,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::File => f.write_str("file"),
            NodeKind::Folder => f.write_str("folder"),
        }
    }
}

/// Flavor of a link node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LinkKind {
    /// Direct reference to the target, independent of tree membership.
    Hard,
    /// Absolute path re-resolved on every access.
    Soft,
}

/// Snapshot of a node's attributes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metadata {
    /// Name of the node (empty for the root).
    pub name: String,
    /// Absolute path; folders end with the separator.
    pub path: String,
    /// File or folder (declared kind for links).
    pub kind: NodeKind,
    /// `Some` if the node is a link.
    pub link: Option<LinkKind>,
    /// Size in bytes. Folders report the sum of their children.
    pub size: u64,
    /// Last modification time (the target's for links).
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub last_modified: SystemTime,
}

impl Metadata {
    /// Returns `true` if this is a file or a link to one.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    /// Returns `true` if this is a folder or a link to one.
    #[inline]
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    /// Returns `true` if this is a link of either flavor.
    #[inline]
    pub fn is_link(&self) -> bool {
        self.link.is_some()
    }
}

/// A folder listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirEntry {
    /// Name of the entry.
    pub name: String,
    /// Full path to the entry.
    pub path: String,
    /// File or folder.
    pub kind: NodeKind,
    /// `Some` if the entry is a link.
    pub link: Option<LinkKind>,
    /// Size in bytes, `None` when the entry is a dangling link.
    pub size: Option<u64>,
}

/// Serde support for SystemTime (when serde feature is enabled).
#[cfg(feature = "serde")]
mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        (duration.as_secs(), duration.subsec_nanos()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (secs, nanos): (u64, u32) = Deserialize::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::new(secs, nanos))
    }
}
