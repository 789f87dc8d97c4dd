//! Error types for the in-memory tree.

use crate::{NodeId, NodeKind};

/// Shorthand for results produced by this crate.
pub type FsResult<T> = Result<T, FsError>;

/// Tree error type with contextual variants.
///
/// Every failure is a hard stop for the call that produced it; the tree stays
/// usable afterwards. Uses `#[non_exhaustive]` for forward compatibility.
///
/// # Examples
///
/// ```rust
/// use memtree::FsError;
///
/// let err = FsError::NotFound { path: "/missing".into() };
/// assert_eq!(err.to_string(), "not found: /missing");
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    // Naming
    /// Name is reserved (`.`, `..`, `/`, empty) or contains the separator.
    #[error("invalid name: {name:?}")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// A child with this name already exists in the folder.
    #[error("{operation}: name conflict: {name} already exists in {folder}")]
    NameConflict {
        /// The conflicting name.
        name: String,
        /// Path of the folder holding the existing child.
        folder: String,
        /// The operation that failed.
        operation: &'static str,
    },

    // Resolution
    /// A path component does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The path (or component) that was not found.
        path: String,
    },

    /// Traversal or a destination expected a folder.
    #[error("not a folder: {path}")]
    NotAFolder {
        /// The path that is not a folder.
        path: String,
    },

    /// Content access expected a file.
    #[error("not a file: {path}")]
    NotAFile {
        /// The path that is not a file.
        path: String,
    },

    /// Malformed wildcard placement or ambiguous resolution.
    #[error("invalid path: {path} ({reason})")]
    InvalidPath {
        /// The offending path.
        path: String,
        /// Why the path was rejected.
        reason: String,
    },

    // Links
    /// Soft link target is missing, ambiguous, or of the wrong kind.
    #[error("dangling link {link} -> {target}: {reason}")]
    LinkDangling {
        /// Path of the link node.
        link: String,
        /// The absolute path the link points at.
        target: String,
        /// What went wrong while resolving the target.
        #[source]
        reason: DanglingReason,
    },

    /// Link indirection exceeded the configured hop limit.
    #[error("too many levels of links: {path} (limit {limit})")]
    LinkLoop {
        /// The path being resolved when the limit was hit.
        path: String,
        /// The configured limit.
        limit: usize,
    },

    // Content
    /// A writable stream is already open on this content.
    #[error("content locked: {path}")]
    ContentLocked {
        /// Path of the locked file.
        path: String,
    },

    /// Content could not be interpreted as requested.
    #[error("invalid data: {path} ({details})")]
    InvalidData {
        /// Path of the file.
        path: String,
        /// Details about the invalid data.
        details: String,
    },

    // Guards
    /// The root folder cannot be removed or moved.
    #[error("{operation}: operation denied on root folder")]
    RootOperationDenied {
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// The working folder (or one of its ancestors) cannot be removed or moved.
    #[error("{operation}: operation denied on working folder: {path}")]
    WorkingFolderDenied {
        /// Path of the protected folder.
        path: String,
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// Node handle refers to a node that no longer exists.
    #[error("invalid node: {id}")]
    InvalidNode {
        /// The stale handle.
        id: NodeId,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

/// Why a soft link could not be resolved.
#[derive(Debug, thiserror::Error)]
pub enum DanglingReason {
    /// The target path failed to resolve.
    #[error("target does not resolve")]
    Unresolvable(#[source] Box<FsError>),

    /// The target path resolved to more than one node.
    #[error("target resolves to {matches} nodes")]
    Ambiguous {
        /// Number of nodes the path resolved to.
        matches: usize,
    },

    /// The target resolved to a node of the other kind.
    #[error("target is not a {expected}")]
    KindMismatch {
        /// The kind recorded when the link was created.
        expected: NodeKind,
    },
}

impl From<FsError> for std::io::Error {
    fn from(error: FsError) -> Self {
        let kind = match &error {
            FsError::NotFound { .. } => std::io::ErrorKind::NotFound,
            FsError::ContentLocked { .. } => std::io::ErrorKind::WouldBlock,
            FsError::NameConflict { .. } => std::io::ErrorKind::AlreadyExists,
            FsError::InvalidData { .. } => std::io::ErrorKind::InvalidData,
            FsError::InvalidName { .. } | FsError::InvalidPath { .. } => {
                std::io::ErrorKind::InvalidInput
            }
            _ => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, error)
    }
}
