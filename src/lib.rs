//! # memtree
//!
//! An **in-memory hierarchical file system**: a tree of folders and files
//! with path addressing, hard and soft links, copy/move, and streamed
//! content I/O, without touching a disk.
//!
//! ---
//!
//! ## Quick Start
//!
//! Most users only need [`FileSystem`] and the [`FsCommands`] verbs:
//!
//! ```rust
//! use memtree::{FileSystem, FsCommands, LinkKind};
//!
//! let mut fs = FileSystem::new();
//! fs.mkdir("/school/homework", true).unwrap();
//! fs.cd("/school/homework").unwrap();
//! fs.write_file("algebra.txt", "x = 4", false).unwrap();
//!
//! fs.ln("algebra.txt", "/", Some("latest"), LinkKind::Soft).unwrap();
//! assert_eq!(fs.read_file("/latest").unwrap(), "x = 4");
//!
//! fs.cp("*", "/", None).unwrap();
//! let names: Vec<_> = fs.ls("/").unwrap().into_iter().map(|e| e.name).collect();
//! assert_eq!(names, ["school", "algebra.txt", "latest"]);
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Tree`] | Arena of nodes: folder container, path resolver, links, copy/move |
//! | [`FileSystem`] | [`Tree`] plus a working folder, implementing [`FsCommands`] |
//! | [`NodeId`] | Stable handle to a node |
//! | [`FsError`] | Error type with context |
//! | [`Metadata`] / [`DirEntry`] | Attribute snapshots |
//! | [`ContentWriter`] / [`ContentReader`] | Streams over a file's bytes |
//! | [`TreeConfig`] / [`Clock`] | Tunables and time source |
//!
//! ---
//!
//! ## Path Grammar
//!
//! | Token | Meaning |
//! |-------|---------|
//! | leading `/` | absolute, resolved from the root |
//! | `.` or empty | current node |
//! | `..` | parent; stays put at the root |
//! | `*` | every child of the current folder (last component only) |
//!
//! Child names may not be `.`, `..`, `/`, empty, or contain `/`. Children
//! are kept sorted: folders first, then by numeric-aware name order
//! (`file2` before `file10`).
//!
//! ---
//!
//! ## Links
//!
//! - **Hard** links hold their target directly and keep it alive after it is
//!   removed from the tree.
//! - **Soft** links hold an absolute path and re-resolve it on every access.
//!   A soft link whose path no longer names exactly one node of the expected
//!   kind is *dangling*: accessing it fails with [`FsError::LinkDangling`],
//!   and [`DanglingReason`] says why.
//!
//! ---
//!
//! ## Error Handling
//!
//! All operations return [`FsResult`]. A failure never leaves the tree
//! half-changed: folder creation and copy/move stage their work detached
//! and attach it only once everything succeeded.
//!
//! ```rust
//! use memtree::{FileSystem, FsCommands, FsError};
//!
//! let mut fs = FileSystem::new();
//! let err = fs.mkdir("/a/b", false).unwrap_err();
//! assert!(matches!(err, FsError::NotFound { .. }));
//! assert_eq!(err.to_string(), "not found: /a");
//! ```
//!
//! ---
//!
//! ## Logging
//!
//! Mutations are reported through [`tracing`] at `debug` level, path
//! resolution at `trace`, and write-lock contention at `warn`. No subscriber
//! is installed by this crate.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Enable serialization for [`Metadata`], [`DirEntry`], [`TreeConfig`], etc., and `FsExtJson` |

// Private modules
mod clock;
mod commands;
mod config;
mod content;
mod copier;
mod error;
mod ext;
mod filesystem;
mod folder_builder;
mod link;
mod names;
mod node;
mod path_resolver;
mod tree;
mod types;

// Public re-exports - error types
pub use error::{DanglingReason, FsError, FsResult};

// Public re-exports - core types
pub use types::{DISALLOWED_NAMES, DirEntry, LinkKind, Metadata, NodeId, NodeKind, PATH_SEPARATOR};

// Public re-exports - tree and façade
pub use commands::FsCommands;
pub use filesystem::FileSystem;
pub use tree::Tree;

// Public re-exports - content streams
pub use content::{ContentReader, ContentWriter};

// Public re-exports - infrastructure
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DEFAULT_MAX_LINK_DEPTH, DEFAULT_READ_CHUNK_SIZE, TreeConfig};
pub use ext::FsExt;
pub use names::compare_names;

// Conditional re-exports
#[cfg(feature = "serde")]
pub use ext::FsExtJson;
