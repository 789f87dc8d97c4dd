//! # FsCommands Trait
//!
//! Shell-style verbs over a tree with a working folder.
//!
//! ## Responsibility
//! - Define the user-facing operations (`pwd`, `cd`, `ls`, `mkdir`, `rm`,
//!   `cp`, `mv`, `ln`, file I/O, `find`, `metadata`)
//! - Every path argument is absolute (leading `/`) or relative to the
//!   working folder
//!
//! ## Implementors
//! - [`FileSystem`](crate::FileSystem)

use crate::{ContentReader, ContentWriter, DirEntry, FsResult, LinkKind, Metadata};

/// Path-addressed operations on an in-memory tree.
///
/// Mutating verbs take `&mut self`; the tree has a single owner and no
/// interior locking beyond the per-file write lock.
///
/// # Example
///
/// ```rust
/// use memtree::{FileSystem, FsCommands};
///
/// fn archive<F: FsCommands>(fs: &mut F) -> Result<(), memtree::FsError> {
///     fs.mkdir("/archive/2024", true)?;
///     fs.cp("/report.txt", "/archive/2024", None)?;
///     Ok(())
/// }
///
/// let mut fs = FileSystem::new();
/// fs.write_file("/report.txt", "q4", false).unwrap();
/// archive(&mut fs).unwrap();
/// assert_eq!(fs.read_file("/archive/2024/report.txt").unwrap(), "q4");
/// ```
pub trait FsCommands {
    /// Absolute path of the working folder.
    fn pwd(&self) -> FsResult<String>;

    /// Change the working folder.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidPath`](crate::FsError::InvalidPath) if the path does not name exactly one node
    /// - [`FsError::NotAFolder`](crate::FsError::NotAFolder) if that node is not a folder
    fn cd(&mut self, path: &str) -> FsResult<()>;

    /// List a folder's children, or describe the node(s) the path names.
    ///
    /// An empty path lists the working folder.
    fn ls(&self, path: &str) -> FsResult<Vec<DirEntry>>;

    /// Create a folder, and its missing parents with `make_parents`.
    fn mkdir(&mut self, path: &str, make_parents: bool) -> FsResult<()>;

    /// Remove the node(s) at `path`.
    ///
    /// Every target is checked before anything is removed.
    ///
    /// # Errors
    ///
    /// - [`FsError::RootOperationDenied`](crate::FsError::RootOperationDenied) for the root folder
    /// - [`FsError::WorkingFolderDenied`](crate::FsError::WorkingFolderDenied) for the working folder or an ancestor of it
    fn rm(&mut self, path: &str) -> FsResult<()>;

    /// Copy the node(s) at `source` into the folder at `destination`.
    fn cp(&mut self, source: &str, destination: &str, new_name: Option<&str>) -> FsResult<()>;

    /// Move the node(s) at `source` into the folder at `destination`.
    ///
    /// Refuses to move the working folder or an ancestor of it.
    fn mv(&mut self, source: &str, destination: &str, new_name: Option<&str>) -> FsResult<()>;

    /// Create a hard or soft link to `source` inside `destination`.
    fn ln(
        &mut self,
        source: &str,
        destination: &str,
        new_name: Option<&str>,
        kind: LinkKind,
    ) -> FsResult<()>;

    /// Read a whole file as UTF-8.
    fn read_file(&self, path: &str) -> FsResult<String>;

    /// Replace (or extend, with `append`) a file's content.
    ///
    /// The file is created if its parent folder exists and it does not.
    fn write_file(&mut self, path: &str, text: &str, append: bool) -> FsResult<()>;

    /// Open a readable stream over a snapshot of a file's content.
    fn open_read(&self, path: &str) -> FsResult<ContentReader>;

    /// Open a writable stream on a file, creating it like
    /// [`write_file`](Self::write_file).
    ///
    /// The file stays locked until the writer is closed or dropped.
    fn open_write(&mut self, path: &str, append: bool) -> FsResult<ContentWriter>;

    /// Absolute paths of every node named `name` beneath the folder at `path`.
    fn find(&self, path: &str, name: &str) -> FsResult<Vec<String>>;

    /// Attributes of the single node at `path`.
    fn metadata(&self, path: &str) -> FsResult<Metadata>;
}
