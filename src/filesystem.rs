//! # FileSystem
//!
//! [`Tree`] plus a working folder, implementing [`FsCommands`].
//!
//! ## Guards
//!
//! - The root folder can never be removed or moved.
//! - The working folder and its ancestors can never be removed or moved, so
//!   the working folder always stays attached to the tree.

use tracing::debug;

use crate::types::PATH_SEPARATOR;
use crate::{
    ContentReader, ContentWriter, DirEntry, FsCommands, FsError, FsResult, LinkKind, Metadata,
    NodeId, Tree,
};

/// A tree with a working folder for relative paths.
///
/// # Example
///
/// ```rust
/// use memtree::{FileSystem, FsCommands};
///
/// let mut fs = FileSystem::new();
/// fs.mkdir("school/homework", true).unwrap();
/// fs.cd("school/homework").unwrap();
/// assert_eq!(fs.pwd().unwrap(), "/school/homework/");
///
/// fs.write_file("algebra.txt", "x = 4", false).unwrap();
/// fs.mv("algebra.txt", "", Some("algebra2.txt")).unwrap();
/// assert_eq!(fs.read_file("/school/homework/algebra2.txt").unwrap(), "x = 4");
/// ```
#[derive(Debug)]
pub struct FileSystem {
    tree: Tree,
    working: NodeId,
}

impl FileSystem {
    /// Empty file system working in the root folder.
    pub fn new() -> Self {
        Self::with_tree(Tree::new())
    }

    /// Wrap an existing tree; the working folder starts at its root.
    pub fn with_tree(tree: Tree) -> Self {
        let working = tree.root();
        Self { tree, working }
    }

    /// The underlying tree.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Mutable access to the underlying tree.
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    /// The working folder.
    pub fn working(&self) -> NodeId {
        self.working
    }

    /// Consume the file system and return its tree.
    pub fn into_tree(self) -> Tree {
        self.tree
    }

    fn resolve(&self, path: &str) -> FsResult<Vec<NodeId>> {
        self.tree.resolve_path(path, self.working, self.tree.root())
    }

    fn resolve_one(&self, path: &str) -> FsResult<NodeId> {
        self.tree.resolve_single(path, self.working, self.tree.root())
    }

    fn resolve_some(&self, path: &str) -> FsResult<Vec<NodeId>> {
        let targets = self.resolve(path)?;
        if targets.is_empty() {
            return Err(FsError::NotFound {
                path: path.to_string(),
            });
        }
        Ok(targets)
    }

    /// Refuse targets whose removal would detach the root or the working folder.
    fn guard(&self, targets: &[NodeId], operation: &'static str) -> FsResult<()> {
        for &target in targets {
            if target == self.tree.root() {
                return Err(FsError::RootOperationDenied { operation });
            }
            if self.tree.is_within(self.working, target)? {
                return Err(FsError::WorkingFolderDenied {
                    path: self.tree.path(target)?,
                    operation,
                });
            }
        }
        Ok(())
    }

    /// Existing file at `path`, or a new one in its (existing) parent.
    fn file_for_write(&mut self, path: &str) -> FsResult<NodeId> {
        match self.resolve_one(path) {
            Ok(node) => Ok(node),
            Err(FsError::NotFound { .. }) => self.create_file_at(path),
            Err(e) => Err(e),
        }
    }

    fn create_file_at(&mut self, path: &str) -> FsResult<NodeId> {
        let (parent, name) = match path.rsplit_once(PATH_SEPARATOR) {
            Some(("", name)) => ("/", name),
            Some((parent, name)) => (parent, name),
            None => ("", path),
        };
        let parent = self.resolve_one(parent)?;
        let file = self.tree.create_file(name);
        if let Err(e) = self.tree.add_content(parent, file) {
            self.tree.discard(file);
            return Err(e);
        }
        debug!(path, "created file");
        Ok(file)
    }
}

impl Default for FileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FsCommands for FileSystem {
    fn pwd(&self) -> FsResult<String> {
        self.tree.path(self.working)
    }

    fn cd(&mut self, path: &str) -> FsResult<()> {
        let target = self.resolve_one(path)?;
        if !self.tree.is_folder(target)? {
            return Err(FsError::NotAFolder {
                path: self.tree.path(target)?,
            });
        }
        self.working = target;
        debug!(path, "changed working folder");
        Ok(())
    }

    fn ls(&self, path: &str) -> FsResult<Vec<DirEntry>> {
        let targets = self.resolve(path)?;
        match targets.as_slice() {
            [single] if self.tree.is_folder(*single)? => self.tree.entries(*single),
            _ => targets.iter().map(|&t| self.tree.entry(t)).collect(),
        }
    }

    fn mkdir(&mut self, path: &str, make_parents: bool) -> FsResult<()> {
        let root = self.tree.root();
        self.tree
            .build_folder(path, make_parents, self.working, root)
            .map(drop)
    }

    fn rm(&mut self, path: &str) -> FsResult<()> {
        let targets = self.resolve_some(path)?;
        self.guard(&targets, "rm")?;

        let mut removals = Vec::with_capacity(targets.len());
        for &target in &targets {
            if let Some(parent) = self.tree.parent(target)? {
                removals.push((parent, self.tree.name(target)?.to_string()));
            }
        }
        for (parent, name) in &removals {
            self.tree.remove_content(*parent, name)?;
        }
        debug!(path, count = removals.len(), "removed");
        Ok(())
    }

    fn cp(&mut self, source: &str, destination: &str, new_name: Option<&str>) -> FsResult<()> {
        let root = self.tree.root();
        self.tree
            .copy_path(source, destination, new_name, self.working, root)
            .map(drop)
    }

    fn mv(&mut self, source: &str, destination: &str, new_name: Option<&str>) -> FsResult<()> {
        let sources = self.resolve_some(source)?;
        self.guard(&sources, "mv")?;
        let root = self.tree.root();
        self.tree
            .move_path(source, destination, new_name, self.working, root)
            .map(drop)
    }

    fn ln(
        &mut self,
        source: &str,
        destination: &str,
        new_name: Option<&str>,
        kind: LinkKind,
    ) -> FsResult<()> {
        let root = self.tree.root();
        self.tree
            .build_link(source, destination, new_name, kind, self.working, root)
            .map(drop)
    }

    fn read_file(&self, path: &str) -> FsResult<String> {
        let file = self.resolve_one(path)?;
        self.tree.read_to_string(file)
    }

    fn write_file(&mut self, path: &str, text: &str, append: bool) -> FsResult<()> {
        let file = self.file_for_write(path)?;
        self.tree.write_bytes(file, text.as_bytes(), append)
    }

    fn open_read(&self, path: &str) -> FsResult<ContentReader> {
        let file = self.resolve_one(path)?;
        self.tree.reader(file)
    }

    fn open_write(&mut self, path: &str, append: bool) -> FsResult<ContentWriter> {
        let file = self.file_for_write(path)?;
        self.tree.writer(file, append)
    }

    fn find(&self, path: &str, name: &str) -> FsResult<Vec<String>> {
        let folder = self.resolve_one(path)?;
        self.tree
            .search(folder, name)?
            .into_iter()
            .map(|node| self.tree.path(node))
            .collect()
    }

    fn metadata(&self, path: &str) -> FsResult<Metadata> {
        let node = self.resolve_one(path)?;
        self.tree.metadata(node)
    }
}
