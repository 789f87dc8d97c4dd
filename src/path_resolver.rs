//! # Path Resolver
//!
//! Turns a path string into the node(s) it names.
//!
//! ## Grammar
//!
//! | Token | Meaning |
//! |-------|---------|
//! | leading `/` | start at the root folder instead of the working folder |
//! | empty, `.` | stay at the current node |
//! | `..` | move to the parent; a no-op at the root |
//! | `*` | every child of the current folder; final position only |
//! | anything else | the child with exactly that name |
//!
//! Link nodes are transparent for traversal: `/link/child` finds `child` in
//! the link's target. The final token is not followed, so resolving `/link`
//! yields the link node itself.

use tracing::trace;

use crate::types::PATH_SEPARATOR;
use crate::{FsError, FsResult, NodeId, NodeKind, Tree};

impl Tree {
    /// Resolve `path` against `working` (relative paths) or `root` (absolute
    /// paths).
    ///
    /// Returns one node, or every child of a folder for a trailing `*`, in
    /// folder sort order.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if a named component is absent
    /// - [`FsError::NotAFolder`] if a component other than the last is not a folder
    /// - [`FsError::InvalidPath`] if `*` is not the final token
    /// - [`FsError::LinkDangling`] / [`FsError::LinkLoop`] from links along the way
    ///
    /// # Example
    ///
    /// ```rust
    /// use memtree::Tree;
    ///
    /// let mut tree = Tree::new();
    /// let root = tree.root();
    /// let drafts = tree.build_folder("/docs/drafts", true, root, root).unwrap();
    ///
    /// assert_eq!(tree.resolve_path("/docs/drafts", root, root).unwrap(), vec![drafts]);
    /// assert_eq!(tree.resolve_path("../..", drafts, root).unwrap(), vec![root]);
    /// assert_eq!(tree.resolve_path("/docs/*", root, root).unwrap(), vec![drafts]);
    /// assert!(tree.resolve_path("/*/drafts", root, root).is_err());
    /// ```
    pub fn resolve_path(&self, path: &str, working: NodeId, root: NodeId) -> FsResult<Vec<NodeId>> {
        self.resolve_from(path, working, root, 0)
    }

    /// Resolution with the link hop count of an enclosing soft-link lookup.
    pub(crate) fn resolve_from(
        &self,
        path: &str,
        working: NodeId,
        root: NodeId,
        depth: usize,
    ) -> FsResult<Vec<NodeId>> {
        let mut current = if path.starts_with(PATH_SEPARATOR) {
            root
        } else {
            working
        };
        self.node(current)?;

        let mut tokens = path.split(PATH_SEPARATOR).peekable();
        while let Some(token) = tokens.next() {
            match token {
                "" | "." => {}
                ".." => {
                    if self.kind(current)? != NodeKind::Folder {
                        return Err(FsError::NotAFolder {
                            path: self.path(current)?,
                        });
                    }
                    if current != root {
                        if let Some(parent) = self.parent(current)? {
                            current = parent;
                        }
                    }
                }
                "*" => {
                    if tokens.peek().is_some() {
                        return Err(FsError::InvalidPath {
                            path: path.to_string(),
                            reason: "wildcard must be the last component".into(),
                        });
                    }
                    let folder = self.folder_target(current, depth)?;
                    let matches = self.child_ids(folder)?.to_vec();
                    trace!(path, matches = matches.len(), "expanded wildcard");
                    return Ok(matches);
                }
                name => {
                    let folder = self.folder_target(current, depth)?;
                    current = match self.find_in(folder, name)? {
                        Some(child) => child,
                        None => {
                            return Err(FsError::NotFound {
                                path: format!("{}{}", self.path(folder)?, name),
                            });
                        }
                    };
                }
            }
        }
        trace!(path, node = %current, "resolved path");
        Ok(vec![current])
    }
}
