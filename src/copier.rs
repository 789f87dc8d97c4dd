//! # Copy/Move Engine
//!
//! `copy_path` and `move_path` over resolved source sets.
//!
//! ## Phases
//!
//! 1. **Plan**: resolve the sources (one or more) and the destination
//!    folder (exactly one), validate the requested name.
//! 2. **Stage**: deep-copy every source into a detached node and pick its
//!    final name. A name that already exists in the destination, or was
//!    picked for an earlier source of the same call, gets the smallest free
//!    ` (n)` suffix.
//! 3. **Attach**: add the staged copies to the destination.
//! 4. **Remove** (move only): detach the originals once every copy is placed.
//!
//! A failure in phases 1 to 3 leaves the visible tree as it was.

use tracing::{debug, warn};

use crate::names::validate_name;
use crate::node::NodeData;
use crate::{FsError, FsResult, NodeId, Tree};

struct Staged {
    copies: Vec<NodeId>,
    names: Vec<String>,
}

impl Tree {
    /// Copy the node(s) at `source` into the folder at `destination`.
    ///
    /// Folders are copied recursively. Files get an independent copy of their
    /// content. Links are copied as new links of the same flavor aimed at what
    /// the original resolves to now. `new_name` renames a single source.
    ///
    /// Returns the placed copies in source order.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if `source` resolves to nothing
    /// - [`FsError::InvalidPath`] if `destination` does not resolve to exactly one node
    /// - [`FsError::NotAFolder`] if the destination is not a folder
    /// - [`FsError::NameConflict`] if `new_name` is given for several sources
    /// - [`FsError::LinkDangling`] if a soft link among the sources is broken
    ///
    /// # Example
    ///
    /// ```rust
    /// use memtree::Tree;
    ///
    /// let mut tree = Tree::new();
    /// let root = tree.root();
    /// let src = tree.build_folder("/src", false, root, root).unwrap();
    /// tree.build_folder("/dst", false, root, root).unwrap();
    /// let file = tree.create_file("a.txt");
    /// tree.add_content(src, file).unwrap();
    ///
    /// tree.copy_path("/src/a.txt", "/dst", None, root, root).unwrap();
    /// let again = tree.copy_path("/src/a.txt", "/dst", None, root, root).unwrap();
    /// assert_eq!(tree.path(again[0]).unwrap(), "/dst/a.txt (1)");
    /// ```
    pub fn copy_path(
        &mut self,
        source: &str,
        destination: &str,
        new_name: Option<&str>,
        working: NodeId,
        root: NodeId,
    ) -> FsResult<Vec<NodeId>> {
        let (sources, folder) =
            self.plan_transfer(source, destination, new_name, working, root, "copy")?;
        let placed = self.transfer(&sources, folder, new_name)?;
        debug!(source, destination, count = placed.len(), "copied");
        Ok(placed)
    }

    /// Move the node(s) at `source` into the folder at `destination`.
    ///
    /// Performs a full [`copy_path`](Self::copy_path) first and removes the
    /// originals only after every copy is placed.
    ///
    /// # Errors
    ///
    /// Everything [`copy_path`](Self::copy_path) reports, plus:
    ///
    /// - [`FsError::RootOperationDenied`] if a source is the root
    /// - [`FsError::InvalidPath`] if the destination lies inside a source
    pub fn move_path(
        &mut self,
        source: &str,
        destination: &str,
        new_name: Option<&str>,
        working: NodeId,
        root: NodeId,
    ) -> FsResult<Vec<NodeId>> {
        let (sources, folder) =
            self.plan_transfer(source, destination, new_name, working, root, "move")?;
        for &node in &sources {
            if node == self.root() || node == root {
                return Err(FsError::RootOperationDenied { operation: "move" });
            }
            if self.is_within(folder, node)? {
                return Err(FsError::InvalidPath {
                    path: self.path(node)?,
                    reason: format!("cannot move into itself ({})", self.path(folder)?),
                });
            }
        }

        let placed = self.transfer(&sources, folder, new_name)?;
        for &node in &sources {
            if let Some(parent) = self.parent(node)? {
                let name = self.name(node)?.to_string();
                self.remove_content(parent, &name)?;
            }
        }
        debug!(source, destination, count = placed.len(), "moved");
        Ok(placed)
    }

    fn plan_transfer(
        &self,
        source: &str,
        destination: &str,
        new_name: Option<&str>,
        working: NodeId,
        root: NodeId,
        operation: &'static str,
    ) -> FsResult<(Vec<NodeId>, NodeId)> {
        let sources = self.resolve_path(source, working, root)?;
        if sources.is_empty() {
            return Err(FsError::NotFound {
                path: source.to_string(),
            });
        }
        let target = self.resolve_single(destination, working, root)?;
        let folder = self.folder_target(target, 0)?;
        if let Some(name) = new_name {
            if sources.len() > 1 {
                return Err(FsError::NameConflict {
                    name: name.to_string(),
                    folder: self.path(folder)?,
                    operation,
                });
            }
            validate_name(name)?;
        }
        Ok((sources, folder))
    }

    fn transfer(
        &mut self,
        sources: &[NodeId],
        folder: NodeId,
        new_name: Option<&str>,
    ) -> FsResult<Vec<NodeId>> {
        let mut staged = Staged {
            copies: Vec::with_capacity(sources.len()),
            names: Vec::with_capacity(sources.len()),
        };
        if let Err(e) = self.stage(sources, folder, new_name, &mut staged) {
            for copy in staged.copies {
                self.discard(copy);
            }
            return Err(e);
        }

        for (index, &copy) in staged.copies.iter().enumerate() {
            if let Err(e) = self.add_content(folder, copy) {
                for name in &staged.names[..index] {
                    // just attached by this call
                    if let Err(rollback) = self.remove_content(folder, name) {
                        warn!(name = %name, error = %rollback, "failed to roll back copy");
                    }
                }
                for &rest in &staged.copies[index..] {
                    self.discard(rest);
                }
                return Err(e);
            }
        }
        Ok(staged.copies)
    }

    fn stage(
        &mut self,
        sources: &[NodeId],
        folder: NodeId,
        new_name: Option<&str>,
        staged: &mut Staged,
    ) -> FsResult<()> {
        for &source in sources {
            let base = match new_name {
                Some(name) => name.to_string(),
                None => self.name(source)?.to_string(),
            };
            let copy = self.copy_node(source)?;
            staged.copies.push(copy);
            let name = self.unique_name(folder, &base, &staged.names)?;
            self.rename_detached(copy, name.clone())?;
            staged.names.push(name);
        }
        Ok(())
    }

    /// Detached deep copy of `id`.
    fn copy_node(&mut self, id: NodeId) -> FsResult<NodeId> {
        let node = self.node(id)?;
        let children = match &node.data {
            NodeData::File(_) => return self.duplicate_file(id),
            NodeData::Link(_) => return self.copy_link(id),
            NodeData::Folder(children) => children.clone(),
        };
        let name = node.name.clone();
        let copy = self.create_folder(name);
        for child in children {
            let child_copy = match self.copy_node(child) {
                Ok(child_copy) => child_copy,
                Err(e) => {
                    self.discard(copy);
                    return Err(e);
                }
            };
            if let Err(e) = self.add_content(copy, child_copy) {
                self.discard(child_copy);
                self.discard(copy);
                return Err(e);
            }
        }
        Ok(copy)
    }

    /// `base`, or `base (n)` with the smallest `n` not taken in `folder` or
    /// by `planned`.
    fn unique_name(&self, folder: NodeId, base: &str, planned: &[String]) -> FsResult<String> {
        let taken = |name: &str| -> FsResult<bool> {
            Ok(planned.iter().any(|p| p == name) || self.find_in(folder, name)?.is_some())
        };
        if !taken(base)? {
            return Ok(base.to_string());
        }
        let mut n: u64 = 1;
        loop {
            let candidate = format!("{base} ({n})");
            if !taken(&candidate)? {
                return Ok(candidate);
            }
            n += 1;
        }
    }
}
