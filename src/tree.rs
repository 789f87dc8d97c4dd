//! # Tree
//!
//! Arena of nodes addressed by [`NodeId`], plus the folder container
//! operations (`add_content`, `remove_content`, `find_child`, sorted views).
//!
//! ## Ownership
//!
//! A folder owns its children. Removing a child frees it and its subtree,
//! except for nodes still targeted by a hard link: those stay alive, detached
//! from the tree, until the last hard link to them is freed. Hard links that
//! only point back into an unreachable subtree do not keep it alive.
//!
//! ## Links
//!
//! Read-only queries on a link (size, content, children, `last_modified`)
//! are answered by its target. See [`Tree::resolve_link`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::content::{ContentReader, ContentStore, ContentWriter};
use crate::names::{compare_entries, validate_name};
use crate::node::{Link, LinkTarget, Node, NodeData};
use crate::{DirEntry, FsError, FsResult, LinkKind, Metadata, NodeId, NodeKind, TreeConfig};

/// In-memory hierarchical file tree.
///
/// # Example
///
/// ```rust
/// use memtree::Tree;
///
/// let mut tree = Tree::new();
/// let root = tree.root();
/// let docs = tree.create_folder("docs");
/// tree.add_content(root, docs).unwrap();
///
/// assert_eq!(tree.find_child(root, "docs").unwrap(), Some(docs));
/// assert_eq!(tree.path(docs).unwrap(), "/docs/");
/// ```
pub struct Tree {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
    clock: Arc<dyn Clock>,
    config: TreeConfig,
}

impl Tree {
    /// Create an empty tree using the system clock and default config.
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default(), SystemClock)
    }

    /// Create an empty tree stamping times with `clock`.
    pub fn with_clock<C: Clock + 'static>(clock: C) -> Self {
        Self::with_config(TreeConfig::default(), clock)
    }

    /// Create an empty tree with explicit config and clock.
    pub fn with_config<C: Clock + 'static>(config: TreeConfig, clock: C) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(clock);
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                name: String::new(),
                parent: None,
                last_modified: clock.now(),
                hard_links: 0,
                data: NodeData::Folder(Vec::new()),
            },
        );
        Self {
            nodes,
            root,
            next_id: 1,
            clock,
            config,
        }
    }

    /// The root folder.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Active configuration.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Returns `true` if `id` still refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub(crate) fn node(&self, id: NodeId) -> FsResult<&Node> {
        self.nodes.get(&id).ok_or(FsError::InvalidNode { id })
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> FsResult<&mut Node> {
        self.nodes.get_mut(&id).ok_or(FsError::InvalidNode { id })
    }

    // ------------------------------------------------------------------
    // Node construction (detached)
    // ------------------------------------------------------------------

    fn alloc(&mut self, name: String, data: NodeData) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let last_modified = self.clock.now();
        self.nodes.insert(
            id,
            Node {
                name,
                parent: None,
                last_modified,
                hard_links: 0,
                data,
            },
        );
        id
    }

    /// Allocate a detached, empty file. Attach it with [`add_content`](Self::add_content).
    pub fn create_file(&mut self, name: impl Into<String>) -> NodeId {
        let content = ContentStore::new(Arc::clone(&self.clock));
        self.alloc(name.into(), NodeData::File(content))
    }

    /// Allocate a detached, empty folder. Attach it with [`add_content`](Self::add_content).
    pub fn create_folder(&mut self, name: impl Into<String>) -> NodeId {
        self.alloc(name.into(), NodeData::Folder(Vec::new()))
    }

    pub(crate) fn create_link(&mut self, name: String, kind: NodeKind, target: LinkTarget) -> NodeId {
        if let LinkTarget::Hard(target) = &target {
            if let Some(node) = self.nodes.get_mut(target) {
                node.hard_links += 1;
            }
        }
        self.alloc(name, NodeData::Link(Link { kind, target }))
    }

    pub(crate) fn duplicate_file(&mut self, id: NodeId) -> FsResult<NodeId> {
        let node = self.node(id)?;
        let NodeData::File(content) = &node.data else {
            return Err(FsError::NotAFile {
                path: self.path(id)?,
            });
        };
        let content = content.duplicate();
        let name = node.name.clone();
        Ok(self.alloc(name, NodeData::File(content)))
    }

    /// Rename a detached node. Attached nodes keep their name so the sort
    /// invariant of their parent holds.
    pub(crate) fn rename_detached(&mut self, id: NodeId, name: String) -> FsResult<()> {
        let node = self.node_mut(id)?;
        debug_assert!(node.parent.is_none());
        node.name = name;
        Ok(())
    }

    /// Free a detached node that was never attached (or was staged and abandoned).
    pub(crate) fn discard(&mut self, id: NodeId) {
        if self.release(id) {
            self.collect_unreachable();
        }
    }

    /// Free a detached node and its subtree. Returns `true` if some node was
    /// kept alive by a hard link.
    fn release(&mut self, id: NodeId) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        if id == self.root || node.parent.is_some() {
            return false;
        }
        if node.hard_links > 0 {
            return true;
        }
        let Some(node) = self.nodes.remove(&id) else {
            return false;
        };
        trace!(%id, name = %node.name, "freed node");
        match node.data {
            NodeData::Folder(children) => {
                let mut pinned = false;
                for child in children {
                    if let Some(child_node) = self.nodes.get_mut(&child) {
                        child_node.parent = None;
                    }
                    pinned |= self.release(child);
                }
                pinned
            }
            NodeData::Link(Link {
                target: LinkTarget::Hard(target),
                ..
            }) => {
                if let Some(target_node) = self.nodes.get_mut(&target) {
                    target_node.hard_links = target_node.hard_links.saturating_sub(1);
                }
                self.release(target)
            }
            _ => false,
        }
    }

    /// Free detached nodes kept alive only by hard links from other
    /// unreachable nodes, such as a folder holding a hard link to itself.
    ///
    /// Live nodes are those reachable from the root or from a detached node
    /// no hard link points at, following children and hard link targets.
    fn collect_unreachable(&mut self) {
        let mut stack: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(id, node)| {
                **id == self.root || (node.parent.is_none() && node.hard_links == 0)
            })
            .map(|(id, _)| *id)
            .collect();
        let mut live = HashSet::with_capacity(self.nodes.len());
        while let Some(id) = stack.pop() {
            if !live.insert(id) {
                continue;
            }
            match self.nodes.get(&id).map(|node| &node.data) {
                Some(NodeData::Folder(children)) => stack.extend(children.iter().copied()),
                Some(NodeData::Link(Link {
                    target: LinkTarget::Hard(target),
                    ..
                })) => stack.push(*target),
                _ => {}
            }
        }
        if live.len() == self.nodes.len() {
            return;
        }

        let dead: Vec<NodeId> = self
            .nodes
            .keys()
            .filter(|id| !live.contains(*id))
            .copied()
            .collect();
        for id in dead {
            let Some(node) = self.nodes.remove(&id) else {
                continue;
            };
            trace!(%id, name = %node.name, "freed unreachable node");
            if let NodeData::Link(Link {
                target: LinkTarget::Hard(target),
                ..
            }) = node.data
            {
                if let Some(target_node) = self.nodes.get_mut(&target) {
                    target_node.hard_links = target_node.hard_links.saturating_sub(1);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    /// Name of the node (empty for the root).
    pub fn name(&self, id: NodeId) -> FsResult<&str> {
        Ok(&self.node(id)?.name)
    }

    /// Parent folder, `None` for the root and for detached nodes.
    pub fn parent(&self, id: NodeId) -> FsResult<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    /// File or folder. Links report the kind they were created for.
    pub fn kind(&self, id: NodeId) -> FsResult<NodeKind> {
        Ok(self.node(id)?.kind())
    }

    /// Returns `true` for folders and links to folders.
    pub fn is_folder(&self, id: NodeId) -> FsResult<bool> {
        Ok(self.kind(id)? == NodeKind::Folder)
    }

    /// Returns `true` for link nodes of either flavor.
    pub fn is_link(&self, id: NodeId) -> FsResult<bool> {
        Ok(self.node(id)?.link_kind().is_some())
    }

    /// Link flavor, `None` if the node is not a link.
    pub fn link_kind(&self, id: NodeId) -> FsResult<Option<LinkKind>> {
        Ok(self.node(id)?.link_kind())
    }

    /// Absolute path derived from the parent chain.
    ///
    /// The root is `/`, folders end with `/`, files do not. A detached node's
    /// path starts at its topmost detached ancestor and is not resolvable.
    pub fn path(&self, id: NodeId) -> FsResult<String> {
        if id == self.root {
            return Ok("/".to_string());
        }
        let node = self.node(id)?;
        let mut path = match node.parent {
            Some(parent) => self.path(parent)?,
            None => String::new(),
        };
        path.push_str(&node.name);
        if node.kind() == NodeKind::Folder {
            path.push('/');
        }
        Ok(path)
    }

    /// Last modification time; links report their target's.
    pub fn last_modified(&self, id: NodeId) -> FsResult<SystemTime> {
        let target = self.resolve_link(id)?;
        let node = self.node(target)?;
        Ok(match &node.data {
            NodeData::File(content) => content.last_modified(),
            _ => node.last_modified,
        })
    }

    /// Size in bytes.
    ///
    /// Files report their content length, folders the sum of their children,
    /// links their target's size. Inside a folder total, children whose size
    /// cannot be computed because of a dangling or looping link count as zero.
    pub fn size(&self, id: NodeId) -> FsResult<u64> {
        self.size_inner(id, &mut Vec::new())
    }

    fn size_inner(&self, id: NodeId, visiting: &mut Vec<NodeId>) -> FsResult<u64> {
        let target = self.resolve_link(id)?;
        match &self.node(target)?.data {
            NodeData::File(content) => Ok(content.len()),
            NodeData::Folder(children) => {
                if visiting.contains(&target) {
                    return Err(FsError::LinkLoop {
                        path: self.path(id)?,
                        limit: self.config.max_link_depth,
                    });
                }
                visiting.push(target);
                let mut total = 0;
                for &child in children {
                    total += match self.size_inner(child, visiting) {
                        Ok(size) => size,
                        Err(FsError::LinkDangling { .. } | FsError::LinkLoop { .. }) => 0,
                        Err(e) => {
                            visiting.pop();
                            return Err(e);
                        }
                    };
                }
                visiting.pop();
                Ok(total)
            }
            // resolve_link never stops on a link
            NodeData::Link(_) => Ok(0),
        }
    }

    /// Snapshot of the node's attributes.
    pub fn metadata(&self, id: NodeId) -> FsResult<Metadata> {
        let node = self.node(id)?;
        Ok(Metadata {
            name: node.name.clone(),
            path: self.path(id)?,
            kind: node.kind(),
            link: node.link_kind(),
            size: self.size(id)?,
            last_modified: self.last_modified(id)?,
        })
    }

    // ------------------------------------------------------------------
    // Folder container
    // ------------------------------------------------------------------

    /// Folder whose children `id` exposes: the folder itself, or a link's
    /// target. Fails with `NotAFolder` for files and file links.
    pub(crate) fn folder_target(&self, id: NodeId, depth: usize) -> FsResult<NodeId> {
        if self.kind(id)? != NodeKind::Folder {
            return Err(FsError::NotAFolder {
                path: self.path(id)?,
            });
        }
        let target = self.follow_links(id, depth)?;
        if !matches!(self.node(target)?.data, NodeData::Folder(_)) {
            return Err(FsError::NotAFolder {
                path: self.path(id)?,
            });
        }
        Ok(target)
    }

    pub(crate) fn child_ids(&self, folder: NodeId) -> FsResult<&[NodeId]> {
        match &self.node(folder)?.data {
            NodeData::Folder(children) => Ok(children),
            _ => Err(FsError::NotAFolder {
                path: self.path(folder)?,
            }),
        }
    }

    pub(crate) fn find_in(&self, folder: NodeId, name: &str) -> FsResult<Option<NodeId>> {
        for &child in self.child_ids(folder)? {
            if self.node(child)?.name == name {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    /// Look up a direct child by exact name.
    pub fn find_child(&self, folder: NodeId, name: &str) -> FsResult<Option<NodeId>> {
        let folder = self.folder_target(folder, 0)?;
        self.find_in(folder, name)
    }

    /// All children, folders first, each group in name order.
    pub fn children(&self, folder: NodeId) -> FsResult<Vec<NodeId>> {
        let folder = self.folder_target(folder, 0)?;
        Ok(self.child_ids(folder)?.to_vec())
    }

    /// Child folders (including folder links) in name order.
    pub fn folders(&self, folder: NodeId) -> FsResult<Vec<NodeId>> {
        self.children_of_kind(folder, NodeKind::Folder)
    }

    /// Child files (including file links) in name order.
    pub fn files(&self, folder: NodeId) -> FsResult<Vec<NodeId>> {
        self.children_of_kind(folder, NodeKind::File)
    }

    fn children_of_kind(&self, folder: NodeId, kind: NodeKind) -> FsResult<Vec<NodeId>> {
        let mut out = Vec::new();
        for child in self.children(folder)? {
            if self.kind(child)? == kind {
                out.push(child);
            }
        }
        Ok(out)
    }

    /// Listing entries for every child, in sort order.
    pub fn entries(&self, folder: NodeId) -> FsResult<Vec<DirEntry>> {
        self.children(folder)?
            .into_iter()
            .map(|child| self.entry(child))
            .collect()
    }

    pub(crate) fn entry(&self, id: NodeId) -> FsResult<DirEntry> {
        let node = self.node(id)?;
        Ok(DirEntry {
            name: node.name.clone(),
            path: self.path(id)?,
            kind: node.kind(),
            link: node.link_kind(),
            size: self.size(id).ok(),
        })
    }

    /// Every descendant named `name`, in pre-order. Links are reported but
    /// not descended into.
    pub fn search(&self, folder: NodeId, name: &str) -> FsResult<Vec<NodeId>> {
        let folder = self.folder_target(folder, 0)?;
        let mut found = Vec::new();
        self.search_into(folder, name, &mut found)?;
        Ok(found)
    }

    fn search_into(&self, folder: NodeId, name: &str, found: &mut Vec<NodeId>) -> FsResult<()> {
        for &child in self.child_ids(folder)? {
            let node = self.node(child)?;
            if node.name == name {
                found.push(child);
            }
            if matches!(node.data, NodeData::Folder(_)) {
                self.search_into(child, name, found)?;
            }
        }
        Ok(())
    }

    /// Returns `true` if `id` is `ancestor` or lies beneath it.
    pub(crate) fn is_within(&self, id: NodeId, ancestor: NodeId) -> FsResult<bool> {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return Ok(true);
            }
            current = self.node(node)?.parent;
        }
        Ok(false)
    }

    /// Attach a detached node to a folder (or a folder link's target).
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidName`] if the child's name is reserved or contains `/`
    /// - [`FsError::NameConflict`] if the folder already has a child with that name
    /// - [`FsError::NotAFolder`] if `folder` is not a folder
    /// - [`FsError::InvalidPath`] if the child is already attached or is an
    ///   ancestor of `folder`
    pub fn add_content(&mut self, folder: NodeId, child: NodeId) -> FsResult<()> {
        let folder = self.folder_target(folder, 0)?;
        let child_node = self.node(child)?;
        validate_name(&child_node.name)?;
        if child == self.root || child_node.parent.is_some() {
            return Err(FsError::InvalidPath {
                path: self.path(child)?,
                reason: "node is already attached".into(),
            });
        }
        if self.is_within(folder, child)? {
            return Err(FsError::InvalidPath {
                path: self.path(folder)?,
                reason: "cannot add a folder beneath itself".into(),
            });
        }
        let name = child_node.name.clone();
        let kind = child_node.kind();
        let folder_path = self.path(folder)?;
        if self.find_in(folder, &name)?.is_some() {
            return Err(FsError::NameConflict {
                name,
                folder: folder_path,
                operation: "add",
            });
        }

        let children = self.child_ids(folder)?;
        let mut position = children.len();
        for (index, &existing) in children.iter().enumerate() {
            let node = self.node(existing)?;
            if compare_entries((kind, &name), (node.kind(), &node.name)).is_lt() {
                position = index;
                break;
            }
        }

        let now = self.clock.now();
        self.node_mut(child)?.parent = Some(folder);
        let folder_node = self.node_mut(folder)?;
        folder_node.last_modified = now;
        if let NodeData::Folder(children) = &mut folder_node.data {
            children.insert(position, child);
        }
        debug!(folder = %folder_path, name = %name, "added child");
        Ok(())
    }

    /// Detach and free the child called `name`.
    ///
    /// Nodes still targeted by a hard link survive detached.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if no child has that name
    /// - [`FsError::NotAFolder`] if `folder` is not a folder
    pub fn remove_content(&mut self, folder: NodeId, name: &str) -> FsResult<()> {
        let folder = self.folder_target(folder, 0)?;
        let Some(child) = self.find_in(folder, name)? else {
            return Err(FsError::NotFound {
                path: format!("{}{}", self.path(folder)?, name),
            });
        };
        let folder_path = self.path(folder)?;
        let now = self.clock.now();
        let folder_node = self.node_mut(folder)?;
        folder_node.last_modified = now;
        if let NodeData::Folder(children) = &mut folder_node.data {
            children.retain(|&c| c != child);
        }
        self.node_mut(child)?.parent = None;
        if self.release(child) {
            self.collect_unreachable();
        }
        debug!(folder = %folder_path, name, "removed child");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    fn content(&self, id: NodeId) -> FsResult<(&ContentStore, String)> {
        let target = self.resolve_link(id)?;
        match &self.node(target)?.data {
            NodeData::File(content) => Ok((content, self.path(id)?)),
            _ => Err(FsError::NotAFile {
                path: self.path(id)?,
            }),
        }
    }

    /// Open a writable stream on a file (or a file link's target).
    ///
    /// With `append == false` the content is cleared immediately.
    ///
    /// # Errors
    ///
    /// - [`FsError::ContentLocked`] if a writer is already open
    /// - [`FsError::NotAFile`] if the node is a folder
    /// - [`FsError::LinkDangling`] if the node is a broken soft link
    pub fn writer(&self, id: NodeId, append: bool) -> FsResult<ContentWriter> {
        let (content, path) = self.content(id)?;
        content.writer(append, &path)
    }

    /// Open a readable stream over a snapshot of the file's content.
    pub fn reader(&self, id: NodeId) -> FsResult<ContentReader> {
        let (content, _) = self.content(id)?;
        Ok(content.reader(self.config.read_chunk_size))
    }

    /// Returns `true` while a writer is open on the file.
    pub fn is_locked(&self, id: NodeId) -> FsResult<bool> {
        Ok(self.content(id)?.0.is_locked())
    }

    /// Read the whole content as UTF-8.
    pub fn read_to_string(&self, id: NodeId) -> FsResult<String> {
        let bytes: Vec<u8> = self.reader(id)?.flatten().collect();
        String::from_utf8(bytes).map_err(|_| FsError::InvalidData {
            path: self.path(id).unwrap_or_default(),
            details: "content is not valid UTF-8".into(),
        })
    }

    /// Replace (or extend, with `append`) the content in one call.
    pub fn write_bytes(&self, id: NodeId, data: &[u8], append: bool) -> FsResult<()> {
        use std::io::Write;

        let mut writer = self.writer(id, append)?;
        writer.write_all(data).map_err(|e| FsError::InvalidData {
            path: writer.path().to_string(),
            details: e.to_string(),
        })?;
        writer.close();
        Ok(())
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .field("config", &self.config)
            .finish()
    }
}
