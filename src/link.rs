//! # Link Resolver
//!
//! Indirection behavior of hard and soft link nodes.
//!
//! ## Hard links
//!
//! Hold the target's [`NodeId`]. The target stays alive while any hard link
//! references it, so a hard link keeps working after its target is removed
//! from the tree.
//!
//! ## Soft links
//!
//! Hold the target's absolute path and the root it was captured from. Every
//! access re-resolves that path. Exactly one match of the recorded kind is
//! required; anything else fails with [`FsError::LinkDangling`], whose
//! [`DanglingReason`] tells a broken path apart from an ambiguous or
//! mistyped target.
//!
//! ## Hop limit
//!
//! Each link followed during one resolution counts as a hop. Exceeding
//! [`TreeConfig::max_link_depth`](crate::TreeConfig::max_link_depth) fails
//! with [`FsError::LinkLoop`].

use tracing::debug;

use crate::node::{Link, LinkTarget, NodeData};
use crate::{DanglingReason, FsError, FsResult, LinkKind, NodeId, NodeKind, Tree};

impl Tree {
    /// Follow link nodes until a file or folder is reached.
    ///
    /// Returns `id` unchanged for non-link nodes.
    ///
    /// # Errors
    ///
    /// - [`FsError::LinkDangling`] if a soft link along the way is broken
    /// - [`FsError::LinkLoop`] if the hop limit is exceeded
    pub fn resolve_link(&self, id: NodeId) -> FsResult<NodeId> {
        self.follow_links(id, 0)
    }

    /// The node a link points at right now, one level deep. `None` for
    /// non-link nodes.
    pub fn link_target(&self, id: NodeId) -> FsResult<Option<NodeId>> {
        match &self.node(id)?.data {
            NodeData::Link(link) => self.step(id, link, 0).map(Some),
            _ => Ok(None),
        }
    }

    /// Absolute path recorded by a soft link. `None` for other nodes.
    pub fn soft_link_path(&self, id: NodeId) -> FsResult<Option<&str>> {
        match &self.node(id)?.data {
            NodeData::Link(Link {
                target: LinkTarget::Soft { path, .. },
                ..
            }) => Ok(Some(path)),
            _ => Ok(None),
        }
    }

    pub(crate) fn follow_links(&self, id: NodeId, depth: usize) -> FsResult<NodeId> {
        let mut current = id;
        let mut hops = depth;
        loop {
            let NodeData::Link(link) = &self.node(current)?.data else {
                return Ok(current);
            };
            if hops >= self.config().max_link_depth {
                return Err(FsError::LinkLoop {
                    path: self.path(id)?,
                    limit: self.config().max_link_depth,
                });
            }
            hops += 1;
            current = self.step(current, link, hops)?;
        }
    }

    fn step(&self, id: NodeId, link: &Link, depth: usize) -> FsResult<NodeId> {
        match &link.target {
            LinkTarget::Hard(target) => {
                self.node(*target)?;
                Ok(*target)
            }
            LinkTarget::Soft { path, root } => self.resolve_soft(id, link.kind, path, *root, depth),
        }
    }

    fn resolve_soft(
        &self,
        id: NodeId,
        expected: NodeKind,
        target: &str,
        root: NodeId,
        depth: usize,
    ) -> FsResult<NodeId> {
        let dangling = |reason| FsError::LinkDangling {
            link: self.path(id).unwrap_or_default(),
            target: target.to_string(),
            reason,
        };

        let matches = self
            .resolve_from(target, root, root, depth)
            .map_err(|e| dangling(DanglingReason::Unresolvable(Box::new(e))))?;
        let resolved = match matches.as_slice() {
            [single] => *single,
            [] => {
                return Err(dangling(DanglingReason::Unresolvable(Box::new(
                    FsError::NotFound {
                        path: target.to_string(),
                    },
                ))));
            }
            many => {
                return Err(dangling(DanglingReason::Ambiguous {
                    matches: many.len(),
                }));
            }
        };
        if self.kind(resolved)? != expected {
            return Err(dangling(DanglingReason::KindMismatch { expected }));
        }
        Ok(resolved)
    }

    /// Create a link to the single node at `source` inside the folder at
    /// `destination`. Collaborator contract behind `ln`.
    ///
    /// The link is named `new_name`, or after the source. A hard link holds
    /// the source node itself; a soft link records the source's absolute
    /// path and `root`.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidPath`] if either path does not resolve to exactly one node
    /// - [`FsError::NotAFolder`] if the destination is not a folder
    /// - [`FsError::NameConflict`] / [`FsError::InvalidName`] from attaching the link
    ///
    /// # Example
    ///
    /// ```rust
    /// use memtree::{LinkKind, Tree};
    ///
    /// let mut tree = Tree::new();
    /// let root = tree.root();
    /// let file = tree.create_file("target.txt");
    /// tree.add_content(root, file).unwrap();
    /// tree.write_bytes(file, b"content", false).unwrap();
    ///
    /// let link = tree
    ///     .build_link("/target.txt", "/", Some("alias.txt"), LinkKind::Soft, root, root)
    ///     .unwrap();
    /// assert_eq!(tree.read_to_string(link).unwrap(), "content");
    ///
    /// tree.remove_content(root, "target.txt").unwrap();
    /// assert!(tree.read_to_string(link).is_err());
    /// ```
    pub fn build_link(
        &mut self,
        source: &str,
        destination: &str,
        new_name: Option<&str>,
        kind: LinkKind,
        working: NodeId,
        root: NodeId,
    ) -> FsResult<NodeId> {
        let source_node = self.resolve_single(source, working, root)?;
        let destination_node = self.resolve_single(destination, working, root)?;
        let folder = self.folder_target(destination_node, 0)?;

        let name = match new_name {
            Some(name) => name.to_string(),
            None => self.name(source_node)?.to_string(),
        };
        let target_kind = self.kind(source_node)?;
        let target = match kind {
            LinkKind::Hard => LinkTarget::Hard(source_node),
            LinkKind::Soft => LinkTarget::Soft {
                path: self.rooted_path(source_node, root)?,
                root,
            },
        };
        let link = self.create_link(name, target_kind, target);
        if let Err(e) = self.add_content(folder, link) {
            self.discard(link);
            return Err(e);
        }
        debug!(source, destination, ?kind, "created link");
        Ok(link)
    }

    /// Resolve a path that must name exactly one node.
    pub(crate) fn resolve_single(&self, path: &str, working: NodeId, root: NodeId) -> FsResult<NodeId> {
        match self.resolve_path(path, working, root)?.as_slice() {
            [single] => Ok(*single),
            matches => Err(FsError::InvalidPath {
                path: path.to_string(),
                reason: format!("expected exactly one node, found {}", matches.len()),
            }),
        }
    }

    /// Absolute path of a soft link target.
    ///
    /// Nodes only reachable through a hard link to a detached folder have no
    /// absolute path, so a soft link cannot name them.
    fn rooted_path(&self, target: NodeId, root: NodeId) -> FsResult<String> {
        if !self.is_within(target, root)? {
            return Err(FsError::InvalidPath {
                path: self.path(target)?,
                reason: "soft link target is not reachable from the root".into(),
            });
        }
        self.path(target)
    }

    /// Detached copy of a link, re-targeted at what the link resolves to now.
    ///
    /// Hard links keep their target. Soft links are resolved one level and
    /// the copy records the resolved node's current absolute path, so copying
    /// a dangling soft link fails.
    pub(crate) fn copy_link(&mut self, id: NodeId) -> FsResult<NodeId> {
        let node = self.node(id)?;
        let NodeData::Link(link) = &node.data else {
            return Err(FsError::InvalidPath {
                path: self.path(id)?,
                reason: "not a link".into(),
            });
        };
        let name = node.name.clone();
        let kind = link.kind;
        let resolved = self.step(id, link, 0)?;
        let target = match &link.target {
            LinkTarget::Hard(_) => LinkTarget::Hard(resolved),
            LinkTarget::Soft { root, .. } => LinkTarget::Soft {
                path: self.rooted_path(resolved, *root)?,
                root: *root,
            },
        };
        Ok(self.create_link(name, kind, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TreeConfig;
    use crate::clock::ManualClock;
    use std::io::Write;

    struct Fixture {
        tree: Tree,
        root: NodeId,
        target: NodeId,
    }

    fn fixture() -> Fixture {
        let mut tree = Tree::with_clock(ManualClock::default());
        let root = tree.root();
        let target = tree.create_file("target");
        tree.add_content(root, target).unwrap();
        tree.write_bytes(target, b"content", false).unwrap();
        Fixture { tree, root, target }
    }

    fn link(f: &mut Fixture, kind: LinkKind) -> NodeId {
        f.tree
            .build_link("/target", "/", Some("link"), kind, f.root, f.root)
            .unwrap()
    }

    #[test]
    fn hard_link_reports_target_attributes() {
        let mut f = fixture();
        let link = link(&mut f, LinkKind::Hard);
        assert!(f.tree.is_link(link).unwrap());
        assert!(!f.tree.is_folder(link).unwrap());
        assert_eq!(f.tree.link_kind(link).unwrap(), Some(LinkKind::Hard));
        assert_eq!(f.tree.path(link).unwrap(), "/link");
        assert_eq!(f.tree.size(link).unwrap(), f.tree.size(f.target).unwrap());
        assert_eq!(
            f.tree.last_modified(link).unwrap(),
            f.tree.last_modified(f.target).unwrap()
        );
    }

    #[test]
    fn hard_link_tracks_edits_both_ways() {
        let mut f = fixture();
        let link = link(&mut f, LinkKind::Hard);

        f.tree.write_bytes(f.target, b" new content", true).unwrap();
        assert_eq!(f.tree.read_to_string(link).unwrap(), "content new content");

        f.tree.write_bytes(link, b"new content", false).unwrap();
        assert_eq!(f.tree.read_to_string(f.target).unwrap(), "new content");
    }

    #[test]
    fn hard_link_survives_target_removal() {
        let mut f = fixture();
        let link = link(&mut f, LinkKind::Hard);
        f.tree.remove_content(f.root, "target").unwrap();

        assert!(f.tree.contains(f.target));
        assert_eq!(f.tree.read_to_string(link).unwrap(), "content");

        f.tree.remove_content(f.root, "link").unwrap();
        assert!(!f.tree.contains(f.target));
    }

    #[test]
    fn soft_link_tracks_edits_both_ways() {
        let mut f = fixture();
        let link = link(&mut f, LinkKind::Soft);
        assert_eq!(f.tree.soft_link_path(link).unwrap(), Some("/target"));

        f.tree.write_bytes(f.target, b" new content", true).unwrap();
        assert_eq!(f.tree.read_to_string(link).unwrap(), "content new content");

        f.tree.write_bytes(link, b"new content", false).unwrap();
        assert_eq!(f.tree.read_to_string(f.target).unwrap(), "new content");
    }

    #[test]
    fn soft_link_dangles_after_target_removal() {
        let mut f = fixture();
        let link = link(&mut f, LinkKind::Soft);
        f.tree.remove_content(f.root, "target").unwrap();

        let err = f.tree.size(link).unwrap_err();
        match err {
            FsError::LinkDangling { link, target, reason } => {
                assert_eq!(link, "/link");
                assert_eq!(target, "/target");
                assert!(matches!(reason, DanglingReason::Unresolvable(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(f.tree.reader(link).is_err());
    }

    #[test]
    fn soft_link_reattaches_when_target_reappears() {
        let mut f = fixture();
        let link = link(&mut f, LinkKind::Soft);
        f.tree.remove_content(f.root, "target").unwrap();

        let replacement = f.tree.create_file("target");
        f.tree.add_content(f.root, replacement).unwrap();
        f.tree.write_bytes(replacement, b"again", false).unwrap();
        assert_eq!(f.tree.read_to_string(link).unwrap(), "again");
    }

    #[test]
    fn soft_link_kind_mismatch_dangles() {
        let mut f = fixture();
        let link = link(&mut f, LinkKind::Soft);
        f.tree.remove_content(f.root, "target").unwrap();
        let folder = f.tree.create_folder("target");
        f.tree.add_content(f.root, folder).unwrap();

        match f.tree.resolve_link(link).unwrap_err() {
            FsError::LinkDangling { reason, .. } => assert!(matches!(
                reason,
                DanglingReason::KindMismatch {
                    expected: NodeKind::File
                }
            )),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn folder_links_expose_children() {
        let mut tree = Tree::new();
        let root = tree.root();
        let dir = tree.create_folder("dir");
        tree.add_content(root, dir).unwrap();
        let child = tree.create_file("child");
        tree.add_content(dir, child).unwrap();

        for (name, kind) in [("hard", LinkKind::Hard), ("soft", LinkKind::Soft)] {
            let link = tree
                .build_link("/dir", "/", Some(name), kind, root, root)
                .unwrap();
            assert!(tree.is_folder(link).unwrap());
            assert_eq!(tree.path(link).unwrap(), format!("/{name}/"));
            assert_eq!(tree.children(link).unwrap(), vec![child]);
            assert_eq!(tree.find_child(link, "child").unwrap(), Some(child));
        }
    }

    #[test]
    fn adding_through_folder_link_lands_in_target() {
        let mut tree = Tree::new();
        let root = tree.root();
        let dir = tree.create_folder("dir");
        tree.add_content(root, dir).unwrap();
        let link = tree
            .build_link("/dir", "/", Some("alias"), LinkKind::Soft, root, root)
            .unwrap();

        let file = tree.create_file("new");
        tree.add_content(link, file).unwrap();
        assert_eq!(tree.parent(file).unwrap(), Some(dir));
        assert_eq!(tree.path(file).unwrap(), "/dir/new");
    }

    #[test]
    fn build_link_requires_single_source_and_folder_destination() {
        let mut f = fixture();
        let root = f.root;
        let other = f.tree.create_file("other");
        f.tree.add_content(root, other).unwrap();
        let err = f
            .tree
            .build_link("/*", "/", None, LinkKind::Hard, root, root)
            .unwrap_err();
        assert!(matches!(err, FsError::InvalidPath { .. }));

        let err = f
            .tree
            .build_link("/target", "/target", Some("x"), LinkKind::Hard, root, root)
            .unwrap_err();
        assert!(matches!(err, FsError::NotAFolder { .. }));

        let err = f
            .tree
            .build_link("/target", "/", None, LinkKind::Soft, root, root)
            .unwrap_err();
        assert!(matches!(err, FsError::NameConflict { .. }));
    }

    #[test]
    fn failed_hard_link_does_not_pin_target() {
        let mut f = fixture();
        let root = f.root;
        f.tree
            .build_link("/target", "/", None, LinkKind::Hard, root, root)
            .unwrap_err();
        f.tree.remove_content(root, "target").unwrap();
        assert!(!f.tree.contains(f.target));
    }

    #[test]
    fn copy_of_soft_link_records_current_path() {
        let mut f = fixture();
        let link = link(&mut f, LinkKind::Soft);
        let copy = f.tree.copy_link(link).unwrap();
        assert_eq!(f.tree.soft_link_path(copy).unwrap(), Some("/target"));
        assert_eq!(f.tree.name(copy).unwrap(), "link");
        assert_eq!(f.tree.size(copy).unwrap(), 7);
    }

    #[test]
    fn copy_of_dangling_soft_link_fails() {
        let mut f = fixture();
        let link = link(&mut f, LinkKind::Soft);
        f.tree.remove_content(f.root, "target").unwrap();
        assert!(matches!(
            f.tree.copy_link(link),
            Err(FsError::LinkDangling { .. })
        ));
    }

    /// `/h` hard-links a folder `a` that was removed from the tree, and a new
    /// `/a/file` has taken its old place.
    fn detached_behind_hard_link() -> (Tree, NodeId) {
        let mut tree = Tree::with_clock(ManualClock::default());
        let root = tree.root();
        for content in ["real", "imposter"] {
            let folder = tree.build_folder("/a", false, root, root).unwrap();
            let file = tree.create_file("file");
            tree.add_content(folder, file).unwrap();
            tree.write_bytes(file, content.as_bytes(), false).unwrap();
            if content == "real" {
                tree.build_link("/a", "/", Some("h"), LinkKind::Hard, root, root)
                    .unwrap();
                tree.remove_content(root, "a").unwrap();
            }
        }
        (tree, root)
    }

    #[test]
    fn soft_link_to_detached_node_is_refused() {
        let (mut tree, root) = detached_behind_hard_link();
        assert_eq!(
            tree.read_to_string(tree.resolve_single("/h/file", root, root).unwrap())
                .unwrap(),
            "real"
        );

        let err = tree
            .build_link("/h/file", "/", Some("s"), LinkKind::Soft, root, root)
            .unwrap_err();
        assert!(matches!(err, FsError::InvalidPath { .. }));
        assert_eq!(tree.find_child(root, "s").unwrap(), None);
    }

    #[test]
    fn copy_of_soft_link_into_detached_folder_is_refused() {
        let (mut tree, root) = detached_behind_hard_link();
        let link = tree.create_link(
            "s".to_string(),
            NodeKind::File,
            LinkTarget::Soft {
                path: "/h/file".to_string(),
                root,
            },
        );
        tree.add_content(root, link).unwrap();
        assert_eq!(tree.read_to_string(link).unwrap(), "real");

        assert!(matches!(
            tree.copy_link(link),
            Err(FsError::InvalidPath { .. })
        ));
    }

    #[test]
    fn copy_of_hard_link_keeps_target() {
        let mut f = fixture();
        let link = link(&mut f, LinkKind::Hard);
        let copy = f.tree.copy_link(link).unwrap();
        assert_eq!(f.tree.link_target(copy).unwrap(), Some(f.target));
    }

    #[test]
    fn link_to_link_resolves_through_both() {
        let mut f = fixture();
        let root = f.root;
        link(&mut f, LinkKind::Soft);
        let outer = f
            .tree
            .build_link("/link", "/", Some("outer"), LinkKind::Hard, root, root)
            .unwrap();
        assert_eq!(f.tree.resolve_link(outer).unwrap(), f.target);
        assert_eq!(
            f.tree.link_target(outer).unwrap(),
            f.tree.find_child(root, "link").unwrap()
        );
    }

    #[test]
    fn soft_link_cycle_hits_hop_limit() {
        let mut tree = Tree::with_config(
            TreeConfig::default().with_max_link_depth(8),
            ManualClock::default(),
        );
        let root = tree.root();
        for name in ["a", "b"] {
            let f = tree.create_folder(name);
            tree.add_content(root, f).unwrap();
        }
        tree.build_link("/b", "/", Some("la"), LinkKind::Soft, root, root)
            .unwrap();
        tree.build_link("/a", "/", Some("lb"), LinkKind::Soft, root, root)
            .unwrap();
        // replace the targets with links back to la and lb
        tree.remove_content(root, "b").unwrap();
        tree.remove_content(root, "a").unwrap();
        tree.build_link("/lb", "/", Some("b"), LinkKind::Soft, root, root)
            .unwrap();
        tree.build_link("/la", "/", Some("a"), LinkKind::Soft, root, root)
            .unwrap();

        let la = tree.find_child(root, "la").unwrap().unwrap();
        let err = tree.resolve_link(la).unwrap_err();
        assert!(matches!(
            err,
            FsError::LinkLoop { .. } | FsError::LinkDangling { .. }
        ));
    }

    #[test]
    fn writer_through_link_locks_target() {
        let mut f = fixture();
        let link = link(&mut f, LinkKind::Hard);
        let mut w = f.tree.writer(link, true).unwrap();
        w.write_all(b"!").unwrap();
        assert!(matches!(
            f.tree.writer(f.target, true),
            Err(FsError::ContentLocked { .. })
        ));
        w.close();
        assert!(!f.tree.is_locked(f.target).unwrap());
    }
}
