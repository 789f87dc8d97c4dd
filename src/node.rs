//! Node storage for the tree arena.
//!
//! Nodes are a tagged variant over file, folder and link. Children and
//! parents are [`NodeId`] handles into the arena, never owning references.

use std::time::SystemTime;

use crate::content::ContentStore;
use crate::{LinkKind, NodeId, NodeKind};

pub(crate) struct Node {
    pub(crate) name: String,
    /// Back-reference for path derivation; `None` for the root and for
    /// detached nodes.
    pub(crate) parent: Option<NodeId>,
    pub(crate) last_modified: SystemTime,
    /// Number of hard links targeting this node. Keeps it alive after removal.
    pub(crate) hard_links: usize,
    pub(crate) data: NodeData,
}

pub(crate) enum NodeData {
    File(ContentStore),
    /// Children, kept sorted: folders first, then by name.
    Folder(Vec<NodeId>),
    Link(Link),
}

pub(crate) struct Link {
    /// Kind of the node the link was created for.
    pub(crate) kind: NodeKind,
    pub(crate) target: LinkTarget,
}

pub(crate) enum LinkTarget {
    Hard(NodeId),
    Soft { path: String, root: NodeId },
}

impl Node {
    pub(crate) fn kind(&self) -> NodeKind {
        match &self.data {
            NodeData::File(_) => NodeKind::File,
            NodeData::Folder(_) => NodeKind::Folder,
            NodeData::Link(link) => link.kind,
        }
    }

    pub(crate) fn link_kind(&self) -> Option<LinkKind> {
        match &self.data {
            NodeData::Link(Link {
                target: LinkTarget::Hard(_),
                ..
            }) => Some(LinkKind::Hard),
            NodeData::Link(Link {
                target: LinkTarget::Soft { .. },
                ..
            }) => Some(LinkKind::Soft),
            _ => None,
        }
    }
}
