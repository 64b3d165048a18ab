use std::collections::BTreeMap;

use derive_more::Display;

/// Handle to a node stored in a [`Tree`](super::Tree) arena.
///
/// Ids are only meaningful for the tree that produced them. A removed node's
/// slot is recycled, so holding an id across a removal of that node is a bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(super) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum NodeKind {
    #[display("directory")]
    Directory,
    #[display("file")]
    File,
}

impl NodeKind {
    pub fn from_is_file(is_file: bool) -> Self {
        if is_file {
            NodeKind::File
        } else {
            NodeKind::Directory
        }
    }
}

/// A single directory or file entry.
#[derive(Debug, Clone)]
pub struct Node {
    pub(super) name: String,
    pub(super) kind: NodeKind,
    pub(super) content: String,
    pub(super) children: BTreeMap<String, NodeId>,
    pub(super) parent: Option<NodeId>,
}

impl Node {
    pub(super) fn new(name: impl Into<String>, kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            name: name.into(),
            kind,
            content: String::new(),
            children: BTreeMap::new(),
            parent,
        }
    }

    /// Segment name, empty for the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &BTreeMap<String, NodeId> {
        &self.children
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}
