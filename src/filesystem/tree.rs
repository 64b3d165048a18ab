use std::collections::BTreeMap;

use snafu::{Snafu, ensure};
use tracing::{debug, warn};

use super::{Node, NodeId, NodeKind, Snapshot};

/// Arena-backed namespace tree.
///
/// Every node lives in `nodes` and refers to its parent and children by
/// [`NodeId`]. Removed subtrees return their slots to `free`, which later
/// insertions reuse. The root always occupies slot 0 and is a directory.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node::new("", NodeKind::Directory, None))],
            free: Vec::new(),
            root: NodeId(0),
        }
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Returns the node behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` refers to a slot that has been freed.
    pub fn node(&self, id: NodeId) -> &Node {
        match &self.nodes[id.0] {
            Some(node) => node,
            None => panic!("stale node id {}", id.0),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match &mut self.nodes[id.0] {
            Some(node) => node,
            None => panic!("stale node id {}", id.0),
        }
    }

    /// Walks `path` from the root, creating missing directories along the way,
    /// and returns the final node.
    ///
    /// An existing final node of the requested kind is returned untouched, so
    /// re-inserting a file keeps its content.
    pub fn insert(&mut self, path: &str, kind: NodeKind) -> Result<NodeId, TreeError> {
        let mut current = self.root;
        let mut walked = String::new();
        let mut segments = segments(path).peekable();

        while let Some(segment) = segments.next() {
            walked.push('/');
            walked.push_str(segment);
            let is_last = segments.peek().is_none();

            current = match self.node(current).children.get(segment).copied() {
                Some(child) => {
                    let child_kind = self.node(child).kind;
                    if !is_last {
                        ensure!(
                            child_kind == NodeKind::Directory,
                            NotADirectorySnafu { path: walked.clone() }
                        );
                    }
                    child
                }
                None => {
                    let child_kind = if is_last { kind } else { NodeKind::Directory };
                    self.attach(current, segment, child_kind)
                }
            };
        }

        if walked.is_empty() {
            walked.push('/');
        }
        let found = self.node(current).kind;
        match (found, kind) {
            (NodeKind::File, NodeKind::Directory) => NotADirectorySnafu { path: walked }.fail(),
            (NodeKind::Directory, NodeKind::File) => NotAFileSnafu { path: walked }.fail(),
            _ => Ok(current),
        }
    }

    /// Resolves `path` to a node. `/` (or any path without segments) is the root.
    pub fn search(&self, path: &str) -> Option<NodeId> {
        segments(path).try_fold(self.root, |current, segment| {
            self.node(current).children.get(segment).copied()
        })
    }

    /// Detaches `src` from its parent and re-attaches it under `dst`.
    ///
    /// A child of `dst` with the same name is replaced and its subtree freed.
    pub fn move_node(&mut self, src: NodeId, dst: NodeId) -> Result<(), TreeError> {
        let Some(old_parent) = self.node(src).parent else {
            return RootOperationSnafu { operation: "move" }.fail();
        };
        ensure!(
            self.node(dst).is_directory(),
            NotADirectorySnafu {
                path: self.path_of(dst)
            }
        );
        ensure!(
            !self.contains(src, dst),
            MoveIntoDescendantSnafu {
                src: self.path_of(src),
                dst: self.path_of(dst),
            }
        );
        if old_parent == dst {
            return Ok(());
        }

        let name = self.node(src).name.clone();
        self.node_mut(old_parent).children.remove(&name);
        if let Some(displaced) = self.node_mut(dst).children.remove(&name) {
            debug!("Replacing existing entry '{}' under {}", name, self.path_of(dst));
            self.free_subtree(displaced);
        }
        self.node_mut(src).parent = Some(dst);
        self.node_mut(dst).children.insert(name, src);
        debug!("Moved node {} to {}", src.0, self.path_of(src));
        Ok(())
    }

    /// Deep-copies `src` and its whole subtree under `dst`, returning the new node.
    ///
    /// The copy shares nothing with the source. A child of `dst` with the same
    /// name is replaced.
    pub fn copy_node(&mut self, src: NodeId, dst: NodeId) -> Result<NodeId, TreeError> {
        ensure!(
            self.node(src).parent.is_some(),
            RootOperationSnafu { operation: "copy" }
        );
        ensure!(
            self.node(dst).is_directory(),
            NotADirectorySnafu {
                path: self.path_of(dst)
            }
        );

        let name = self.node(src).name.clone();
        let captured = self.subtree_snapshot(src);
        if let Some(displaced) = self.node_mut(dst).children.remove(&name) {
            debug!("Replacing existing entry '{}' under {}", name, self.path_of(dst));
            self.free_subtree(displaced);
        }
        let copy = self.attach_snapshot(dst, &name, &captured);
        debug!(
            "Copied {} entries to {}",
            captured.entry_count(),
            self.path_of(copy)
        );
        Ok(copy)
    }

    /// Unlinks `name` from `parent` and frees its subtree. Returns whether
    /// anything was removed.
    pub fn remove(&mut self, parent: NodeId, name: &str) -> bool {
        match self.node_mut(parent).children.remove(name) {
            Some(child) => {
                self.free_subtree(child);
                true
            }
            None => false,
        }
    }

    /// Reports whether `pattern` occurs literally in the content of file `id`.
    /// Directories and empty patterns never match.
    pub fn grep(&self, id: NodeId, pattern: &str) -> bool {
        let node = self.node(id);
        node.is_file() && !pattern.is_empty() && node.content.contains(pattern)
    }

    pub fn append_content(&mut self, id: NodeId, text: &str) -> Result<(), TreeError> {
        let node = self.node(id);
        ensure!(
            node.is_file(),
            NotAFileSnafu {
                path: self.path_of(id)
            }
        );
        self.node_mut(id).content.push_str(text);
        Ok(())
    }

    /// Absolute path of `id`, rebuilt from parent back-references.
    pub fn path_of(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            names.push(self.node(current).name.as_str());
            current = parent;
        }
        if names.is_empty() {
            return "/".to_string();
        }
        names.reverse();
        format!("/{}", names.join("/"))
    }

    /// Whether `descendant` is `ancestor` itself or lies inside its subtree.
    pub fn contains(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        let mut current = Some(descendant);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).parent;
        }
        false
    }

    pub fn to_snapshot(&self) -> Snapshot {
        self.subtree_snapshot(self.root)
    }

    /// Rebuilds a tree from a snapshot, restoring parent back-references.
    ///
    /// Children of file entries are dropped. A child's stored name is ignored
    /// in favour of the key it is filed under.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self, TreeError> {
        ensure!(!snapshot.is_file, RootIsFileSnafu);

        let mut tree = Self::new();
        let root = tree.root;
        for (name, child) in &snapshot.children {
            tree.attach_snapshot(root, name, child);
        }
        debug!("Restored tree with {} nodes", tree.len());
        Ok(tree)
    }

    /// Captures `id` and everything below it.
    ///
    /// Nodes are gathered breadth-first, so every parent precedes its children
    /// in `order`; folding the list back to front nests each finished child
    /// into its parent without recursing.
    pub fn subtree_snapshot(&self, id: NodeId) -> Snapshot {
        let mut order: Vec<(NodeId, usize)> = vec![(id, 0)];
        let mut next = 0;
        while next < order.len() {
            let (current, _) = order[next];
            order.extend(
                self.node(current)
                    .children
                    .values()
                    .map(|&child| (child, next)),
            );
            next += 1;
        }

        let mut built = order
            .iter()
            .map(|&(current, _)| {
                let node = self.node(current);
                Snapshot {
                    name: node.parent.map(|_| node.name.clone()),
                    is_file: node.is_file(),
                    content: node.content.clone(),
                    children: BTreeMap::new(),
                }
            })
            .collect::<Vec<_>>();

        for index in (1..order.len()).rev() {
            let (current, parent) = order[index];
            let finished = std::mem::take(&mut built[index]);
            built[parent]
                .children
                .insert(self.node(current).name.clone(), finished);
        }
        std::mem::take(&mut built[0])
    }

    fn attach_snapshot(&mut self, parent: NodeId, name: &str, snapshot: &Snapshot) -> NodeId {
        let top = self.attach(parent, name, NodeKind::from_is_file(snapshot.is_file));
        let mut pending = vec![(top, snapshot)];

        while let Some((id, snapshot)) = pending.pop() {
            if snapshot.is_file {
                self.node_mut(id).content = snapshot.content.clone();
                if !snapshot.children.is_empty() {
                    warn!(
                        "Dropping {} children stored under file {}",
                        snapshot.children.len(),
                        self.path_of(id)
                    );
                }
                continue;
            }
            for (child_name, child) in &snapshot.children {
                let child_id = self.attach(id, child_name, NodeKind::from_is_file(child.is_file));
                pending.push((child_id, child));
            }
        }
        top
    }

    fn attach(&mut self, parent: NodeId, name: &str, kind: NodeKind) -> NodeId {
        let id = self.allocate(Node::new(name, kind, Some(parent)));
        self.node_mut(parent).children.insert(name.to_string(), id);
        id
    }

    fn allocate(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    /// Releases `id` and all its descendants. The caller unlinks `id` from its parent.
    fn free_subtree(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.nodes[current.0].take() {
                pending.extend(node.children.into_values());
                self.free.push(current.0);
            }
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[snafu(display("Not a directory: {}", path))]
    NotADirectory { path: String },
    #[snafu(display("Not a file: {}", path))]
    NotAFile { path: String },
    #[snafu(display("Cannot move {} into its own subtree {}", src, dst))]
    MoveIntoDescendant { src: String, dst: String },
    #[snafu(display("Cannot {} the root directory", operation))]
    RootOperation { operation: &'static str },
    #[snafu(display("Snapshot root must be a directory"))]
    RootIsFile,
}
