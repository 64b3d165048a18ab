//! In-memory namespace tree.
//!
//! This module provides an arena-backed tree of directories and files,
//! addressed by slash-delimited absolute paths, together with the
//! [`Snapshot`] document used to persist it.

mod node;
mod snapshot;
mod tree;

pub use node::{Node, NodeId, NodeKind};
pub use snapshot::Snapshot;
pub use tree::{Tree, TreeError};
