use std::collections::BTreeMap;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Structural, self-contained copy of a subtree.
///
/// This is the persisted document shape: `name` is `null` for the root,
/// `children` maps each child name to a nested document of the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct Snapshot {
    pub name: Option<String>,
    #[serde(rename = "isFile")]
    pub is_file: bool,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub children: BTreeMap<String, Snapshot>,
}

impl Snapshot {
    /// Total number of entries in this subtree, including itself.
    pub fn entry_count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(snapshot) = pending.pop() {
            count += 1;
            pending.extend(snapshot.children.values());
        }
        count
    }
}

#[cfg(test)]
impl Snapshot {
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            is_file: true,
            content: content.into(),
            children: BTreeMap::new(),
        }
    }

    /// Adds `child` keyed by its own name. Children without a name are ignored.
    pub fn with_child(mut self, child: Snapshot) -> Self {
        if let Some(name) = child.name.clone() {
            self.children.insert(name, child);
        }
        self
    }
}
