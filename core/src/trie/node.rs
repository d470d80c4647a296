//! Arena-addressed trie nodes

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a dictionary element
pub type ElementId = usize;

/// Rank of a dictionary element; higher sits closer to the root
pub type Priority = u32;

/// Handle of a node inside a [`super::PriorityTrie`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The sentinel root, always the first arena slot
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node{}", self.0)
    }
}

/// One element positioned in a priority-ordered ancestor chain
#[derive(Debug, Clone)]
pub(crate) struct TrieNode {
    /// `None` only for the root sentinel
    pub element: Option<ElementId>,
    pub parent: Option<NodeId>,
    pub children: FxHashMap<ElementId, NodeId>,
    /// Terminus of at least one realized path
    pub is_final: bool,
}

impl TrieNode {
    pub fn root() -> Self {
        Self {
            element: None,
            parent: None,
            children: FxHashMap::default(),
            is_final: false,
        }
    }

    pub fn new(element: ElementId, parent: NodeId) -> Self {
        Self {
            element: Some(element),
            parent: Some(parent),
            children: FxHashMap::default(),
            is_final: false,
        }
    }
}
