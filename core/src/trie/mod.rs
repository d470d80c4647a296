//! Priority trie of explored support sets
//!
//! Every path ever explored by the search is stored here with its elements
//! ordered by descending priority, so two supports holding the same set of
//! elements end at the same node regardless of the order they were built in.
//! Nodes are never removed during a search: a stale final marker keeps
//! rejecting later duplicates of a support that already left the stack.
//!
//! Nodes live in an arena addressed by [`NodeId`]; parent and child links are
//! indices, so clearing the trie is a truncate of the arena.

mod node;

pub use node::{ElementId, NodeId, Priority};

use node::TrieNode;

/// Trie of support sets ordered by element priority
#[derive(Debug, Clone)]
pub struct PriorityTrie {
    nodes: Vec<TrieNode>,
    priorities: Vec<Priority>,
}

impl Default for PriorityTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl PriorityTrie {
    /// Create a trie holding only the root sentinel
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::root()],
            priorities: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Install the element priorities for the next search.
    ///
    /// Must happen before any path is added; priorities are expected to be
    /// distinct and strictly below [`Priority::MAX`], which the root holds.
    pub fn set_priorities(&mut self, priorities: Vec<Priority>) {
        self.priorities = priorities;
    }

    pub fn priorities(&self) -> &[Priority] {
        &self.priorities
    }

    /// Drop every node below the root; the root itself is reused.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[0] = TrieNode::root();
    }

    /// Number of nodes including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the root is present
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Extend the path ending at `leaf` by `element`.
    ///
    /// Walks up from `leaf` past every ancestor with lower priority than
    /// `element`, then re-hangs `element` followed by the skipped ancestors
    /// under the first ancestor with higher priority, reusing existing
    /// children along the way. Returns the leaf of the composed path, or
    /// `None` when `element` is already on the path or the composed path was
    /// already realized.
    pub fn add_path(&mut self, leaf: NodeId, element: ElementId) -> Option<NodeId> {
        let (anchor, chain) = self.splice_point(leaf, element)?;

        let mut current = anchor;
        for &id in chain.iter().rev() {
            current = match self.nodes[current.index()].children.get(&id) {
                Some(&child) => child,
                None => self.push_child(current, id),
            };
        }

        let node = &mut self.nodes[current.index()];
        if node.is_final {
            None
        } else {
            node.is_final = true;
            Some(current)
        }
    }

    /// Locate the node of `leaf`'s path extended by `element` without
    /// modifying the trie.
    pub fn find_path(&self, leaf: NodeId, element: ElementId) -> Option<NodeId> {
        let (anchor, chain) = self.splice_point(leaf, element)?;
        chain.iter().rev().try_fold(anchor, |current, id| {
            self.nodes[current.index()].children.get(id).copied()
        })
    }

    /// Child of `node` holding `element`, if any
    pub fn child(&self, node: NodeId, element: ElementId) -> Option<NodeId> {
        self.nodes[node.index()].children.get(&element).copied()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].parent
    }

    /// Element held by `node`; `None` for the root
    pub fn element(&self, node: NodeId) -> Option<ElementId> {
        self.nodes[node.index()].element
    }

    pub fn is_final(&self, node: NodeId) -> bool {
        self.nodes[node.index()].is_final
    }

    /// Elements on the path from `node` up to the root, leaf first
    /// (ascending priority).
    pub fn support(&self, node: NodeId) -> Vec<ElementId> {
        let mut support = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            let n = &self.nodes[id.index()];
            if let Some(element) = n.element {
                support.push(element);
            }
            current = n.parent;
        }
        support
    }

    fn priority_of(&self, node: NodeId) -> Priority {
        match self.nodes[node.index()].element {
            None => Priority::MAX,
            Some(element) => self.priorities[element],
        }
    }

    /// Anchor node and the elements to hang below it (deepest first), or
    /// `None` if `element` already sits on the path.
    fn splice_point(&self, leaf: NodeId, element: ElementId) -> Option<(NodeId, Vec<ElementId>)> {
        let target = self.priorities[element];
        let mut chain = Vec::new();
        let mut current = leaf;

        while self.priority_of(current) < target {
            let node = &self.nodes[current.index()];
            // Only the root lacks an element, and it has the maximal priority.
            chain.push(node.element?);
            current = node.parent?;
        }

        if self.priority_of(current) == target {
            return None;
        }

        chain.push(element);
        Some((current, chain))
    }

    fn push_child(&mut self, parent: NodeId, element: ElementId) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TrieNode::new(element, parent));
        self.nodes[parent.index()].children.insert(element, id);
        id
    }
}
