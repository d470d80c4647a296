//! Cost-ordered stack of live search paths

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::trie::NodeId;

/// One live candidate support
#[derive(Debug, Clone)]
pub struct Path<S> {
    /// Trie node identifying the support set
    pub leaf: NodeId,

    /// Problem-owned state, exclusively held by this path
    pub side_info: S,

    pub length: usize,

    /// Residual norm before length compensation
    pub pre_cost: f64,
}

/// Total-order key: cost first, then insertion sequence so equal costs keep
/// insertion order like a multimap.
#[derive(Debug, Clone, Copy)]
struct StackKey {
    cost: f64,
    seq: u64,
}

impl PartialEq for StackKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for StackKey {}

impl PartialOrd for StackKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StackKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Multimap from cost to path, iterated in ascending cost
#[derive(Debug, Clone)]
pub struct SearchStack<S> {
    paths: BTreeMap<StackKey, Path<S>>,
    next_seq: u64,
}

impl<S> Default for SearchStack<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> SearchStack<S> {
    pub fn new() -> Self {
        Self {
            paths: BTreeMap::new(),
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn insert(&mut self, cost: f64, path: Path<S>) {
        let key = StackKey {
            cost,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.paths.insert(key, path);
    }

    /// Lowest-cost path
    pub fn best(&self) -> Option<(f64, &Path<S>)> {
        self.paths.first_key_value().map(|(k, p)| (k.cost, p))
    }

    pub fn pop_best(&mut self) -> Option<(f64, Path<S>)> {
        self.paths.pop_first().map(|(k, p)| (k.cost, p))
    }

    /// Cost of the highest-cost path
    pub fn worst_cost(&self) -> Option<f64> {
        self.paths.last_key_value().map(|(k, _)| k.cost)
    }

    pub fn pop_worst(&mut self) -> Option<(f64, Path<S>)> {
        self.paths.pop_last().map(|(k, p)| (k.cost, p))
    }

    /// Paths in ascending cost order
    pub fn iter(&self) -> impl Iterator<Item = (f64, &Path<S>)> + '_ {
        self.paths.iter().map(|(k, p)| (k.cost, p))
    }

    /// Remove every path, handing them back in ascending cost order
    pub fn drain(&mut self) -> impl Iterator<Item = Path<S>> {
        self.next_seq = 0;
        std::mem::take(&mut self.paths).into_values()
    }
}
