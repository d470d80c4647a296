//! Contract between the A* engine and the problem it searches
//!
//! The engine only ever sees element ids, costs and an opaque per-path side
//! info; everything numerical stays behind this trait.

use crate::error::AstarResult;
use crate::trie::{ElementId, Priority};

/// Problem-side operations the A* engine drives
pub trait SearchProblem {
    /// Per-path state owned by the problem (exclusively owned by one path)
    type SideInfo;

    /// Final answer extracted from the winning path
    type Solution: ?Sized;

    /// Priority of every element, indexed by element id
    fn priorities(&self) -> Vec<Priority>;

    /// Up to `count` seed paths, each an ordered list of element ids
    fn initial_paths(&self, count: usize) -> AstarResult<Vec<Vec<ElementId>>>;

    /// Pre-cost of the empty path
    fn initial_cost(&self) -> f64;

    /// The `count` most promising extensions of a path, best first
    fn best_candidates(&self, count: usize, side_info: &Self::SideInfo) -> Vec<ElementId>;

    /// Extend the path's side info by `element` and return its new pre-cost
    fn pre_cost(&self, side_info: &mut Self::SideInfo, element: ElementId) -> f64;

    fn new_side_info(&self) -> Self::SideInfo;

    fn copy_side_info(&self, src: &Self::SideInfo, dst: &mut Self::SideInfo);

    /// Return a side info to the empty-path state
    fn reset_side_info(&self, side_info: &mut Self::SideInfo);

    /// Completion predicate evaluated on the best path
    fn is_search_complete(&self, path_length: usize, pre_cost: f64) -> bool;

    /// Extract the solution from the winning path's side info
    fn perform_post_operations(&mut self, side_info: &Self::SideInfo);

    /// Solution stored by the last `perform_post_operations`
    fn solution(&self) -> &Self::Solution;
}
