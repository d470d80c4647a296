//! A* search over support sets
//!
//! The engine pops the cheapest live path, asks the problem for its best B
//! extensions, and pushes every extension the trie has not seen before onto
//! a stack capped at roughly P paths. The search ends as soon as the
//! cheapest path satisfies the problem's completion predicate.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{AstarError, AstarResult};
use crate::search::cost::{CostConfig, CostModel};
use crate::search::pool::SideInfoPool;
use crate::search::problem::SearchProblem;
use crate::search::stack::{Path, SearchStack};
use crate::trie::{ElementId, NodeId, PriorityTrie};

/// Search configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Target sparsity K
    pub sparsity: usize,

    /// Seed paths per search (I)
    pub initial_paths: usize,

    /// Candidate extensions per iteration (B)
    pub branches_per_iteration: usize,

    /// Stack size above which extra branches must beat the worst path (P)
    pub max_stack_paths: usize,

    pub cost: CostConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            sparsity: 10,
            initial_paths: 3,
            branches_per_iteration: 3,
            max_stack_paths: 200,
            cost: CostConfig::default(),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> AstarResult<()> {
        for (name, value) in [
            ("sparsity", self.sparsity),
            ("initial_paths", self.initial_paths),
            ("branches_per_iteration", self.branches_per_iteration),
            ("max_stack_paths", self.max_stack_paths),
        ] {
            if value == 0 {
                return Err(AstarError::InvalidConfig(format!("{name} must be positive")));
            }
        }
        self.cost.validate()
    }
}

/// Where the engine stands for the current problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchState {
    Uninitialized,
    Initialized,
    Running,
    Solved,
}

/// Branch counters for one or more searches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub iterations: u64,

    /// Candidates rejected because their support was already explored
    pub equivalent_branches: u64,

    /// Seeds and non-best candidates pushed onto the stack
    pub added_branches: u64,

    /// Non-best candidates dropped under stack pressure
    pub ignored_branches: u64,

    /// Best candidates, always pushed in place of their parent
    pub replaced_branches: u64,
}

impl AddAssign for SearchStats {
    fn add_assign(&mut self, rhs: Self) {
        self.iterations += rhs.iterations;
        self.equivalent_branches += rhs.equivalent_branches;
        self.added_branches += rhs.added_branches;
        self.ignored_branches += rhs.ignored_branches;
        self.replaced_branches += rhs.replaced_branches;
    }
}

/// Outcome of a completed search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Selected elements, ascending
    pub support: Vec<ElementId>,

    pub path_length: usize,

    pub pre_cost: f64,

    pub cost: f64,

    pub stats: SearchStats,
}

/// A* search engine driving a [`SearchProblem`]
pub struct AStarSearch<P: SearchProblem> {
    config: SearchConfig,
    cost_model: CostModel,
    problem: P,
    trie: PriorityTrie,
    stack: SearchStack<P::SideInfo>,
    pool: SideInfoPool<P::SideInfo>,
    stats: SearchStats,
    state: SearchState,
}

impl<P: SearchProblem> AStarSearch<P> {
    pub fn new(config: SearchConfig, problem: P) -> AstarResult<Self> {
        config.validate()?;
        let cost_model = CostModel::new(config.cost, config.sparsity)?;
        let pool_capacity =
            config.max_stack_paths + config.initial_paths + config.branches_per_iteration + 1;
        Ok(Self {
            cost_model,
            problem,
            trie: PriorityTrie::new(),
            stack: SearchStack::new(),
            pool: SideInfoPool::new(pool_capacity),
            stats: SearchStats::default(),
            state: SearchState::Uninitialized,
            config,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// Mutable access to the problem, e.g. to load the next observation.
    ///
    /// The problem may change under the engine, so the current search is
    /// abandoned and [`Self::initialize`] must run again.
    pub fn problem_mut(&mut self) -> &mut P {
        self.clear_search_stack();
        self.state = SearchState::Uninitialized;
        &mut self.problem
    }

    pub fn into_problem(self) -> P {
        self.problem
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Counters of the current search
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn trie(&self) -> &PriorityTrie {
        &self.trie
    }

    pub fn stack(&self) -> &SearchStack<P::SideInfo> {
        &self.stack
    }

    /// Cheapest live path
    pub fn best_path(&self) -> Option<(f64, &Path<P::SideInfo>)> {
        self.stack.best()
    }

    /// Drop every live path, recycling its side info
    pub fn clear_search_stack(&mut self) {
        for path in self.stack.drain() {
            self.pool.release(path.side_info);
        }
    }

    /// Prepare a fresh search for the problem's current observation.
    ///
    /// Clears the trie and stack, installs new priorities and pushes the
    /// seed paths. Fails with [`AstarError::NoInitialPaths`] when no seed
    /// survives, leaving the engine uninitialized.
    pub fn initialize(&mut self) -> AstarResult<()> {
        self.state = SearchState::Uninitialized;
        self.clear_search_stack();
        self.trie.clear();
        self.trie.set_priorities(self.problem.priorities());
        self.stats = SearchStats::default();

        let seeds = self.problem.initial_paths(self.config.initial_paths)?;
        for seed in &seeds {
            if let Some((cost, path)) = self.seed_path(seed) {
                self.stack.insert(cost, path);
                self.stats.added_branches += 1;
            }
        }

        if self.stack.is_empty() {
            warn!(seeds = seeds.len(), "initialization failed: no initial paths");
            return Err(AstarError::NoInitialPaths);
        }

        debug!(
            paths = self.stack.len(),
            mode = %self.cost_model.mode(),
            "search initialized"
        );
        self.state = SearchState::Initialized;
        Ok(())
    }

    /// Expand paths until the cheapest one is complete, then let the
    /// problem extract its solution.
    pub fn run(&mut self) -> AstarResult<SearchResult> {
        if self.stack.is_empty() {
            warn!("run called on an empty search stack");
            return Err(AstarError::EmptyStack);
        }
        self.state = SearchState::Running;

        if let Err(err) = self.expand_until_complete() {
            self.state = SearchState::Uninitialized;
            debug!(error = %err, iterations = self.stats.iterations, "search aborted");
            return Err(err);
        }

        let (cost, best) = self.stack.best().ok_or(AstarError::Exhausted)?;
        self.problem.perform_post_operations(&best.side_info);

        let mut support = self.trie.support(best.leaf);
        support.sort_unstable();
        let result = SearchResult {
            support,
            path_length: best.length,
            pre_cost: best.pre_cost,
            cost,
            stats: self.stats,
        };

        self.state = SearchState::Solved;
        debug!(
            iterations = self.stats.iterations,
            length = result.path_length,
            pre_cost = result.pre_cost,
            "search complete"
        );
        Ok(result)
    }

    /// One A* expansion of the cheapest path
    pub fn iterate(&mut self) -> AstarResult<()> {
        let (parent_cost, parent) = self.stack.pop_best().ok_or(AstarError::EmptyStack)?;
        let candidates = self
            .problem
            .best_candidates(self.config.branches_per_iteration, &parent.side_info);
        trace!(
            cost = parent_cost,
            length = parent.length,
            candidates = candidates.len(),
            "expanding path"
        );

        for (rank, &element) in candidates.iter().enumerate() {
            let Some(leaf) = self.trie.add_path(parent.leaf, element) else {
                self.stats.equivalent_branches += 1;
                continue;
            };
            let (cost, child) = self.branch(&parent, leaf, element);

            if rank == 0 {
                self.stack.insert(cost, child);
                self.stats.replaced_branches += 1;
            } else if self.stack.len() <= self.config.max_stack_paths {
                self.stack.insert(cost, child);
                self.stats.added_branches += 1;
            } else {
                match self.stack.worst_cost() {
                    Some(worst) if cost <= worst => {
                        if let Some((_, evicted)) = self.stack.pop_worst() {
                            self.pool.release(evicted.side_info);
                        }
                        self.stack.insert(cost, child);
                        self.stats.added_branches += 1;
                    }
                    _ => {
                        self.pool.release(child.side_info);
                        self.stats.ignored_branches += 1;
                    }
                }
            }
        }

        self.pool.release(parent.side_info);
        Ok(())
    }

    fn expand_until_complete(&mut self) -> AstarResult<()> {
        loop {
            let (_, best) = self.stack.best().ok_or(AstarError::Exhausted)?;
            if self.problem.is_search_complete(best.length, best.pre_cost) {
                return Ok(());
            }
            self.iterate()?;
            self.stats.iterations += 1;
        }
    }

    /// Build the path for one seed, extending from the root element by
    /// element. `None` if every element was rejected by the trie.
    fn seed_path(&mut self, seed: &[ElementId]) -> Option<(f64, Path<P::SideInfo>)> {
        let mut side_info = self.pool.acquire(|| self.problem.new_side_info());
        self.problem.reset_side_info(&mut side_info);
        let mut path = Path {
            leaf: self.trie.root(),
            side_info,
            length: 0,
            pre_cost: self.problem.initial_cost(),
        };
        let mut cost = path.pre_cost;
        let mut realized = false;

        for &element in seed {
            // seeds sharing a prefix (length-2 seeds all start at the DC
            // atom) reuse the node realized by an earlier seed
            let (leaf, fresh) = match self.trie.add_path(path.leaf, element) {
                Some(leaf) => (leaf, true),
                None => match self.trie.find_path(path.leaf, element) {
                    Some(leaf) => (leaf, false),
                    None => continue,
                },
            };
            path.leaf = leaf;
            path.length += 1;
            realized = fresh;
            cost = self.extend_cost(&mut path, element);
        }

        if !realized {
            self.pool.release(path.side_info);
            return None;
        }
        Some((cost, path))
    }

    /// Clone `parent` into a pooled slot and extend the clone by `element`
    fn branch(
        &mut self,
        parent: &Path<P::SideInfo>,
        leaf: NodeId,
        element: ElementId,
    ) -> (f64, Path<P::SideInfo>) {
        let mut side_info = self.pool.acquire(|| self.problem.new_side_info());
        self.problem.copy_side_info(&parent.side_info, &mut side_info);
        let mut child = Path {
            leaf,
            side_info,
            length: parent.length + 1,
            pre_cost: parent.pre_cost,
        };
        let cost = self.extend_cost(&mut child, element);
        (cost, child)
    }

    /// Extend `path`'s side info by `element` and price it against the
    /// pre-cost it had before the extension.
    fn extend_cost(&self, path: &mut Path<P::SideInfo>, element: ElementId) -> f64 {
        let parent_pre_cost = path.pre_cost;
        path.pre_cost = self.problem.pre_cost(&mut path.side_info, element);
        self.cost_model.cost(path.pre_cost, parent_pre_cost, path.length)
    }
}
