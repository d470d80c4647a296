//! Search module - A* over support sets
//!
//! Generic engine, cost-ordered stack and auxiliary cost functions. The
//! engine talks to the numerical side only through [`SearchProblem`].

pub mod astar;
pub mod cost;
pub mod pool;
pub mod problem;
pub mod stack;

pub use astar::{AStarSearch, SearchConfig, SearchResult, SearchState, SearchStats};
pub use cost::{AuxiliaryMode, CostConfig, CostModel};
pub use pool::SideInfoPool;
pub use problem::SearchProblem;
pub use stack::{Path, SearchStack};
