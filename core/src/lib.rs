//! A*OMP Core
//!
//! Sparse signal recovery by A* search over support sets, with incremental
//! orthogonal matching pursuit as the cost oracle

pub mod error;
pub mod linalg;  // Dense vector helpers and the column-major dictionary
pub mod trie;    // Priority trie deduplicating explored support sets
pub mod omp;     // Least-squares oracle with incremental QR
pub mod search;  // A* engine, cost models, stack and side-info pool
pub mod config;  // TOML configuration
pub mod loader;  // Matrix files (.bin / .txt)
pub mod batch;   // Batch driver over many observations
pub mod report;  // Evaluation metrics and batch summary

pub use error::{AstarError, AstarResult};
pub use linalg::Dictionary;
pub use trie::{ElementId, NodeId, Priority, PriorityTrie};
pub use omp::{OmpConfig, OmpOracle, SideInfo};
pub use search::{
    AStarSearch, AuxiliaryMode, CostConfig, CostModel, SearchConfig, SearchProblem, SearchResult,
    SearchState, SearchStats,
};
pub use config::{AstarOmpConfig, DictionaryMode};
pub use loader::{DictionaryStream, LoadError, LoadResult, MatrixFormat, VectorWriter};
pub use batch::{BatchInput, BatchReconstructor, Clock, DictionarySource, ReconstructionSink, SystemClock};
pub use report::{BatchReport, Evaluation};
