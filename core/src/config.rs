//! TOML configuration for a batch reconstruction
//!
//! ```toml
//! [search]
//! sparsity = 10
//! tolerance = 1e-6
//! alpha = 0.8
//! initial_paths = 3
//! branches_per_iteration = 3
//! max_stack_paths = 200
//! auxiliary_mode = "MUL"
//!
//! [data]
//! dimension = 64
//! dictionary_size = 256
//! num_vectors = 100
//! dictionary_file = "dict.bin"
//! measurements_file = "y.bin"
//! target_file = "x.bin"
//!
//! [output]
//! reconstruction_file = "x_rec.bin"
//! report_file = "report.json"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AstarError, AstarResult};
use crate::omp::OmpConfig;
use crate::search::{AuxiliaryMode, CostConfig, SearchConfig};

/// Complete configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstarOmpConfig {
    #[serde(default)]
    pub search: SearchSection,
    pub data: DataSection,
    pub output: OutputSection,
}

/// `[search]`: A* and OMP parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    /// K
    pub sparsity: usize,
    /// ε, relative residual at which a path is complete
    pub tolerance: f64,
    pub alpha: f64,
    pub beta: f64,
    /// I
    pub initial_paths: usize,
    /// B
    pub branches_per_iteration: usize,
    /// P
    pub max_stack_paths: usize,
    pub initial_path_length: usize,
    pub auxiliary_mode: AuxiliaryMode,
    pub reorthogonalize: bool,
}

impl Default for SearchSection {
    fn default() -> Self {
        let search = SearchConfig::default();
        let omp = OmpConfig::default();
        Self {
            sparsity: search.sparsity,
            tolerance: omp.tolerance,
            alpha: search.cost.alpha,
            beta: search.cost.beta,
            initial_paths: search.initial_paths,
            branches_per_iteration: search.branches_per_iteration,
            max_stack_paths: search.max_stack_paths,
            initial_path_length: omp.initial_path_length,
            auxiliary_mode: search.cost.mode,
            reorthogonalize: omp.reorthogonalize,
        }
    }
}

/// Whether all observations share one dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DictionaryMode {
    #[default]
    Single,
    /// One dictionary per observation, read in order from one file
    Multi,
}

/// `[data]`: problem sizes and input files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSection {
    /// M, length of each observation and atom
    pub dimension: usize,
    /// N, number of atoms
    pub dictionary_size: usize,
    pub num_vectors: usize,
    pub dictionary_file: PathBuf,
    pub measurements_file: PathBuf,
    /// Ground-truth coefficient vectors, enables evaluation
    #[serde(default)]
    pub target_file: Option<PathBuf>,
    #[serde(default)]
    pub dictionary_mode: DictionaryMode,
}

/// `[output]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSection {
    /// Reconstructed vectors; text when the name ends in `.txt`
    pub reconstruction_file: PathBuf,
    /// JSON batch report
    #[serde(default)]
    pub report_file: Option<PathBuf>,
}

impl AstarOmpConfig {
    /// Load and validate a config file.
    ///
    /// Relative file paths inside it are resolved against the file's
    /// directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> AstarResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| AstarError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate without touching the file system
    pub fn from_toml_str(text: &str) -> AstarResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> AstarResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AstarError::InvalidConfig(format!("cannot serialize config: {e}")))
    }

    /// Prefix every relative file path with `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.data.dictionary_file);
        resolve(&mut self.data.measurements_file);
        if let Some(target) = self.data.target_file.as_mut() {
            resolve(target);
        }
        resolve(&mut self.output.reconstruction_file);
        if let Some(report) = self.output.report_file.as_mut() {
            resolve(report);
        }
    }

    pub fn validate(&self) -> AstarResult<()> {
        let data = &self.data;
        if data.dimension == 0 {
            return Err(AstarError::InvalidConfig("dimension must be positive".into()));
        }
        if data.dictionary_size == 0 {
            return Err(AstarError::InvalidConfig("dictionary_size must be positive".into()));
        }
        if data.num_vectors == 0 {
            return Err(AstarError::InvalidConfig("num_vectors must be positive".into()));
        }
        if self.search.initial_paths > data.dictionary_size {
            return Err(AstarError::TooManyInitialPaths {
                requested: self.search.initial_paths,
                available: data.dictionary_size,
            });
        }
        self.search_config().validate()?;
        self.omp_config().validate()
    }

    pub fn search_config(&self) -> SearchConfig {
        let s = &self.search;
        SearchConfig {
            sparsity: s.sparsity,
            initial_paths: s.initial_paths,
            branches_per_iteration: s.branches_per_iteration,
            max_stack_paths: s.max_stack_paths,
            cost: CostConfig {
                mode: s.auxiliary_mode,
                alpha: s.alpha,
                beta: s.beta,
            },
        }
    }

    pub fn omp_config(&self) -> OmpConfig {
        let s = &self.search;
        OmpConfig {
            sparsity: s.sparsity,
            tolerance: s.tolerance,
            initial_path_length: s.initial_path_length,
            reorthogonalize: s.reorthogonalize,
        }
    }
}
