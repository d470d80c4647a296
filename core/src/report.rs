//! Reconstruction quality metrics and the batch summary

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AstarResult;
use crate::linalg;
use crate::loader::LoadError;
use crate::search::{AuxiliaryMode, SearchStats};

/// Coefficients above this magnitude count as clearly nonzero
const SUPPORT_TOLERANCE: f64 = 2e-6;
/// Target coefficients below this magnitude count as zero
const ZERO_TOLERANCE: f64 = 1e-6;

/// Quality of one reconstruction against its target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// (‖x − x̂‖ / ‖x‖)²
    pub nmse: f64,
    /// `None` when exact recovery is not being tracked
    pub exact: Option<bool>,
}

/// Normalized squared error of `estimate` against `target`.
///
/// A zero target falls back to the plain squared error.
pub fn nmse(target: &[f64], estimate: &[f64]) -> f64 {
    let error = linalg::squared_distance(target, estimate);
    let energy = linalg::dot(target, target);
    if energy > 0.0 {
        error / energy
    } else {
        error
    }
}

/// Whether `estimate` has the sign pattern of `target` on every coefficient
pub fn is_exact_recovery(target: &[f64], estimate: &[f64]) -> bool {
    target.iter().zip(estimate).all(|(&x, &x_hat)| {
        let missed_positive = x > SUPPORT_TOLERANCE && x_hat < SUPPORT_TOLERANCE;
        let missed_negative = x < -SUPPORT_TOLERANCE && x_hat > -SUPPORT_TOLERANCE;
        let spurious = x.abs() < ZERO_TOLERANCE && x_hat.abs() > SUPPORT_TOLERANCE;
        !(missed_positive || missed_negative || spurious)
    })
}

pub fn count_nonzero(v: &[f64]) -> usize {
    v.iter().filter(|x| x.abs() > 0.0).count()
}

/// Whether a sample of the targets (about 20, evenly spaced) is at most
/// `sparsity`-sparse. Exact recovery is only meaningful if so.
pub fn targets_within_sparsity(targets: &[Vec<f64>], sparsity: usize) -> bool {
    let step = (targets.len() / 20).max(1);
    targets
        .iter()
        .step_by(step)
        .all(|x| count_nonzero(x) <= sparsity)
}

/// Parameters echoed into the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportParameters {
    pub sparsity: usize,
    pub tolerance: f64,
    pub dictionary_size: usize,
    pub dimension: usize,
    pub initial_paths: usize,
    pub branches_per_iteration: usize,
    pub max_stack_paths: usize,
    pub auxiliary_mode: AuxiliaryMode,
    pub alpha: f64,
    pub beta: f64,
}

/// A vector the batch could not reconstruct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedVector {
    pub index: usize,
    pub reason: String,
}

/// Summary of a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub parameters: ReportParameters,
    pub total_vectors: usize,
    pub reconstructed: usize,
    pub skipped: Vec<SkippedVector>,
    /// Mean NMSE over evaluated vectors; `None` without targets
    pub mean_nmse: Option<f64>,
    /// Exactly recovered vectors; `None` when not tracked
    pub exact_recoveries: Option<usize>,
    /// Search time summed over all vectors
    pub total_time: Duration,
    /// Counters summed over all reconstructed vectors
    pub stats: SearchStats,
    /// Per-vector evaluations, in input order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evaluations: Vec<Evaluation>,
}

impl BatchReport {
    pub fn new(parameters: ReportParameters, total_vectors: usize) -> Self {
        Self {
            parameters,
            total_vectors,
            reconstructed: 0,
            skipped: Vec::new(),
            mean_nmse: None,
            exact_recoveries: None,
            total_time: Duration::ZERO,
            stats: SearchStats::default(),
            evaluations: Vec::new(),
        }
    }

    /// Exact recovery rate in percent of all vectors
    pub fn exact_recovery_rate(&self) -> Option<f64> {
        let exact = self.exact_recoveries?;
        if self.total_vectors == 0 {
            return None;
        }
        Some(100.0 * exact as f64 / self.total_vectors as f64)
    }

    pub fn mean_time(&self) -> Duration {
        match u32::try_from(self.reconstructed) {
            Ok(n) if n > 0 => self.total_time / n,
            _ => Duration::ZERO,
        }
    }

    /// Counter `value` averaged over reconstructed vectors
    pub fn per_vector(&self, value: u64) -> f64 {
        value as f64 / self.reconstructed.max(1) as f64
    }

    /// Fill the NMSE mean and exact count from `evaluations`
    pub(crate) fn summarize(&mut self) {
        if self.evaluations.is_empty() {
            return;
        }
        let total: f64 = self.evaluations.iter().map(|e| e.nmse).sum();
        self.mean_nmse = Some(total / self.evaluations.len() as f64);
        if self.evaluations.iter().all(|e| e.exact.is_some()) {
            self.exact_recoveries = Some(
                self.evaluations
                    .iter()
                    .filter(|e| e.exact == Some(true))
                    .count(),
            );
        }
    }

    pub fn to_json(&self) -> AstarResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> AstarResult<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?).map_err(|e| LoadError::io(path, e).into())
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.parameters;
        writeln!(f, "ALGORITHM PARAMETERS:")?;
        writeln!(f, "  Max. non-zero components (K): {}", p.sparsity)?;
        writeln!(f, "  Error tolerance (eps): {}", p.tolerance)?;
        writeln!(f, "  Signal length (N): {}", p.dictionary_size)?;
        writeln!(f, "  Observations (M): {}", p.dimension)?;
        writeln!(f, "  Initial paths (I): {}", p.initial_paths)?;
        writeln!(f, "  Branches per iteration (B): {}", p.branches_per_iteration)?;
        writeln!(f, "  Max. paths in stack (P): {}", p.max_stack_paths)?;
        match p.auxiliary_mode {
            AuxiliaryMode::AdaptiveAdditive => {
                writeln!(f, "  Auxiliary function: {} (beta {})", p.auxiliary_mode, p.beta)?
            }
            mode => writeln!(f, "  Auxiliary function: {} (alpha {})", mode, p.alpha)?,
        }

        writeln!(f)?;
        writeln!(f, "RECONSTRUCTION RESULTS:")?;
        writeln!(f, "  Total vectors: {}", self.total_vectors)?;
        writeln!(f, "  Reconstructed: {}", self.reconstructed)?;
        if !self.skipped.is_empty() {
            writeln!(f, "  Skipped: {}", self.skipped.len())?;
        }
        match self.mean_nmse {
            Some(nmse) => writeln!(f, "  Average NMSE: {nmse:.6e}")?,
            None => writeln!(f, "  No target vectors, evaluation not performed")?,
        }
        if let (Some(exact), Some(rate)) = (self.exact_recoveries, self.exact_recovery_rate()) {
            writeln!(f, "  Exactly reconstructed: {exact}")?;
            writeln!(f, "  Exact reconstruction rate: {rate:.2}%")?;
        }

        writeln!(f, "  A* search:")?;
        writeln!(f, "    Total time: {:.3} s", self.total_time.as_secs_f64())?;
        writeln!(f, "    Per vector:")?;
        writeln!(f, "      Time: {:.6} s", self.mean_time().as_secs_f64())?;
        let s = &self.stats;
        writeln!(f, "      Iterations: {:.2}", self.per_vector(s.iterations))?;
        writeln!(f, "      Added branches: {:.2}", self.per_vector(s.added_branches))?;
        writeln!(f, "      Replaced branches: {:.2}", self.per_vector(s.replaced_branches))?;
        writeln!(f, "      Equivalent branches: {:.2}", self.per_vector(s.equivalent_branches))?;
        write!(f, "      Ignored branches: {:.2}", self.per_vector(s.ignored_branches))
    }
}
