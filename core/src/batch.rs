//! Batch reconstruction of many observations
//!
//! One engine and one oracle are reused for the whole batch. Each
//! observation is searched independently; a vector whose search cannot
//! start or runs dry is skipped, anything else aborts the batch.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::{AstarOmpConfig, DictionaryMode};
use crate::error::{AstarError, AstarResult};
use crate::linalg::Dictionary;
use crate::loader::{read_columns, read_matrix, DictionaryStream, VectorWriter};
use crate::omp::{OmpConfig, OmpOracle};
use crate::report::{
    is_exact_recovery, nmse, targets_within_sparsity, BatchReport, Evaluation, ReportParameters,
    SkippedVector,
};
use crate::search::{AStarSearch, SearchConfig, SearchResult};

/// Source of elapsed time for search timing
pub trait Clock {
    /// Time since an arbitrary fixed origin
    fn elapsed(&self) -> Duration;
}

/// Wall clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Receives every reconstructed coefficient vector, in input order
pub trait ReconstructionSink {
    fn accept(&mut self, index: usize, solution: &[f64]) -> AstarResult<()>;
}

impl ReconstructionSink for Vec<Vec<f64>> {
    fn accept(&mut self, _index: usize, solution: &[f64]) -> AstarResult<()> {
        self.push(solution.to_vec());
        Ok(())
    }
}

impl ReconstructionSink for VectorWriter {
    fn accept(&mut self, _index: usize, solution: &[f64]) -> AstarResult<()> {
        self.write_vector(solution)?;
        Ok(())
    }
}

/// Where each observation's dictionary comes from
#[derive(Debug)]
pub enum DictionarySource {
    /// One dictionary for every observation
    Shared(Dictionary),
    /// A fresh dictionary per observation, read in order
    PerVector(DictionaryStream),
}

/// Everything a batch reads from disk
#[derive(Debug)]
pub struct BatchInput {
    pub dictionaries: DictionarySource,
    pub observations: Vec<Vec<f64>>,
    pub targets: Option<Vec<Vec<f64>>>,
}

impl BatchInput {
    /// Read the files named by `config`.
    ///
    /// An unreadable target file only disables evaluation.
    pub fn load(config: &AstarOmpConfig) -> AstarResult<Self> {
        let data = &config.data;
        let dictionaries = match data.dictionary_mode {
            DictionaryMode::Single => {
                let values =
                    read_matrix(&data.dictionary_file, data.dimension, data.dictionary_size)?;
                DictionarySource::Shared(Dictionary::from_columns(data.dimension, values)?)
            }
            DictionaryMode::Multi => DictionarySource::PerVector(DictionaryStream::open(
                &data.dictionary_file,
                data.dimension,
                data.dictionary_size,
            )?),
        };

        let observations = read_columns(&data.measurements_file, data.dimension, data.num_vectors)?;

        let targets = match &data.target_file {
            None => None,
            Some(path) => match read_columns(path, data.dictionary_size, data.num_vectors) {
                Ok(targets) => Some(targets),
                Err(err) => {
                    warn!(error = %err, "continuing without target vectors");
                    None
                }
            },
        };

        info!(
            vectors = observations.len(),
            dimension = data.dimension,
            atoms = data.dictionary_size,
            targets = targets.is_some(),
            "batch input loaded"
        );
        Ok(Self {
            dictionaries,
            observations,
            targets,
        })
    }
}

/// Runs A*OMP over a sequence of observations
pub struct BatchReconstructor<C = SystemClock> {
    search: AStarSearch<OmpOracle>,
    stream: Option<DictionaryStream>,
    clock: C,
    parameters: ReportParameters,
}

impl<C: Clock> BatchReconstructor<C> {
    pub fn new(
        search_config: SearchConfig,
        omp_config: OmpConfig,
        dictionaries: DictionarySource,
        clock: C,
    ) -> AstarResult<Self> {
        let (dictionary, stream) = match dictionaries {
            DictionarySource::Shared(dictionary) => (dictionary, None),
            DictionarySource::PerVector(stream) => {
                // placeholder of the right shape, replaced before every search
                let zeros = vec![0.0; stream.rows() * stream.cols()];
                (Dictionary::from_columns(stream.rows(), zeros)?, Some(stream))
            }
        };
        if search_config.initial_paths > dictionary.len() {
            return Err(AstarError::TooManyInitialPaths {
                requested: search_config.initial_paths,
                available: dictionary.len(),
            });
        }

        let parameters = ReportParameters {
            sparsity: search_config.sparsity,
            tolerance: omp_config.tolerance,
            dictionary_size: dictionary.len(),
            dimension: dictionary.dim(),
            initial_paths: search_config.initial_paths,
            branches_per_iteration: search_config.branches_per_iteration,
            max_stack_paths: search_config.max_stack_paths,
            auxiliary_mode: search_config.cost.mode,
            alpha: search_config.cost.alpha,
            beta: search_config.cost.beta,
        };
        let oracle = OmpOracle::new(omp_config, dictionary)?;
        let search = AStarSearch::new(search_config, oracle)?;
        Ok(Self {
            search,
            stream,
            clock,
            parameters,
        })
    }

    pub fn from_config(
        config: &AstarOmpConfig,
        dictionaries: DictionarySource,
        clock: C,
    ) -> AstarResult<Self> {
        Self::new(config.search_config(), config.omp_config(), dictionaries, clock)
    }

    pub fn search(&self) -> &AStarSearch<OmpOracle> {
        &self.search
    }

    pub fn parameters(&self) -> &ReportParameters {
        &self.parameters
    }

    /// Search one observation against the current dictionary
    pub fn reconstruct(&mut self, y: &[f64]) -> AstarResult<SearchResult> {
        self.search.problem_mut().set_observation(y)?;
        self.search.initialize()?;
        self.search.run()
    }

    /// Reconstruct every observation, handing each solution to `sink`.
    ///
    /// Skipped vectors are written as all-zero so the output stays aligned
    /// with the input.
    pub fn run<S>(
        &mut self,
        observations: &[Vec<f64>],
        targets: Option<&[Vec<f64>]>,
        sink: &mut S,
    ) -> AstarResult<BatchReport>
    where
        S: ReconstructionSink + ?Sized,
    {
        let total = observations.len();
        if let Some(targets) = targets {
            if targets.len() < total {
                return Err(AstarError::DimensionMismatch {
                    what: "target vector count",
                    expected: total,
                    actual: targets.len(),
                });
            }
        }

        let track_exact =
            targets.map_or(false, |t| targets_within_sparsity(t, self.parameters.sparsity));
        if targets.is_some() && !track_exact {
            info!(
                sparsity = self.parameters.sparsity,
                "targets exceed sparsity K, exact recovery rate not computed"
            );
        }

        let mut report = BatchReport::new(self.parameters.clone(), total);
        let empty = vec![0.0; self.parameters.dictionary_size];

        for (index, y) in observations.iter().enumerate() {
            if let Some(stream) = self.stream.as_mut() {
                let values = stream.next_matrix()?;
                let dictionary = Dictionary::from_columns(stream.rows(), values)?;
                self.search.problem_mut().set_dictionary(dictionary)?;
            }

            let started = self.clock.elapsed();
            let outcome = self.reconstruct(y);
            report.total_time += self.clock.elapsed().saturating_sub(started);

            match outcome {
                Ok(result) => {
                    let solution = self.search.problem().solution();
                    sink.accept(index, solution)?;
                    report.reconstructed += 1;
                    report.stats += result.stats;
                    if let Some(target) = targets.map(|t| &t[index]) {
                        report.evaluations.push(Evaluation {
                            nmse: nmse(target, solution),
                            exact: track_exact.then(|| is_exact_recovery(target, solution)),
                        });
                    }
                    debug!(index, support = ?result.support, "vector reconstructed");
                }
                Err(err) if err.is_per_vector() => {
                    warn!(index, error = %err, "skipping vector");
                    sink.accept(index, &empty)?;
                    report.skipped.push(SkippedVector {
                        index,
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }

            if (index + 1) % 20 == 0 {
                info!(done = index + 1, total, "batch progress");
            }
        }

        report.summarize();
        info!(
            reconstructed = report.reconstructed,
            skipped = report.skipped.len(),
            "batch complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{AuxiliaryMode, CostConfig};
    use std::cell::Cell;

    /// Advances by one millisecond on every reading
    struct StepClock {
        ticks: Cell<u64>,
    }

    impl Clock for StepClock {
        fn elapsed(&self) -> Duration {
            let t = self.ticks.get();
            self.ticks.set(t + 1);
            Duration::from_millis(t)
        }
    }

    fn configs(sparsity: usize, tolerance: f64) -> (SearchConfig, OmpConfig) {
        let search = SearchConfig {
            sparsity,
            initial_paths: 1,
            branches_per_iteration: 1,
            max_stack_paths: 4,
            cost: CostConfig {
                mode: AuxiliaryMode::Multiplicative,
                alpha: 0.5,
                beta: 0.0,
            },
        };
        let omp = OmpConfig {
            sparsity,
            tolerance,
            ..OmpConfig::default()
        };
        (search, omp)
    }

    fn batch(dictionary: Dictionary, sparsity: usize, tolerance: f64) -> BatchReconstructor<StepClock> {
        let (search, omp) = configs(sparsity, tolerance);
        let clock = StepClock { ticks: Cell::new(0) };
        BatchReconstructor::new(search, omp, DictionarySource::Shared(dictionary), clock).unwrap()
    }

    #[test]
    fn test_batch_reconstructs_and_evaluates() {
        let mut runner = batch(Dictionary::identity(3), 1, 1e-6);
        let observations = vec![vec![0.0, 5.0, 0.0], vec![-2.0, 0.0, 0.0]];
        let targets = observations.clone();
        let mut out: Vec<Vec<f64>> = Vec::new();

        let report = runner.run(&observations, Some(&targets), &mut out).unwrap();
        assert_eq!(out, observations);
        assert_eq!(report.reconstructed, 2);
        assert_eq!(report.mean_nmse, Some(0.0));
        assert_eq!(report.exact_recoveries, Some(2));
        assert_eq!(report.total_time, Duration::from_millis(2));
    }

    #[test]
    fn test_exhausted_vector_is_skipped() {
        let dictionary =
            Dictionary::from_column_vecs(vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]).unwrap();
        let mut runner = batch(dictionary, 3, 0.0);
        let observations = vec![vec![1.0, 1.0, 1.0], vec![0.0, 2.0, 0.0]];
        let mut out: Vec<Vec<f64>> = Vec::new();

        let report = runner.run(&observations, None, &mut out).unwrap();
        assert_eq!(report.reconstructed, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].index, 0);
        assert_eq!(out, vec![vec![0.0, 0.0], vec![0.0, 2.0]]);
        assert_eq!(report.mean_nmse, None);
    }

    #[test]
    fn test_wrong_observation_length_aborts() {
        let mut runner = batch(Dictionary::identity(3), 1, 1e-6);
        let mut out: Vec<Vec<f64>> = Vec::new();
        let result = runner.run(&[vec![1.0, 2.0]], None, &mut out);
        assert!(matches!(result, Err(AstarError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_dense_targets_disable_exact_tracking() {
        let mut runner = batch(Dictionary::identity(2), 1, 1e-6);
        let observations = vec![vec![3.0, 0.0]];
        let targets = vec![vec![3.0, 1.0]];
        let mut out: Vec<Vec<f64>> = Vec::new();
        let report = runner.run(&observations, Some(&targets), &mut out).unwrap();
        assert_eq!(report.exact_recoveries, None);
        assert!((report.mean_nmse.unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_too_many_initial_paths() {
        let (mut search, omp) = configs(1, 1e-6);
        search.initial_paths = 4;
        let clock = StepClock { ticks: Cell::new(0) };
        let result = BatchReconstructor::new(
            search,
            omp,
            DictionarySource::Shared(Dictionary::identity(3)),
            clock,
        );
        assert!(matches!(
            result,
            Err(AstarError::TooManyInitialPaths { requested: 4, available: 3 })
        ));
    }
}
