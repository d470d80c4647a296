//! Orthogonal matching pursuit oracle
//!
//! Answers the questions the A* engine asks about a path: which atoms are
//! worth trying next, and what the residual norm becomes once an atom is
//! added. Each path carries its own incremental QR decomposition
//! ([`SideInfo`]), so an extension costs one Gram-Schmidt step instead of a
//! fresh least-squares solve.

mod interface;
mod side_info;

pub use side_info::SideInfo;

use crate::error::{AstarError, AstarResult};
use crate::linalg::{self, Dictionary};
use crate::trie::{ElementId, Priority};
use serde::{Deserialize, Serialize};
use side_info::tri_offset;

/// Columns whose orthogonal component falls below this fraction of their
/// norm are treated as linearly dependent on the current support.
const RANK_TOLERANCE: f64 = 1e-12;

/// Parameters of the least-squares side of A*OMP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmpConfig {
    /// Desired sparsity K (hard cap on path length)
    pub sparsity: usize,

    /// Relative residual ε at which a path counts as complete
    pub tolerance: f64,

    /// Length of the seed paths: 1, or 2 with atom 0 fixed first
    pub initial_path_length: usize,

    /// Run a second Gram-Schmidt pass on every extension
    pub reorthogonalize: bool,
}

impl Default for OmpConfig {
    fn default() -> Self {
        Self {
            sparsity: 10,
            tolerance: 1e-6,
            initial_path_length: 1,
            reorthogonalize: false,
        }
    }
}

impl OmpConfig {
    pub fn validate(&self) -> AstarResult<()> {
        if self.sparsity == 0 {
            return Err(AstarError::InvalidConfig(
                "sparsity K must be at least 1".to_string(),
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(AstarError::InvalidConfig(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        if !matches!(self.initial_path_length, 1 | 2) {
            return Err(AstarError::UnsupportedInitialPathLength(
                self.initial_path_length,
            ));
        }
        if self.sparsity < self.initial_path_length {
            return Err(AstarError::InvalidConfig(format!(
                "sparsity K={} is shorter than the initial path length {}",
                self.sparsity, self.initial_path_length
            )));
        }
        Ok(())
    }
}

/// OMP cost oracle over one dictionary and one observation at a time
#[derive(Debug, Clone)]
pub struct OmpOracle {
    config: OmpConfig,
    dictionary: Dictionary,
    observation: Vec<f64>,
    observation_norm: f64,
    solution: Vec<f64>,
}

impl OmpOracle {
    /// Create an oracle over `dictionary`; the observation starts at zero.
    pub fn new(config: OmpConfig, dictionary: Dictionary) -> AstarResult<Self> {
        config.validate()?;
        let dim = dictionary.dim();
        let n = dictionary.len();
        Ok(Self {
            config,
            dictionary,
            observation: vec![0.0; dim],
            observation_norm: 0.0,
            solution: vec![0.0; n],
        })
    }

    pub fn config(&self) -> &OmpConfig {
        &self.config
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Swap in a new dictionary of the same shape; only valid between searches.
    pub fn set_dictionary(&mut self, dictionary: Dictionary) -> AstarResult<()> {
        if dictionary.dim() != self.dictionary.dim() {
            return Err(AstarError::DimensionMismatch {
                what: "dictionary atom length",
                expected: self.dictionary.dim(),
                actual: dictionary.dim(),
            });
        }
        if dictionary.len() != self.dictionary.len() {
            return Err(AstarError::DimensionMismatch {
                what: "dictionary size",
                expected: self.dictionary.len(),
                actual: dictionary.len(),
            });
        }
        self.dictionary = dictionary;
        Ok(())
    }

    pub fn observation(&self) -> &[f64] {
        &self.observation
    }

    pub fn observation_norm(&self) -> f64 {
        self.observation_norm
    }

    /// Install the observation vector y for the next search
    pub fn set_observation(&mut self, y: &[f64]) -> AstarResult<()> {
        if y.len() != self.dictionary.dim() {
            return Err(AstarError::DimensionMismatch {
                what: "observation length",
                expected: self.dictionary.dim(),
                actual: y.len(),
            });
        }
        self.observation.clear();
        self.observation.extend_from_slice(y);
        self.observation_norm = linalg::norm(y);
        Ok(())
    }

    /// Rank every atom by |normalized correlation| to y.
    ///
    /// The most correlated atom gets priority N and the least gets 1, so the
    /// trie root (which holds `Priority::MAX`) always outranks them.
    pub fn compute_priorities(&self) -> Vec<Priority> {
        let n = self.dictionary.len();
        let ranked = self.rank_by_correlation(&self.observation, n);
        let mut priorities = vec![0; n];
        for (rank, &id) in ranked.iter().enumerate() {
            priorities[id] = (n - rank) as Priority;
        }
        priorities
    }

    /// Seed paths for the search.
    ///
    /// Length-1 seeds are the `count` atoms most correlated with y. Length-2
    /// seeds fix atom 0 (the DC term) first and pair it with the `count`
    /// atoms most correlated with y after projecting atom 0 out.
    pub fn find_initial_paths(&self, count: usize) -> AstarResult<Vec<Vec<ElementId>>> {
        let available = self.dictionary.len();
        if count > available {
            return Err(AstarError::TooManyInitialPaths {
                requested: count,
                available,
            });
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        match self.config.initial_path_length {
            1 => Ok(self
                .rank_by_correlation(&self.observation, count)
                .into_iter()
                .map(|id| vec![id])
                .collect()),
            2 => {
                let mut residual = self.observation.clone();
                let dc_norm = self.dictionary.column_norm(0);
                if dc_norm > 0.0 {
                    let dc = self.dictionary.column(0);
                    let scale = linalg::dot(dc, &self.observation) / (dc_norm * dc_norm);
                    linalg::sub_scaled(&mut residual, dc, scale);
                }
                Ok(self
                    .rank_by_correlation(&residual, count)
                    .into_iter()
                    .map(|id| vec![0, id])
                    .collect())
            }
            other => Err(AstarError::UnsupportedInitialPathLength(other)),
        }
    }

    /// Append `element` to the path and return the new residual norm.
    ///
    /// One modified Gram-Schmidt step: the atom is orthogonalized against
    /// the path's current Q columns, normalized into a new column, and the
    /// residual loses its component along that column.
    pub fn extend_path(&self, side: &mut SideInfo, element: ElementId) -> f64 {
        let i = side.support.len();
        if i >= side.capacity() {
            *side = self.grown(side, i + 1);
        }

        let dim = side.dim();
        let column = self.dictionary.column(element);
        let r_start = tri_offset(i);

        let (done, rest) = side.q.split_at_mut(i * dim);
        let qi = &mut rest[..dim];
        qi.copy_from_slice(column);

        for (j, qj) in done.chunks_exact(dim).enumerate() {
            let rji = linalg::dot(qj, qi);
            side.r[r_start + j] = rji;
            linalg::sub_scaled(qi, qj, rji);
        }
        if self.config.reorthogonalize {
            for (j, qj) in done.chunks_exact(dim).enumerate() {
                let correction = linalg::dot(qj, qi);
                side.r[r_start + j] += correction;
                linalg::sub_scaled(qi, qj, correction);
            }
        }

        let diag = linalg::normalize(qi);
        if diag <= RANK_TOLERANCE * self.dictionary.column_norm(element) {
            // dependent on the support: contributes nothing to the fit
            qi.fill(0.0);
            side.r[r_start + i] = 0.0;
            side.z[i] = 0.0;
        } else {
            side.r[r_start + i] = diag;
            let zi = linalg::dot(qi, &side.residual);
            side.z[i] = zi;
            linalg::sub_scaled(&mut side.residual, qi, zi);
        }

        side.support.push(element);
        linalg::norm(&side.residual)
    }

    /// The `count` atoms most correlated with the path's residual, best first
    pub fn find_best_candidates(&self, count: usize, side: &SideInfo) -> Vec<ElementId> {
        self.rank_by_correlation(side.residual(), count)
    }

    /// Coefficients of the path's least-squares fit scattered into a
    /// length-N vector.
    ///
    /// Back-substitutes R c = z from the last selected atom down to the first.
    pub fn solve_coefficients(&self, side: &SideInfo) -> Vec<f64> {
        let mut solution = vec![0.0; self.dictionary.len()];
        let s = side.support.len();
        let mut z = side.z[..s].to_vec();

        for i in (0..s).rev() {
            let column = side.r_column(i);
            let diag = column[i];
            let c = if diag != 0.0 { z[i] / diag } else { 0.0 };
            solution[side.support[i]] = c;
            linalg::sub_scaled(&mut z[..i], &column[..i], c);
        }
        solution
    }

    /// Extract and keep the final solution from the winning path
    pub fn perform_post_operations(&mut self, side: &SideInfo) {
        self.solution = self.solve_coefficients(side);
    }

    /// Solution stored by the last [`Self::perform_post_operations`]
    pub fn solution(&self) -> &[f64] {
        &self.solution
    }

    pub fn allocate_side_info(&self) -> SideInfo {
        SideInfo::new(self.config.sparsity, self.dictionary.dim())
    }

    pub fn duplicate_side_info(&self, src: &SideInfo) -> SideInfo {
        src.clone()
    }

    pub fn copy_side_info(&self, src: &SideInfo, dst: &mut SideInfo) {
        dst.copy_from(src);
    }

    /// Empty the support and restart the residual from y
    pub fn reset_side_info(&self, side: &mut SideInfo) {
        side.reset(&self.observation);
    }

    /// A path is complete at K atoms or once its relative residual is within ε.
    pub fn is_search_complete(&self, path_length: usize, pre_cost: f64) -> bool {
        if path_length >= self.config.sparsity {
            return true;
        }
        if self.observation_norm == 0.0 {
            return true;
        }
        pre_cost / self.observation_norm <= self.config.tolerance
    }

    /// Up to `count` atom ids ordered by descending |normalized correlation|
    /// to `v`; ties go to the lower index.
    fn rank_by_correlation(&self, v: &[f64], count: usize) -> Vec<ElementId> {
        let corr = self.dictionary.normalized_correlations(v);
        let mut ids: Vec<ElementId> = (0..corr.len()).collect();
        let order = |a: &ElementId, b: &ElementId| corr[*b].total_cmp(&corr[*a]).then(a.cmp(b));

        let count = count.min(ids.len());
        if count == 0 {
            return Vec::new();
        }
        if count < ids.len() {
            ids.select_nth_unstable_by(count - 1, order);
            ids.truncate(count);
        }
        ids.sort_unstable_by(order);
        ids
    }

    /// Copy of `side` with room for `capacity` atoms
    fn grown(&self, side: &SideInfo, capacity: usize) -> SideInfo {
        let mut bigger = SideInfo::new(capacity, side.dim());
        bigger.q[..side.q.len()].copy_from_slice(&side.q);
        bigger.r[..side.r.len()].copy_from_slice(&side.r);
        bigger.z[..side.z.len()].copy_from_slice(&side.z);
        bigger.residual.copy_from_slice(&side.residual);
        bigger.support.extend_from_slice(&side.support);
        bigger
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    fn oracle(dictionary: Dictionary, sparsity: usize) -> OmpOracle {
        let config = OmpConfig {
            sparsity,
            tolerance: 1e-6,
            initial_path_length: 1,
            reorthogonalize: false,
        };
        OmpOracle::new(config, dictionary).unwrap()
    }

    fn skewed_dictionary() -> Dictionary {
        Dictionary::from_column_vecs(vec![
            vec![1.0, 0.0, 0.0],
            vec![1.0, 1.0, 0.0],
            vec![0.0, 1.0, 1.0],
            vec![1.0, 1.0, 1.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_config_rejects_initial_length_three() {
        let config = OmpConfig {
            initial_path_length: 3,
            ..OmpConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AstarError::UnsupportedInitialPathLength(3))
        ));
    }

    #[test]
    fn test_config_rejects_seeds_longer_than_sparsity() {
        let config = OmpConfig {
            sparsity: 1,
            initial_path_length: 2,
            ..OmpConfig::default()
        };
        assert!(matches!(config.validate(), Err(AstarError::InvalidConfig(_))));

        let dictionary = Dictionary::from_column_vecs(vec![
            vec![0.5, 0.5, 0.5, 0.5],
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
        ])
        .unwrap();
        assert!(matches!(
            OmpOracle::new(config, dictionary),
            Err(AstarError::InvalidConfig(_))
        ));

        let config = OmpConfig {
            sparsity: 2,
            initial_path_length: 2,
            ..OmpConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_observation_length_checked() {
        let mut omp = oracle(Dictionary::identity(3), 1);
        assert!(omp.set_observation(&[1.0, 2.0]).is_err());
        omp.set_observation(&[3.0, 0.0, 4.0]).unwrap();
        assert_eq!(omp.observation_norm(), 5.0);
    }

    #[test]
    fn test_priorities_follow_correlation() {
        let mut omp = oracle(Dictionary::identity(4), 2);
        omp.set_observation(&[1.0, -5.0, 3.0, 0.5]).unwrap();
        assert_eq!(omp.compute_priorities(), vec![2, 4, 3, 1]);
    }

    #[test]
    fn test_priority_ties_are_deterministic() {
        let mut omp = oracle(Dictionary::identity(3), 1);
        omp.set_observation(&[1.0, 1.0, 1.0]).unwrap();
        assert_eq!(omp.compute_priorities(), vec![3, 2, 1]);
        assert_eq!(omp.compute_priorities(), omp.compute_priorities());
    }

    #[test]
    fn test_initial_paths_length_one() {
        let mut omp = oracle(Dictionary::identity(4), 2);
        omp.set_observation(&[0.1, 2.0, -3.0, 0.0]).unwrap();
        let seeds = omp.find_initial_paths(2).unwrap();
        assert_eq!(seeds, vec![vec![2], vec![1]]);
    }

    #[test]
    fn test_initial_paths_length_two_fix_dc() {
        let dictionary = Dictionary::from_column_vecs(vec![
            vec![1.0, 1.0, 1.0],
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ])
        .unwrap();
        let config = OmpConfig {
            sparsity: 3,
            initial_path_length: 2,
            ..OmpConfig::default()
        };
        let mut omp = OmpOracle::new(config, dictionary).unwrap();
        // y = 2 * dc + 3 * atom 3
        omp.set_observation(&[2.0, 2.0, 5.0]).unwrap();
        let seeds = omp.find_initial_paths(1).unwrap();
        assert_eq!(seeds, vec![vec![0, 3]]);
    }

    #[test]
    fn test_too_many_initial_paths() {
        let mut omp = oracle(Dictionary::identity(2), 1);
        omp.set_observation(&[1.0, 0.0]).unwrap();
        assert!(matches!(
            omp.find_initial_paths(3),
            Err(AstarError::TooManyInitialPaths {
                requested: 3,
                available: 2
            })
        ));
    }

    #[test]
    fn test_extend_identity_drops_to_zero() {
        let mut omp = oracle(Dictionary::identity(3), 1);
        omp.set_observation(&[0.0, 5.0, 0.0]).unwrap();
        let mut side = omp.allocate_side_info();
        omp.reset_side_info(&mut side);
        let pre_cost = omp.extend_path(&mut side, 1);
        assert_close(pre_cost, 0.0);
        assert_eq!(omp.solve_coefficients(&side), vec![0.0, 5.0, 0.0]);
    }

    #[test]
    fn test_extend_matches_projection() {
        let mut omp = oracle(skewed_dictionary(), 3);
        let y = [1.0, 2.0, 3.0];
        omp.set_observation(&y).unwrap();
        let mut side = omp.allocate_side_info();
        omp.reset_side_info(&mut side);

        omp.extend_path(&mut side, 1);
        let pre_cost = omp.extend_path(&mut side, 2);

        // residual must be orthogonal to both selected atoms
        for &id in side.support() {
            assert_close(linalg::dot(omp.dictionary().column(id), side.residual()), 0.0);
        }
        assert_close(pre_cost, linalg::norm(side.residual()));

        // y - D x reproduces the residual
        let x = omp.solve_coefficients(&side);
        let fit = omp.dictionary().synthesize(&x);
        for k in 0..3 {
            assert_close(y[k] - fit[k], side.residual()[k]);
        }
    }

    #[test]
    fn test_full_support_recovers_exactly() {
        let mut omp = oracle(skewed_dictionary(), 3);
        let x_true = [0.0, 2.0, -1.0, 0.5];
        let y = omp.dictionary().synthesize(&x_true);
        omp.set_observation(&y).unwrap();

        let mut side = omp.allocate_side_info();
        omp.reset_side_info(&mut side);
        for id in [3, 1, 2] {
            omp.extend_path(&mut side, id);
        }
        let x = omp.solve_coefficients(&side);
        for k in 0..4 {
            assert_close(x[k], x_true[k]);
        }
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut omp = oracle(skewed_dictionary(), 3);
        omp.set_observation(&[1.0, 2.0, 3.0]).unwrap();

        let mut fresh = omp.allocate_side_info();
        omp.reset_side_info(&mut fresh);
        let expected = omp.extend_path(&mut fresh, 2);

        let mut reused = omp.allocate_side_info();
        omp.reset_side_info(&mut reused);
        omp.extend_path(&mut reused, 0);
        omp.extend_path(&mut reused, 3);
        omp.reset_side_info(&mut reused);
        let again = omp.extend_path(&mut reused, 2);

        assert_close(again, expected);
        assert_eq!(reused.support(), &[2]);
    }

    #[test]
    fn test_dependent_atom_leaves_residual() {
        let dictionary =
            Dictionary::from_column_vecs(vec![vec![1.0, 0.0], vec![2.0, 0.0], vec![0.0, 1.0]])
                .unwrap();
        let mut omp = oracle(dictionary, 3);
        omp.set_observation(&[3.0, 4.0]).unwrap();
        let mut side = omp.allocate_side_info();
        omp.reset_side_info(&mut side);

        let first = omp.extend_path(&mut side, 0);
        let second = omp.extend_path(&mut side, 1);
        assert_close(first, 4.0);
        assert_close(second, 4.0);

        let x = omp.solve_coefficients(&side);
        assert_close(x[0], 3.0);
        assert_eq!(x[1], 0.0);
    }

    #[test]
    fn test_extend_beyond_capacity_grows() {
        let mut omp = oracle(Dictionary::identity(3), 1);
        omp.set_observation(&[1.0, 2.0, 0.0]).unwrap();
        let mut side = omp.allocate_side_info();
        omp.reset_side_info(&mut side);
        omp.extend_path(&mut side, 1);
        let pre_cost = omp.extend_path(&mut side, 0);
        assert_close(pre_cost, 0.0);
        assert_eq!(side.capacity(), 2);
        assert_eq!(omp.solve_coefficients(&side), vec![1.0, 2.0, 0.0]);
    }

    #[test]
    fn test_best_candidates_follow_residual() {
        let mut omp = oracle(Dictionary::identity(4), 2);
        omp.set_observation(&[4.0, 3.0, 2.0, 1.0]).unwrap();
        let mut side = omp.allocate_side_info();
        omp.reset_side_info(&mut side);
        omp.extend_path(&mut side, 0);
        assert_eq!(omp.find_best_candidates(3, &side), vec![1, 2, 3]);
        assert_eq!(omp.find_best_candidates(10, &side).len(), 4);
    }

    #[test]
    fn test_search_complete_predicate() {
        let mut omp = oracle(Dictionary::identity(3), 2);
        omp.set_observation(&[0.0, 3.0, 4.0]).unwrap();
        assert!(!omp.is_search_complete(1, 4.0));
        assert!(omp.is_search_complete(2, 4.0));
        assert!(omp.is_search_complete(1, 0.0));
    }

    #[test]
    fn test_zero_observation_is_complete() {
        let omp = oracle(Dictionary::identity(3), 2);
        assert!(omp.is_search_complete(0, 0.0));
    }

    #[test]
    fn test_reorthogonalization_keeps_results() {
        let config = OmpConfig {
            sparsity: 3,
            reorthogonalize: true,
            ..OmpConfig::default()
        };
        let mut omp = OmpOracle::new(config, skewed_dictionary()).unwrap();
        let x_true = [0.0, 1.0, -2.0, 3.0];
        let y = omp.dictionary().synthesize(&x_true);
        omp.set_observation(&y).unwrap();
        let mut side = omp.allocate_side_info();
        omp.reset_side_info(&mut side);
        for id in [2, 3, 1] {
            omp.extend_path(&mut side, id);
        }
        let x = omp.solve_coefficients(&side);
        for k in 0..4 {
            assert_close(x[k], x_true[k]);
        }
    }

    #[test]
    fn test_dictionary_swap_requires_same_shape() {
        let mut omp = oracle(Dictionary::identity(3), 1);
        assert!(omp.set_dictionary(Dictionary::identity(4)).is_err());
        assert!(omp.set_dictionary(Dictionary::identity(3)).is_ok());
    }
}
