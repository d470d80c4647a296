//! [`SearchProblem`] binding for the OMP oracle

use super::{OmpOracle, SideInfo};
use crate::error::AstarResult;
use crate::search::SearchProblem;
use crate::trie::{ElementId, Priority};

impl SearchProblem for OmpOracle {
    type SideInfo = SideInfo;
    type Solution = [f64];

    fn priorities(&self) -> Vec<Priority> {
        self.compute_priorities()
    }

    fn initial_paths(&self, count: usize) -> AstarResult<Vec<Vec<ElementId>>> {
        self.find_initial_paths(count)
    }

    /// The empty path leaves all of y unexplained
    fn initial_cost(&self) -> f64 {
        self.observation_norm()
    }

    fn best_candidates(&self, count: usize, side_info: &SideInfo) -> Vec<ElementId> {
        self.find_best_candidates(count, side_info)
    }

    fn pre_cost(&self, side_info: &mut SideInfo, element: ElementId) -> f64 {
        self.extend_path(side_info, element)
    }

    fn new_side_info(&self) -> SideInfo {
        self.allocate_side_info()
    }

    fn copy_side_info(&self, src: &SideInfo, dst: &mut SideInfo) {
        OmpOracle::copy_side_info(self, src, dst)
    }

    fn reset_side_info(&self, side_info: &mut SideInfo) {
        OmpOracle::reset_side_info(self, side_info)
    }

    fn is_search_complete(&self, path_length: usize, pre_cost: f64) -> bool {
        OmpOracle::is_search_complete(self, path_length, pre_cost)
    }

    fn perform_post_operations(&mut self, side_info: &SideInfo) {
        OmpOracle::perform_post_operations(self, side_info)
    }

    fn solution(&self) -> &[f64] {
        OmpOracle::solution(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::Dictionary;
    use crate::omp::OmpConfig;

    #[test]
    fn test_interface_forwards_to_oracle() {
        let config = OmpConfig {
            sparsity: 1,
            ..OmpConfig::default()
        };
        let mut omp = OmpOracle::new(config, Dictionary::identity(3)).unwrap();
        omp.set_observation(&[0.0, 3.0, 4.0]).unwrap();

        let problem: &mut dyn SearchProblem<SideInfo = SideInfo, Solution = [f64]> = &mut omp;
        assert_eq!(problem.initial_cost(), 5.0);
        assert_eq!(problem.initial_paths(1).unwrap(), vec![vec![2]]);

        let mut side = problem.new_side_info();
        problem.reset_side_info(&mut side);
        assert_eq!(problem.pre_cost(&mut side, 2), 3.0);
        assert!(problem.is_search_complete(1, 3.0));

        problem.perform_post_operations(&side);
        assert_eq!(problem.solution(), &[0.0, 0.0, 4.0]);
    }
}
