//! Column-major dictionary of atoms

use crate::error::{AstarError, AstarResult};

/// N atoms of length M stored contiguously, one column after another.
///
/// Column norms are computed once when the dictionary is built so that
/// correlation ranking does not recompute them on every query.
#[derive(Debug, Clone, PartialEq)]
pub struct Dictionary {
    dim: usize,
    data: Vec<f64>,
    norms: Vec<f64>,
}

impl Dictionary {
    /// Build from column-concatenated data with atoms of length `dim`
    pub fn from_columns(dim: usize, data: Vec<f64>) -> AstarResult<Self> {
        if dim == 0 {
            return Err(AstarError::InvalidConfig(
                "dictionary atoms must have nonzero length".to_string(),
            ));
        }
        if data.len() % dim != 0 {
            return Err(AstarError::DimensionMismatch {
                what: "dictionary data length",
                expected: data.len() - data.len() % dim,
                actual: data.len(),
            });
        }
        let norms = data.chunks_exact(dim).map(super::norm).collect();
        Ok(Self { dim, data, norms })
    }

    /// Build from individual column vectors, all of the same length
    pub fn from_column_vecs(columns: Vec<Vec<f64>>) -> AstarResult<Self> {
        let dim = columns.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(dim * columns.len());
        for column in columns {
            if column.len() != dim {
                return Err(AstarError::DimensionMismatch {
                    what: "dictionary column",
                    expected: dim,
                    actual: column.len(),
                });
            }
            data.extend(column);
        }
        Self::from_columns(dim, data)
    }

    /// `n x n` identity dictionary (standard basis atoms)
    pub fn identity(n: usize) -> Self {
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            data[i * n + i] = 1.0;
        }
        Self {
            dim: n,
            data,
            norms: vec![1.0; n],
        }
    }

    /// Number of atoms (N)
    pub fn len(&self) -> usize {
        self.norms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.norms.is_empty()
    }

    /// Length of every atom (M)
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn column(&self, id: usize) -> &[f64] {
        &self.data[id * self.dim..(id + 1) * self.dim]
    }

    pub fn column_norm(&self, id: usize) -> f64 {
        self.norms[id]
    }

    pub fn columns(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.dim)
    }

    /// |<column, v>| / ‖column‖ for every atom; zero-norm atoms score 0.
    pub fn normalized_correlations(&self, v: &[f64]) -> Vec<f64> {
        self.columns()
            .zip(&self.norms)
            .map(|(column, &n)| {
                if n > 0.0 {
                    (super::dot(column, v) / n).abs()
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// Dictionary-vector product `D * x` for a length-N coefficient vector
    pub fn synthesize(&self, coefficients: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.dim];
        for (column, &c) in self.columns().zip(coefficients) {
            if c != 0.0 {
                super::sub_scaled(&mut out, column, -c);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_dictionary() {
        let d = Dictionary::identity(3);
        assert_eq!(d.len(), 3);
        assert_eq!(d.dim(), 3);
        assert_eq!(d.column(1), &[0.0, 1.0, 0.0]);
        assert_eq!(d.column_norm(2), 1.0);
    }

    #[test]
    fn test_from_column_vecs_computes_norms() {
        let d = Dictionary::from_column_vecs(vec![vec![3.0, 4.0], vec![0.0, 2.0]]).unwrap();
        assert_eq!(d.column_norm(0), 5.0);
        assert_eq!(d.column_norm(1), 2.0);
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let result = Dictionary::from_column_vecs(vec![vec![1.0, 0.0], vec![1.0]]);
        assert!(matches!(result, Err(AstarError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_data_length_must_divide() {
        assert!(Dictionary::from_columns(2, vec![1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_normalized_correlations() {
        let d = Dictionary::from_column_vecs(vec![vec![2.0, 0.0], vec![0.0, 0.0]]).unwrap();
        let corr = d.normalized_correlations(&[-3.0, 1.0]);
        assert_eq!(corr, vec![3.0, 0.0]);
    }

    #[test]
    fn test_synthesize() {
        let d = Dictionary::identity(3);
        assert_eq!(d.synthesize(&[1.0, 0.0, -2.0]), vec![1.0, 0.0, -2.0]);
    }
}
