//! Per-path QR state owned by the OMP oracle

use crate::trie::ElementId;

/// Incremental QR decomposition of one path's selected atoms.
///
/// `q` holds up to K orthonormal columns of length M back to back. `r` is the
/// upper-triangular factor packed column by column: column `i` has `i + 1`
/// entries starting at offset `i * (i + 1) / 2`, the last one being the
/// diagonal. `z` holds the projections of the observation onto each `q`
/// column. Only the first `support.len()` columns of each buffer are valid.
#[derive(Debug, Clone, PartialEq)]
pub struct SideInfo {
    dim: usize,
    capacity: usize,
    pub(crate) q: Vec<f64>,
    pub(crate) r: Vec<f64>,
    pub(crate) z: Vec<f64>,
    pub(crate) residual: Vec<f64>,
    pub(crate) support: Vec<ElementId>,
}

/// Start of packed column `i` of R
#[inline]
pub(crate) fn tri_offset(i: usize) -> usize {
    i * (i + 1) / 2
}

impl SideInfo {
    /// Allocate buffers for up to `capacity` atoms of length `dim`
    pub fn new(capacity: usize, dim: usize) -> Self {
        Self {
            dim,
            capacity,
            q: vec![0.0; capacity * dim],
            r: vec![0.0; tri_offset(capacity)],
            z: vec![0.0; capacity],
            residual: vec![0.0; dim],
            support: Vec::with_capacity(capacity),
        }
    }

    /// Selected atoms in extension order
    pub fn support(&self) -> &[ElementId] {
        &self.support
    }

    pub fn len(&self) -> usize {
        self.support.len()
    }

    pub fn is_empty(&self) -> bool {
        self.support.is_empty()
    }

    pub fn residual(&self) -> &[f64] {
        &self.residual
    }

    /// Maximum number of atoms this side info can hold
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Packed column `i` of R (its `i + 1` nonzero entries)
    pub fn r_column(&self, i: usize) -> &[f64] {
        &self.r[tri_offset(i)..tri_offset(i + 1)]
    }

    /// Clear the support and restart the residual from `observation`
    pub(crate) fn reset(&mut self, observation: &[f64]) {
        self.support.clear();
        self.residual.clear();
        self.residual.extend_from_slice(observation);
    }

    /// Deep copy of `src` into `self`, reusing allocations
    pub(crate) fn copy_from(&mut self, src: &SideInfo) {
        self.dim = src.dim;
        self.capacity = src.capacity;
        self.q.clone_from(&src.q);
        self.r.clone_from(&src.r);
        self.z.clone_from(&src.z);
        self.residual.clone_from(&src.residual);
        self.support.clone_from(&src.support);
    }
}
