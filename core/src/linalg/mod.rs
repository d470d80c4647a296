//! Dense linear algebra primitives
//!
//! Small slice kernels used by the OMP oracle, plus the column-major
//! [`Dictionary`] that holds the candidate atoms.

mod dictionary;

pub use dictionary::Dictionary;

/// Inner product of two equally sized slices
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Euclidean norm
#[inline]
pub fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

/// `dst -= scale * src`
#[inline]
pub fn sub_scaled(dst: &mut [f64], src: &[f64], scale: f64) {
    debug_assert_eq!(dst.len(), src.len());
    for (d, s) in dst.iter_mut().zip(src) {
        *d -= scale * s;
    }
}

/// Scale `v` to unit length in place and return its previous norm.
///
/// A zero vector is left untouched and 0.0 is returned.
pub fn normalize(v: &mut [f64]) -> f64 {
    let n = norm(v);
    if n > 0.0 {
        for x in v.iter_mut() {
            *x /= n;
        }
    }
    n
}

/// Squared Euclidean distance between two slices
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
