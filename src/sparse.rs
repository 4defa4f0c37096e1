//! Small CSC helpers on top of `nalgebra-sparse`.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CscMatrix};

/// Build a square CSC matrix from `(row, col, value)` triplets.
///
/// Duplicate coordinates are summed by the COO → CSC conversion; callers
/// push each coordinate once.
pub fn csc_from_triplets(n: usize, triplets: &[(usize, usize, f64)]) -> CscMatrix<f64> {
    let mut coo = CooMatrix::new(n, n);
    for &(i, j, v) in triplets {
        coo.push(i, j, v);
    }
    CscMatrix::from(&coo)
}

/// xᵀ·A·x.
pub fn quadratic_form(a: &CscMatrix<f64>, x: &DVector<f64>) -> f64 {
    x.dot(&(a * x))
}

/// Stored value at (i, j), zero when absent.
pub fn entry(a: &CscMatrix<f64>, i: usize, j: usize) -> f64 {
    a.get_entry(i, j).map(|e| e.into_value()).unwrap_or(0.0)
}

pub fn is_symmetric(a: &CscMatrix<f64>) -> bool {
    a.nrows() == a.ncols() && a.triplet_iter().all(|(i, j, v)| entry(a, j, i) == *v)
}

pub fn to_dense(a: &CscMatrix<f64>) -> DMatrix<f64> {
    let mut dense = DMatrix::zeros(a.nrows(), a.ncols());
    for (i, j, v) in a.triplet_iter() {
        dense[(i, j)] += *v;
    }
    dense
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CscMatrix<f64> {
        csc_from_triplets(3, &[(0, 0, 2.0), (0, 1, -1.0), (1, 0, -1.0), (1, 1, 2.0), (2, 2, 4.0)])
    }

    #[test]
    fn sparse_product_matches_dense() {
        let a = sample();
        let x = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let dense = to_dense(&a) * &x;
        assert_eq!(&a * &x, dense);
    }

    #[test]
    fn quadratic_form_matches_dense() {
        let a = sample();
        let x = DVector::from_vec(vec![1.0, -1.0, 0.5]);
        let dense = x.dot(&(to_dense(&a) * &x));
        assert!((quadratic_form(&a, &x) - dense).abs() < 1e-12);
    }

    #[test]
    fn entry_defaults_to_zero() {
        let a = sample();
        assert_eq!(entry(&a, 0, 1), -1.0);
        assert_eq!(entry(&a, 0, 2), 0.0);
    }

    #[test]
    fn detects_asymmetry() {
        assert!(is_symmetric(&sample()));
        let skew = csc_from_triplets(2, &[(0, 1, 1.0)]);
        assert!(!is_symmetric(&skew));
    }
}
