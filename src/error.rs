//! Error type shared by the Hamiltonian, the solvers and the generator.

use thiserror::Error;

/// Failures surfaced by track reconstruction.
///
/// Numerical non-convergence of the classical solver is not an error: it is
/// reported through [`crate::classical::CgSolution::converged`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    /// A solve or evaluate call happened before `construct_hamiltonian`.
    #[error("hamiltonian not initialised: call construct_hamiltonian first")]
    Uninitialized,

    #[error("solution has {got} entries but the hamiltonian has {expected} segments")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("parameter {name} is out of range: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// The event produced no segments, so there is nothing to encode.
    #[error("linear system is empty")]
    EmptySystem,

    #[error("matrix is singular (smallest |eigenvalue| = {min_abs_eigenvalue:e})")]
    SingularMatrix { min_abs_eigenvalue: f64 },

    #[error("detector geometry columns differ in length: {lengths:?}")]
    GeometryMismatch { lengths: [usize; 4] },
}

pub type Result<T> = std::result::Result<T, TrackError>;
