//! # track-hhl
//!
//! Particle track reconstruction as a linear system.
//!
//! Hits on consecutive detector modules are joined into candidate segments.
//! Pairs of segments that meet head to tail and are nearly collinear are
//! coupled, giving a sparse symmetric system `A·x = b` whose solution scores
//! each segment. The system is solved either by conjugate gradient or by an
//! HHL circuit run on a dense statevector simulator.
//!
//! ## Pipeline
//!
//! - **generator**: toy straight-line events on a planar detector
//! - **segments**: candidate segments between consecutive modules
//! - **hamiltonian**: sparse `A`, `b` from segment couplings
//! - **classical** / **quantum**: the two solvers
//! - **metrics**: thresholding and truth comparison

pub mod classical;
pub mod error;
pub mod event_model;
pub mod generator;
pub mod hamiltonian;
pub mod metrics;
#[cfg(feature = "quantum")]
pub mod quantum;
pub mod segments;
pub mod sparse;

pub mod prelude {
    pub use crate::classical::*;
    pub use crate::error::TrackError;
    pub use crate::event_model::*;
    pub use crate::generator::*;
    pub use crate::hamiltonian::*;
    pub use crate::metrics::*;
    #[cfg(feature = "quantum")]
    pub use crate::quantum::{HhlOptions, HhlOutcome};
    pub use crate::segments::*;
}
