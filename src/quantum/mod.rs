//! Quantum solve path: a small statevector simulator and the HHL circuit
//! built on it.

pub mod circuit;
pub mod hhl;

pub use circuit::{Circuit, Gate, StateVector};
pub use hhl::{upscale, uniform_state_preparation, HhlCircuit, HhlOptions, HhlOutcome};
