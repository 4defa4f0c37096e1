//! HHL linear-system solve on the statevector simulator.
//!
//! Register layout, least significant first:
//!
//! ```text
//! qubits 0 .. nb           vector register (|b⟩, later ∝ A⁻¹|b⟩)
//! qubits nb .. nb+nl       clock register (phase estimation)
//! qubit  nb+nl             flag, post-selected on |1⟩
//! ```
//!
//! The circuit is: prepare |b⟩, phase-estimate e^{iAt}, rotate the flag by
//! an amplitude proportional to 1/λ for each clock value, undo the phase
//! estimation. With the flag at |1⟩ and the clock back at |0⟩ the vector
//! register holds `λ_min · A⁻¹|b⟩`.
//!
//! State preparation only covers b ∝ (1, …, 1): every vector qubit gets a
//! Hadamard. The segment Hamiltonian always produces such a b.

use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use nalgebra_sparse::CscMatrix;
use num_complex::Complex64;

use crate::error::{Result, TrackError};
use crate::hamiltonian::LinearSystem;
use crate::quantum::circuit::{Circuit, StateVector};
use crate::sparse;

/// Options for [`solve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HhlOptions {
    /// Target precision; sets a floor of ⌈log2(1/ε)⌉ clock qubits.
    pub epsilon: f64,
    /// Return the circuit without simulating it.
    pub circuit_only: bool,
}

impl Default for HhlOptions {
    fn default() -> Self {
        Self {
            epsilon: 0.01,
            circuit_only: false,
        }
    }
}

impl HhlOptions {
    pub fn circuit_only(mut self) -> Self {
        self.circuit_only = true;
        self
    }
}

#[derive(Debug, Clone)]
pub enum HhlOutcome {
    Circuit(HhlCircuit),
    Solution(DVector<f64>),
}

impl HhlOutcome {
    pub fn into_solution(self) -> Option<DVector<f64>> {
        match self {
            HhlOutcome::Solution(x) => Some(x),
            HhlOutcome::Circuit(_) => None,
        }
    }

    pub fn into_circuit(self) -> Option<HhlCircuit> {
        match self {
            HhlOutcome::Circuit(c) => Some(c),
            HhlOutcome::Solution(_) => None,
        }
    }
}

/// A built HHL circuit plus what is needed to decode its statevector.
#[derive(Debug, Clone)]
pub struct HhlCircuit {
    pub circuit: Circuit,
    pub num_vector_qubits: usize,
    pub num_clock_qubits: usize,
    /// Whether the clock register is read as signed (A has negative eigenvalues).
    pub signed_clock: bool,
    /// Smallest |eigenvalue|; divides the post-selected norm.
    pub scaling: f64,
    pub evolution_time: f64,
    /// Length of the system before upscaling.
    pub original_dim: usize,
    /// ‖b‖ of the right-hand side as given, before upscaling.
    pub b_norm: f64,
}

impl HhlCircuit {
    /// The flag qubit, top of the register.
    pub fn post_select_qubit(&self) -> usize {
        self.num_vector_qubits + self.num_clock_qubits
    }

    pub fn upscaled_dim(&self) -> usize {
        1 << self.num_vector_qubits
    }

    pub fn num_qubits(&self) -> usize {
        self.circuit.num_qubits()
    }

    /// Amplitudes with the flag at |1⟩ and the clock at |0⟩.
    fn post_selected<'s>(&self, state: &'s StateVector) -> &'s [Complex64] {
        let start = 1 << self.post_select_qubit();
        &state.amplitudes()[start..start + self.upscaled_dim()]
    }

    /// ‖A⁻¹·b̂‖ with b̂ the normalised right-hand side.
    pub fn solution_norm(&self, state: &StateVector) -> f64 {
        let probability: f64 = self.post_selected(state).iter().map(|a| a.norm_sqr()).sum();
        probability.sqrt() / self.scaling
    }

    /// Real part of the post-selected block, renormalised, scaled by the
    /// solution norm times ‖b‖ of the original system and truncated to the
    /// original length.
    ///
    /// For a padded system this is `A_up⁻¹·b_up` restricted to the first n
    /// entries, times `‖b‖ / ‖b_up‖`.
    pub fn decode(&self, state: &StateVector) -> DVector<f64> {
        let block = DVector::from_iterator(
            self.upscaled_dim(),
            self.post_selected(state).iter().map(|a| a.re),
        );
        let block_norm = block.norm();
        if block_norm == 0.0 {
            log::warn!("post-selected block is empty; returning a zero solution");
            return DVector::zeros(self.original_dim);
        }
        let x = block * (self.solution_norm(state) * self.b_norm / block_norm);
        x.rows(0, self.original_dim).into_owned()
    }
}

/// Build the HHL circuit for `system` and, unless `circuit_only`, simulate
/// and decode it.
pub fn solve(system: &LinearSystem, options: &HhlOptions) -> Result<HhlOutcome> {
    if !(options.epsilon > 0.0 && options.epsilon < 1.0) {
        return Err(TrackError::InvalidParameter {
            name: "epsilon",
            value: options.epsilon,
        });
    }
    if system.dim() == 0 {
        return Err(TrackError::EmptySystem);
    }

    let hhl = build_circuit(system, options.epsilon)?;
    if options.circuit_only {
        return Ok(HhlOutcome::Circuit(hhl));
    }

    let state = hhl.circuit.simulate();
    let x = hhl.decode(&state);
    log::info!(
        "HHL: {} qubits, {} gates, solution norm {:.4}",
        hhl.num_qubits(),
        hhl.circuit.len(),
        x.norm()
    );
    Ok(HhlOutcome::Solution(x))
}

/// Embed `a` in the next power-of-two size with identity padding and extend
/// `b` by repeating its own leading entries. Powers of two pass through.
pub fn upscale(a: &CscMatrix<f64>, b: &DVector<f64>) -> (CscMatrix<f64>, DVector<f64>) {
    let n = b.len();
    if n == 0 || n.is_power_of_two() {
        return (a.clone(), b.clone());
    }
    let size = n.next_power_of_two();
    let pad = size - n;

    let mut triplets: Vec<(usize, usize, f64)> =
        a.triplet_iter().map(|(i, j, v)| (i, j, *v)).collect();
    triplets.extend((n..size).map(|i| (i, i, 1.0)));

    let extended = DVector::from_iterator(size, b.iter().chain(b.iter().take(pad)).copied());
    (sparse::csc_from_triplets(size, &triplets), extended)
}

/// Hadamard on each of `num_qubits` qubits: the uniform state standing in
/// for an amplitude encoding of b.
pub fn uniform_state_preparation(num_qubits: usize) -> Circuit {
    let mut circuit = Circuit::new(num_qubits);
    for q in 0..num_qubits {
        circuit.h(q);
    }
    circuit
}

fn ceil_log2(x: f64) -> usize {
    x.log2().ceil().max(0.0) as usize
}

/// Build the full HHL circuit for `system` (upscaling included).
pub fn build_circuit(system: &LinearSystem, epsilon: f64) -> Result<HhlCircuit> {
    let original_dim = system.dim();
    let b_norm = system.b.norm();
    let (a, b) = upscale(&system.a, &system.b);
    let dim = b.len();
    let nb = dim.trailing_zeros() as usize;

    if b.iter().any(|&v| (v - b[0]).abs() > 1e-12 * b[0].abs().max(1.0)) {
        log::warn!("right-hand side is not uniform; it is still encoded as the uniform state");
    }

    let eigen = SymmetricEigen::new(sparse::to_dense(&a));
    let (min_abs, max_abs) = eigen
        .eigenvalues
        .iter()
        .fold((f64::INFINITY, 0.0f64), |(lo, hi), &l| (lo.min(l.abs()), hi.max(l.abs())));
    if !(min_abs > 1e-12 * max_abs) {
        return Err(TrackError::SingularMatrix {
            min_abs_eigenvalue: min_abs,
        });
    }
    let signed_clock = eigen.eigenvalues.iter().any(|&l| l < 0.0);
    let sign_bits = usize::from(signed_clock);

    let kappa = max_abs / min_abs;
    let nl = (nb + 1)
        .max(ceil_log2(kappa + 1.0))
        .max(ceil_log2(1.0 / epsilon))
        + sign_bits;
    let magnitude_levels = 1usize << (nl - sign_bits);

    // Largest clock value the smallest eigenvalue can map to without the
    // largest one overflowing the magnitude bits.
    let mut lambda_min_tilde = min_abs * (magnitude_levels as f64 - 1.0) / max_abs;
    if (lambda_min_tilde - 1.0).abs() < 1e-7 {
        lambda_min_tilde = 1.0;
    }
    let delta = lambda_min_tilde.floor() / magnitude_levels as f64;
    let evolution_time = 2.0 * PI * delta / min_abs / (1 << sign_bits) as f64;

    log::debug!(
        "HHL registers: nb = {}, nl = {}, kappa = {:.3}, delta = {:.4}, t = {:.4}",
        nb,
        nl,
        kappa,
        delta,
        evolution_time
    );

    let vector: Vec<usize> = (0..nb).collect();
    let clock: Vec<usize> = (nb..nb + nl).collect();
    let flag = nb + nl;

    let mut phase_estimation = Circuit::new(nb + nl + 1);
    for &q in &clock {
        phase_estimation.h(q);
    }
    for (j, &q) in clock.iter().enumerate() {
        let power = (1u64 << j) as f64;
        phase_estimation.controlled_unitary(
            q,
            vector.clone(),
            evolution(&eigen, evolution_time * power),
        );
    }
    phase_estimation.qft(clock.clone(), true);

    let angles = reciprocal_angles(nl, delta * magnitude_levels as f64, signed_clock);

    let mut circuit = Circuit::new(nb + nl + 1);
    circuit.compose(&uniform_state_preparation(nb));
    circuit.compose(&phase_estimation);
    circuit.uniformly_controlled_ry(clock, flag, angles);
    circuit.compose(&phase_estimation.inverse());

    Ok(HhlCircuit {
        circuit,
        num_vector_qubits: nb,
        num_clock_qubits: nl,
        signed_clock,
        scaling: min_abs,
        evolution_time,
        original_dim,
        b_norm,
    })
}

/// e^{iAτ} from the eigendecomposition A = V·diag(λ)·Vᵀ.
fn evolution(eigen: &SymmetricEigen<f64, nalgebra::Dyn>, tau: f64) -> DMatrix<Complex64> {
    let v = eigen.eigenvectors.map(|x| Complex64::new(x, 0.0));
    let phases = DVector::from_iterator(
        eigen.eigenvalues.len(),
        eigen.eigenvalues.iter().map(|&l| Complex64::from_polar(1.0, l * tau)),
    );
    &v * DMatrix::from_diagonal(&phases) * v.transpose()
}

/// Flag rotation per clock value k: amplitude `c / k` on |1⟩, where k is
/// read in two's complement when `signed`. Values with |c / k| > 1 (and
/// k = 0) are left unrotated.
fn reciprocal_angles(nl: usize, c: f64, signed: bool) -> Vec<f64> {
    let levels = 1usize << nl;
    (0..levels)
        .map(|k| {
            let value = if signed && k >= levels / 2 {
                k as f64 - levels as f64
            } else {
                k as f64
            };
            if value == 0.0 {
                return 0.0;
            }
            let ratio = c / value;
            if (ratio.abs() - 1.0).abs() < 1e-5 {
                PI * ratio.signum()
            } else if ratio.abs() < 1.0 {
                2.0 * ratio.asin()
            } else {
                0.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classical::{conjugate_gradient, CgConfig};
    use crate::sparse::{csc_from_triplets, entry};

    fn system(n: usize, triplets: &[(usize, usize, f64)], b: f64) -> LinearSystem {
        LinearSystem {
            a: csc_from_triplets(n, triplets),
            b: DVector::from_element(n, b),
        }
    }

    /// Block [[3, -1], [-1, 3]] plus isolated 3s: the shape of a two-track event.
    fn segment_like(n: usize) -> LinearSystem {
        let mut t: Vec<(usize, usize, f64)> = (0..n).map(|i| (i, i, 3.0)).collect();
        t.extend([(0, 1, -1.0), (1, 0, -1.0)]);
        system(n, &t, 1.0)
    }

    #[test]
    fn upscale_leaves_powers_of_two_alone() {
        let sys = segment_like(4);
        let (a, b) = upscale(&sys.a, &sys.b);
        assert_eq!(a, sys.a);
        assert_eq!(b, sys.b);
    }

    #[test]
    fn upscale_pads_with_identity_and_repeats_b_prefix() {
        let a = csc_from_triplets(3, &[(0, 0, 2.0), (0, 1, -1.0), (1, 0, -1.0), (1, 1, 2.0), (2, 2, 5.0)]);
        let b = DVector::from_vec(vec![7.0, 8.0, 9.0]);
        let (a_up, b_up) = upscale(&a, &b);
        assert_eq!(a_up.nrows(), 4);
        assert_eq!(entry(&a_up, 3, 3), 1.0);
        for i in 0..3 {
            assert_eq!(entry(&a_up, i, 3), 0.0);
            assert_eq!(entry(&a_up, 3, i), 0.0);
            for j in 0..3 {
                assert_eq!(entry(&a_up, i, j), entry(&a, i, j));
            }
        }
        assert_eq!(b_up.as_slice(), &[7.0, 8.0, 9.0, 7.0]);

        let b5 = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let a5 = csc_from_triplets(5, &(0..5).map(|i| (i, i, 1.0)).collect::<Vec<_>>());
        let (a8, b8) = upscale(&a5, &b5);
        assert_eq!(a8.nrows(), 8);
        assert_eq!(b8.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn reciprocal_angles_encode_c_over_k() {
        let angles = reciprocal_angles(3, 2.0, false);
        assert_eq!(angles.len(), 8);
        assert_eq!(angles[0], 0.0);
        assert_eq!(angles[1], 0.0, "c/k > 1 is not rotated");
        assert!((angles[2] - PI).abs() < 1e-12);
        assert!(((angles[4] / 2.0).sin() - 0.5).abs() < 1e-12);

        let signed = reciprocal_angles(3, 1.0, true);
        // k = 6 reads as -2.
        assert!(((signed[6] / 2.0).sin() + 0.5).abs() < 1e-12);
    }

    #[test]
    fn register_layout_and_post_select_qubit() {
        let sys = segment_like(8);
        let hhl = build_circuit(&sys, 0.01).unwrap();
        assert_eq!(hhl.num_vector_qubits, 3);
        // max(nb + 1, ceil(log2(κ + 1)), ceil(log2(100))) = 7
        assert_eq!(hhl.num_clock_qubits, 7);
        assert_eq!(hhl.post_select_qubit(), 10);
        assert_eq!(hhl.num_qubits(), 11);
        assert!(!hhl.signed_clock);
        assert!((hhl.scaling - 2.0).abs() < 1e-9);
    }

    #[test]
    fn circuit_only_skips_simulation() {
        let sys = segment_like(4);
        let outcome = solve(&sys, &HhlOptions::default().circuit_only()).unwrap();
        let hhl = outcome.into_circuit().expect("circuit requested");
        assert!(!hhl.circuit.is_empty());
        assert_eq!(hhl.upscaled_dim(), 4);
    }

    #[test]
    fn matches_classical_solution_on_segment_shaped_system() {
        let sys = segment_like(8);
        let x = solve(&sys, &HhlOptions::default()).unwrap().into_solution().unwrap();
        assert_eq!(x.len(), 8);
        assert!((x[0] - 0.5).abs() < 0.03, "coupled entry {}", x[0]);
        assert!((x[1] - 0.5).abs() < 0.03, "coupled entry {}", x[1]);
        for i in 2..8 {
            assert!((x[i] - 1.0 / 3.0).abs() < 0.03, "isolated entry {} = {}", i, x[i]);
        }
    }

    #[test]
    fn exact_eigenvalues_give_exact_solution_after_upscaling() {
        // Eigenvalues {1 (padding), 2, 3, 4} all land on integer clock values.
        let sys = segment_like(6);
        let hhl = build_circuit(&sys, 0.01).unwrap();
        assert!((hhl.b_norm - sys.b.norm()).abs() < 1e-12);
        let x = hhl.decode(&hhl.circuit.simulate());
        assert_eq!(x.len(), 6, "decoded length must be the pre-upscaling length");

        let (a_up, b_up) = upscale(&sys.a, &sys.b);
        let reference = conjugate_gradient(
            &a_up,
            &b_up,
            &CgConfig {
                rtol: 1e-12,
                ..CgConfig::default()
            },
        );
        // Scaled by the original ‖b‖, not the padded one.
        let scale = sys.b.norm() / b_up.norm();
        assert!((scale - (6.0f64 / 8.0).sqrt()).abs() < 1e-12);
        for i in 0..6 {
            let expected = reference.x[i] * scale;
            assert!(
                (x[i] - expected).abs() < 1e-6,
                "entry {}: hhl {} vs scaled cg {}",
                i,
                x[i],
                expected
            );
        }
        assert!((x[0] - 0.5 * scale).abs() < 1e-6);
        assert!((x[2] - scale / 3.0).abs() < 1e-6);
    }

    #[test]
    fn handles_negative_eigenvalues() {
        let sys = LinearSystem {
            a: csc_from_triplets(2, &[(0, 0, 2.0), (1, 1, -1.0)]),
            b: DVector::from_element(2, 1.0),
        };
        let hhl = build_circuit(&sys, 0.1).unwrap();
        assert!(hhl.signed_clock);
        let x = hhl.decode(&hhl.circuit.simulate());
        assert!((x[0] - 0.5).abs() < 1e-6, "x0 = {}", x[0]);
        assert!((x[1] + 1.0).abs() < 1e-6, "x1 = {}", x[1]);
    }

    #[test]
    fn singular_and_empty_systems_are_rejected() {
        let singular = system(2, &[(0, 0, 1.0)], 1.0);
        assert!(matches!(
            solve(&singular, &HhlOptions::default()),
            Err(TrackError::SingularMatrix { .. })
        ));
        let empty = system(0, &[], 1.0);
        assert_eq!(
            solve(&empty, &HhlOptions::default()).unwrap_err(),
            TrackError::EmptySystem
        );
        let bad = HhlOptions {
            epsilon: 0.0,
            ..HhlOptions::default()
        };
        assert!(matches!(
            solve(&segment_like(2), &bad),
            Err(TrackError::InvalidParameter { name: "epsilon", .. })
        ));
    }
}
