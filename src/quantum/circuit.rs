//! Gate list and dense statevector simulator.
//!
//! Qubit `q` is bit `q` of the basis index (qubit 0 least significant).
//! Multi-qubit operands list their qubits least-significant first, so a
//! target register `[2, 3]` maps local basis value `t` to bits 2 and 3 of
//! the global index.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use num_traits::Zero;

#[derive(Debug, Clone, PartialEq)]
pub enum Gate {
    H(usize),
    /// `matrix` on `targets`, applied where `control` is |1⟩.
    ControlledUnitary {
        control: usize,
        targets: Vec<usize>,
        matrix: DMatrix<Complex64>,
    },
    /// Quantum Fourier transform over `qubits`:
    /// |k⟩ → 2^(-m/2) Σ_y e^(±2πi·k·y/2^m) |y⟩, minus sign when `inverse`.
    Qft { qubits: Vec<usize>, inverse: bool },
    /// RY(`angles[k]`) on `target`, where k is the basis value of `controls`.
    UniformlyControlledRy {
        controls: Vec<usize>,
        target: usize,
        angles: Vec<f64>,
    },
}

impl Gate {
    pub fn inverse(&self) -> Gate {
        match self {
            Gate::H(q) => Gate::H(*q),
            Gate::ControlledUnitary {
                control,
                targets,
                matrix,
            } => Gate::ControlledUnitary {
                control: *control,
                targets: targets.clone(),
                matrix: matrix.adjoint(),
            },
            Gate::Qft { qubits, inverse } => Gate::Qft {
                qubits: qubits.clone(),
                inverse: !inverse,
            },
            Gate::UniformlyControlledRy {
                controls,
                target,
                angles,
            } => Gate::UniformlyControlledRy {
                controls: controls.clone(),
                target: *target,
                angles: angles.iter().map(|a| -a).collect(),
            },
        }
    }

    /// Every qubit the gate touches.
    pub fn qubits(&self) -> Vec<usize> {
        match self {
            Gate::H(q) => vec![*q],
            Gate::ControlledUnitary {
                control, targets, ..
            } => std::iter::once(*control).chain(targets.iter().copied()).collect(),
            Gate::Qft { qubits, .. } => qubits.clone(),
            Gate::UniformlyControlledRy {
                controls, target, ..
            } => controls.iter().copied().chain(std::iter::once(*target)).collect(),
        }
    }
}

/// An ordered list of gates on a fixed number of qubits.
#[derive(Debug, Clone, PartialEq)]
pub struct Circuit {
    num_qubits: usize,
    gates: Vec<Gate>,
}

impl Circuit {
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            gates: Vec::new(),
        }
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Append a gate. Panics if it touches a qubit outside the circuit.
    pub fn push(&mut self, gate: Gate) -> &mut Self {
        if let Some(&q) = gate.qubits().iter().find(|&&q| q >= self.num_qubits) {
            panic!("qubit {} out of range for a {}-qubit circuit", q, self.num_qubits);
        }
        self.gates.push(gate);
        self
    }

    pub fn h(&mut self, qubit: usize) -> &mut Self {
        self.push(Gate::H(qubit))
    }

    pub fn controlled_unitary(
        &mut self,
        control: usize,
        targets: Vec<usize>,
        matrix: DMatrix<Complex64>,
    ) -> &mut Self {
        assert_eq!(
            matrix.nrows(),
            1 << targets.len(),
            "unitary does not match its target register"
        );
        self.push(Gate::ControlledUnitary {
            control,
            targets,
            matrix,
        })
    }

    pub fn qft(&mut self, qubits: Vec<usize>, inverse: bool) -> &mut Self {
        self.push(Gate::Qft { qubits, inverse })
    }

    pub fn uniformly_controlled_ry(
        &mut self,
        controls: Vec<usize>,
        target: usize,
        angles: Vec<f64>,
    ) -> &mut Self {
        assert_eq!(angles.len(), 1 << controls.len(), "one angle per control value");
        self.push(Gate::UniformlyControlledRy {
            controls,
            target,
            angles,
        })
    }

    /// Append every gate of `other` (same qubit numbering).
    pub fn compose(&mut self, other: &Circuit) -> &mut Self {
        for gate in &other.gates {
            self.push(gate.clone());
        }
        self
    }

    /// Adjoint circuit: reversed order, each gate inverted.
    pub fn inverse(&self) -> Circuit {
        Circuit {
            num_qubits: self.num_qubits,
            gates: self.gates.iter().rev().map(Gate::inverse).collect(),
        }
    }

    /// Run from |0…0⟩ and return the final statevector.
    pub fn simulate(&self) -> StateVector {
        let mut state = StateVector::zero(self.num_qubits);
        for gate in &self.gates {
            state.apply(gate);
        }
        state
    }
}

/// Dense 2^n amplitude vector.
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    num_qubits: usize,
    amplitudes: Vec<Complex64>,
}

impl StateVector {
    /// |0…0⟩ on `num_qubits` qubits.
    pub fn zero(num_qubits: usize) -> Self {
        let mut amplitudes = vec![Complex64::zero(); 1 << num_qubits];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self {
            num_qubits,
            amplitudes,
        }
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(|a| a.norm_sqr()).sum()
    }

    pub fn apply(&mut self, gate: &Gate) {
        match gate {
            Gate::H(q) => self.apply_h(*q),
            Gate::ControlledUnitary {
                control,
                targets,
                matrix,
            } => self.apply_controlled_unitary(*control, targets, matrix),
            Gate::Qft { qubits, inverse } => self.apply_qft(qubits, *inverse),
            Gate::UniformlyControlledRy {
                controls,
                target,
                angles,
            } => self.apply_ucry(controls, *target, angles),
        }
    }

    fn apply_h(&mut self, qubit: usize) {
        let bit = 1 << qubit;
        for i in 0..self.amplitudes.len() {
            if i & bit != 0 {
                continue;
            }
            let a0 = self.amplitudes[i];
            let a1 = self.amplitudes[i | bit];
            self.amplitudes[i] = (a0 + a1) * FRAC_1_SQRT_2;
            self.amplitudes[i | bit] = (a0 - a1) * FRAC_1_SQRT_2;
        }
    }

    fn apply_controlled_unitary(
        &mut self,
        control: usize,
        targets: &[usize],
        matrix: &DMatrix<Complex64>,
    ) {
        let control_bit = 1 << control;
        let offsets = register_offsets(targets);
        let mask = register_mask(targets);
        let mut local = DVector::<Complex64>::zeros(offsets.len());

        for base in 0..self.amplitudes.len() {
            if base & mask != 0 || base & control_bit == 0 {
                continue;
            }
            for (t, &off) in offsets.iter().enumerate() {
                local[t] = self.amplitudes[base | off];
            }
            let out = matrix * &local;
            for (t, &off) in offsets.iter().enumerate() {
                self.amplitudes[base | off] = out[t];
            }
        }
    }

    fn apply_qft(&mut self, qubits: &[usize], inverse: bool) {
        let offsets = register_offsets(qubits);
        let mask = register_mask(qubits);
        let dim = offsets.len();
        let sign = if inverse { -1.0 } else { 1.0 };
        let norm = 1.0 / (dim as f64).sqrt();
        let roots: Vec<Complex64> = (0..dim)
            .map(|r| Complex64::from_polar(norm, sign * 2.0 * PI * r as f64 / dim as f64))
            .collect();

        let mut local = vec![Complex64::zero(); dim];
        for base in 0..self.amplitudes.len() {
            if base & mask != 0 {
                continue;
            }
            for (k, &off) in offsets.iter().enumerate() {
                local[k] = self.amplitudes[base | off];
            }
            for (y, &off) in offsets.iter().enumerate() {
                self.amplitudes[base | off] = local
                    .iter()
                    .enumerate()
                    .map(|(k, amp)| amp * roots[(k * y) % dim])
                    .sum();
            }
        }
    }

    fn apply_ucry(&mut self, controls: &[usize], target: usize, angles: &[f64]) {
        let target_bit = 1 << target;
        for i in 0..self.amplitudes.len() {
            if i & target_bit != 0 {
                continue;
            }
            let theta = angles[gather(i, controls)];
            if theta == 0.0 {
                continue;
            }
            let (s, c) = (theta / 2.0).sin_cos();
            let a0 = self.amplitudes[i];
            let a1 = self.amplitudes[i | target_bit];
            self.amplitudes[i] = a0 * c - a1 * s;
            self.amplitudes[i | target_bit] = a0 * s + a1 * c;
        }
    }
}

/// Global index offset of every local basis value of a register.
fn register_offsets(qubits: &[usize]) -> Vec<usize> {
    (0..1usize << qubits.len())
        .map(|local| {
            qubits
                .iter()
                .enumerate()
                .filter(|(pos, _)| local >> pos & 1 == 1)
                .fold(0, |acc, (_, &q)| acc | 1 << q)
        })
        .collect()
}

fn register_mask(qubits: &[usize]) -> usize {
    qubits.iter().fold(0, |acc, &q| acc | 1 << q)
}

/// Local basis value of `qubits` inside global index `index`.
fn gather(index: usize, qubits: &[usize]) -> usize {
    qubits
        .iter()
        .enumerate()
        .fold(0, |acc, (pos, &q)| acc | ((index >> q) & 1) << pos)
}
