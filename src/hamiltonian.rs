//! Segment Hamiltonian: the quadratic objective whose minimiser selects
//! track segments.
//!
//! For n candidate segments the constructor builds
//!
//! ```text
//! A = −(−(δ+γ)·I + C),   b = δ·1
//! ```
//!
//! where `C[i,j] = C[j,i] = 1` when segment j starts at the hit where
//! segment i ends and the two are collinear within ε (|cos − 1| < ε).
//! The relaxed activation solves `A·x = b`; the energy of a candidate `x`
//! is `−½·xᵀAx + bᵀx`.

use nalgebra::DVector;
use nalgebra_sparse::CscMatrix;
use smallvec::SmallVec;
use std::collections::HashMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::classical::{conjugate_gradient, CgConfig, CgSolution};
use crate::error::{Result, TrackError};
use crate::event_model::{Event, HitId, Segment};
use crate::segments::SegmentSet;
use crate::sparse;

/// Capability shared by every segment-coupling scheme.
pub trait Hamiltonian {
    /// Build (or rebuild) `A` and `b` for `event` and return them.
    fn construct_hamiltonian(&mut self, event: &Event) -> &LinearSystem;

    /// Energy `−½·xᵀAx + bᵀx` of a column vector.
    fn evaluate_column(&self, solution: &DVector<f64>) -> Result<f64>;

    /// Energy of a flat sequence, reshaped into a column first.
    fn evaluate(&self, solution: &[f64]) -> Result<f64> {
        self.evaluate_column(&DVector::from_column_slice(solution))
    }
}

/// Collinearity tolerance and penalty weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HamiltonianParams {
    /// Tolerance on |cos − 1| for two joined segments to couple.
    pub epsilon: f64,
    /// Diagonal penalty component.
    pub gamma: f64,
    /// Diagonal penalty and bias component.
    pub delta: f64,
}

impl HamiltonianParams {
    pub fn new(epsilon: f64, gamma: f64, delta: f64) -> Result<Self> {
        let params = Self {
            epsilon,
            gamma,
            delta,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("epsilon", self.epsilon),
            ("gamma", self.gamma),
            ("delta", self.delta),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(TrackError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}

impl Default for HamiltonianParams {
    fn default() -> Self {
        Self {
            epsilon: 1e-5,
            gamma: 2.0,
            delta: 1.0,
        }
    }
}

/// The constructed system `A·x = b`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSystem {
    pub a: CscMatrix<f64>,
    pub b: DVector<f64>,
}

impl LinearSystem {
    pub fn dim(&self) -> usize {
        self.b.len()
    }
}

/// Nearest-neighbour collinearity Hamiltonian.
///
/// Segments are built on the first `construct_hamiltonian` call and reused
/// afterwards; call [`SimpleHamiltonian::clear`] before feeding a new event.
#[derive(Debug, Clone)]
pub struct SimpleHamiltonian {
    params: HamiltonianParams,
    segments: Option<SegmentSet>,
    system: Option<LinearSystem>,
}

impl SimpleHamiltonian {
    pub fn new(params: HamiltonianParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            segments: None,
            system: None,
        })
    }

    pub fn params(&self) -> &HamiltonianParams {
        &self.params
    }

    /// Flat segment list in construction order (empty before construction).
    pub fn segments(&self) -> &[Segment] {
        self.segments
            .as_ref()
            .map(|s| s.segments.as_slice())
            .unwrap_or(&[])
    }

    pub fn segment_set(&self) -> Option<&SegmentSet> {
        self.segments.as_ref()
    }

    pub fn n_segments(&self) -> usize {
        self.segments().len()
    }

    pub fn system(&self) -> Result<&LinearSystem> {
        self.system.as_ref().ok_or(TrackError::Uninitialized)
    }

    /// Drop the cached segments and system.
    pub fn clear(&mut self) {
        self.segments = None;
        self.system = None;
    }

    /// Conjugate gradient with the default tolerances (rtol 1e-5, atol 0).
    pub fn solve_classically(&self) -> Result<CgSolution> {
        self.solve_classically_with(&CgConfig::default())
    }

    pub fn solve_classically_with(&self, config: &CgConfig) -> Result<CgSolution> {
        let system = self.system()?;
        let solution = conjugate_gradient(&system.a, &system.b, config);
        if !solution.converged {
            log::warn!(
                "conjugate gradient stopped after {} iterations without converging (residual {:.3e})",
                solution.iterations,
                solution.residual_norm
            );
        }
        Ok(solution)
    }

    /// Solve the system with the HHL circuit on the statevector simulator.
    #[cfg(feature = "quantum")]
    pub fn solve_hhl(
        &self,
        options: &crate::quantum::HhlOptions,
    ) -> Result<crate::quantum::HhlOutcome> {
        crate::quantum::hhl::solve(self.system()?, options)
    }
}

impl Hamiltonian for SimpleHamiltonian {
    fn construct_hamiltonian(&mut self, event: &Event) -> &LinearSystem {
        let set = self
            .segments
            .get_or_insert_with(|| SegmentSet::build(event));
        let system = build_system(&self.params, set);
        self.system.insert(system)
    }

    fn evaluate_column(&self, solution: &DVector<f64>) -> Result<f64> {
        let system = self.system()?;
        if solution.len() != system.dim() {
            return Err(TrackError::DimensionMismatch {
                expected: system.dim(),
                got: solution.len(),
            });
        }
        Ok(-0.5 * sparse::quadratic_form(&system.a, solution) + system.b.dot(solution))
    }
}

fn build_system(params: &HamiltonianParams, set: &SegmentSet) -> LinearSystem {
    let n = set.len();
    let couplings = find_couplings(set, params.epsilon);
    log::debug!("{} segments, {} collinear couplings", n, couplings.len());

    let mut triplets = Vec::with_capacity(n + 2 * couplings.len());
    let diagonal = -(params.delta + params.gamma);
    triplets.extend((0..n).map(|i| (i, i, diagonal)));
    for &(i, j) in &couplings {
        triplets.push((i, j, 1.0));
        triplets.push((j, i, 1.0));
    }
    // Sign flip into the minimisation form.
    for triplet in &mut triplets {
        triplet.2 = -triplet.2;
    }

    LinearSystem {
        a: sparse::csc_from_triplets(n, &triplets),
        b: DVector::from_element(n, params.delta),
    }
}

/// Coupled `(i, j)` segment-id pairs, in group order.
fn find_couplings(set: &SegmentSet, epsilon: f64) -> Vec<(usize, usize)> {
    let pairs: Vec<(&[Segment], &[Segment])> = set.consecutive_groups().collect();

    #[cfg(feature = "parallel")]
    let per_pair: Vec<Vec<(usize, usize)>> = pairs
        .par_iter()
        .map(|&(current, next)| couple_groups(current, next, epsilon))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let per_pair: Vec<Vec<(usize, usize)>> = pairs
        .iter()
        .map(|&(current, next)| couple_groups(current, next, epsilon))
        .collect();

    per_pair.into_iter().flatten().collect()
}

/// Couplings between one group and the next.
///
/// The next group is indexed by its originating hit so only joined pairs
/// reach the cosine test.
fn couple_groups(current: &[Segment], next: &[Segment], epsilon: f64) -> Vec<(usize, usize)> {
    let mut starting_at: HashMap<HitId, SmallVec<[usize; 8]>> = HashMap::new();
    for (pos, seg) in next.iter().enumerate() {
        starting_at.entry(seg.hit_from.hit_id).or_default().push(pos);
    }

    let mut couplings = Vec::new();
    for seg_i in current {
        let Some(candidates) = starting_at.get(&seg_i.hit_to.hit_id) else {
            continue;
        };
        for &pos in candidates {
            let seg_j = &next[pos];
            debug_assert!(seg_i.joins(seg_j));
            if (seg_i.cosine(seg_j) - 1.0).abs() < epsilon {
                couplings.push((seg_i.segment_id.0, seg_j.segment_id.0));
            }
        }
    }
    couplings
}
