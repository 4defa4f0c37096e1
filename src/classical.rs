//! Conjugate-gradient solve of the segment system.
//!
//! Stops when ‖r‖ ≤ max(rtol·‖b‖, atol). With the default `atol = 0` only the
//! relative criterion applies. Running out of iterations, or meeting a search
//! direction with non-positive curvature, ends the solve with
//! `converged = false` and the current iterate as a best-effort answer.

use nalgebra::DVector;
use nalgebra_sparse::CscMatrix;

/// Stopping criteria for [`conjugate_gradient`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CgConfig {
    /// Relative tolerance on ‖r‖ / ‖b‖.
    pub rtol: f64,
    /// Absolute floor on ‖r‖.
    pub atol: f64,
    /// Iteration cap; `None` means 10·n.
    pub max_iter: Option<usize>,
}

impl Default for CgConfig {
    fn default() -> Self {
        Self {
            rtol: 1e-5,
            atol: 0.0,
            max_iter: None,
        }
    }
}

/// Result of a conjugate-gradient run.
#[derive(Debug, Clone, PartialEq)]
pub struct CgSolution {
    /// Continuous segment activations.
    pub x: DVector<f64>,
    pub iterations: usize,
    /// ‖b − A·x‖ of the returned iterate.
    pub residual_norm: f64,
    /// Whether the tolerance was met. Check this before trusting `x`.
    pub converged: bool,
}

pub fn conjugate_gradient(a: &CscMatrix<f64>, b: &DVector<f64>, config: &CgConfig) -> CgSolution {
    let n = b.len();
    let max_iter = config.max_iter.unwrap_or(10 * n);
    let tolerance = (config.rtol * b.norm()).max(config.atol);

    let mut x = DVector::zeros(n);
    let mut r = b.clone();
    let mut p = r.clone();
    let mut rs_old = r.dot(&r);
    let mut converged = rs_old.sqrt() <= tolerance;
    let mut iterations = 0;

    while !converged && iterations < max_iter {
        let ap = a * &p;
        let curvature = p.dot(&ap);
        if !(curvature > 0.0 && curvature.is_finite()) {
            log::warn!(
                "conjugate gradient breakdown at iteration {}: pᵀAp = {:e}",
                iterations,
                curvature
            );
            break;
        }

        let alpha = rs_old / curvature;
        x.axpy(alpha, &p, 1.0);
        r.axpy(-alpha, &ap, 1.0);
        iterations += 1;

        let rs_new = r.dot(&r);
        if rs_new.sqrt() <= tolerance {
            converged = true;
            rs_old = rs_new;
            break;
        }
        p.axpy(1.0, &r, rs_new / rs_old);
        rs_old = rs_new;
    }

    let residual_norm = rs_old.sqrt();
    log::info!(
        "conjugate gradient: n = {}, {} iterations, residual {:.3e}, converged = {}",
        n,
        iterations,
        residual_norm,
        converged
    );

    CgSolution {
        x,
        iterations,
        residual_norm,
        converged,
    }
}
