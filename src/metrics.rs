//! Thresholding a continuous solution and scoring it against truth.

use std::fmt;

use crate::error::{Result, TrackError};

/// Threshold used when reading segments off a solution vector.
pub const DEFAULT_THRESHOLD: f64 = 0.45;

/// `x[i] > threshold` per segment.
pub fn discretise(x: &[f64], threshold: f64) -> Vec<bool> {
    x.iter().map(|&v| v > threshold).collect()
}

pub fn count_mismatches(discrete: &[bool], truth: &[bool]) -> Result<usize> {
    if discrete.len() != truth.len() {
        return Err(TrackError::DimensionMismatch {
            expected: truth.len(),
            got: discrete.len(),
        });
    }
    Ok(discrete.iter().zip(truth).filter(|(d, t)| d != t).count())
}

/// Mismatch summary of one solution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolutionReport {
    pub n_segments: usize,
    /// Segments selected (above threshold).
    pub n_selected: usize,
    pub n_true: usize,
    pub mismatches: usize,
}

impl SolutionReport {
    pub fn new(x: &[f64], truth: &[bool], threshold: f64) -> Result<Self> {
        let discrete = discretise(x, threshold);
        let mismatches = count_mismatches(&discrete, truth)?;
        Ok(Self {
            n_segments: truth.len(),
            n_selected: discrete.iter().filter(|&&d| d).count(),
            n_true: truth.iter().filter(|&&t| t).count(),
            mismatches,
        })
    }

    pub fn mismatch_fraction(&self) -> f64 {
        if self.n_segments == 0 {
            0.0
        } else {
            self.mismatches as f64 / self.n_segments as f64
        }
    }
}

impl fmt::Display for SolutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} segments, {} selected, {} true, {} mismatched ({:.2}%)",
            self.n_segments,
            self.n_selected,
            self.n_true,
            self.mismatches,
            100.0 * self.mismatch_fraction()
        )
    }
}
