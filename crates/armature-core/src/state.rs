//! Generalized state of a mechanical system.
//!
//! The simulator's public surface takes flat state vectors `x = [q; v]`
//! (configuration stacked on velocity), the layout integrators operate
//! on. [`State`] is the split view used by the dynamics algorithms.

use std::error::Error;
use std::fmt;

use nalgebra::DVector;

// ── StateError ─────────────────────────────────────────────────────

/// Errors from packing or unpacking flat state vectors.
#[derive(Clone, Debug, PartialEq)]
pub enum StateError {
    /// The flat vector length does not match `nq + nv`.
    LengthMismatch {
        /// Expected length (`nq + nv`).
        expected: usize,
        /// Provided length.
        found: usize,
    },
    /// A state entry is NaN or infinite.
    NonFinite {
        /// Index of the offending entry in the flat layout.
        index: usize,
    },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { expected, found } => {
                write!(f, "state vector has length {found}, expected {expected}")
            }
            Self::NonFinite { index } => {
                write!(f, "state entry {index} is not finite")
            }
        }
    }
}

impl Error for StateError {}

// ── State ──────────────────────────────────────────────────────────

/// Generalized position and velocity of a mechanical system.
#[derive(Clone, Debug, PartialEq)]
pub struct State {
    /// Generalized configuration, length `nq`.
    pub q: DVector<f64>,
    /// Generalized velocity, length `nv`.
    pub v: DVector<f64>,
}

impl State {
    /// The zero state for a system with `nq` positions and `nv` velocities.
    pub fn zeros(nq: usize, nv: usize) -> Self {
        Self {
            q: DVector::zeros(nq),
            v: DVector::zeros(nv),
        }
    }

    /// Split a flat `[q; v]` vector.
    ///
    /// Rejects wrong lengths and non-finite entries; integrators rely on
    /// finite inputs.
    pub fn from_flat(x: &DVector<f64>, nq: usize, nv: usize) -> Result<Self, StateError> {
        if x.len() != nq + nv {
            return Err(StateError::LengthMismatch {
                expected: nq + nv,
                found: x.len(),
            });
        }
        for (index, value) in x.iter().enumerate() {
            if !value.is_finite() {
                return Err(StateError::NonFinite { index });
            }
        }
        Ok(Self {
            q: DVector::from_iterator(nq, x.iter().take(nq).copied()),
            v: DVector::from_iterator(nv, x.iter().skip(nq).copied()),
        })
    }

    /// Pack into the flat `[q; v]` layout.
    pub fn to_flat(&self) -> DVector<f64> {
        let mut x = DVector::zeros(self.q.len() + self.v.len());
        x.rows_mut(0, self.q.len()).copy_from(&self.q);
        x.rows_mut(self.q.len(), self.v.len()).copy_from(&self.v);
        x
    }

    /// Flat state length `nq + nv`.
    pub fn nx(&self) -> usize {
        self.q.len() + self.v.len()
    }
}

// ── Tests ──────────────────────────────────────────────────────────
