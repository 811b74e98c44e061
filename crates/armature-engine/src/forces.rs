//! User-registered external forces.
//!
//! Two flavors: impulses, a constant world-frame force over a fixed
//! time window, and profiles, a closure evaluated at every derivative
//! evaluation. Both act at a frame origin and persist across runs until
//! cleared.

use nalgebra::{DVector, Vector3};

/// Signature of a force profile: `(t, q, v)` to a world-frame force.
pub type ForceProfile = dyn Fn(f64, &DVector<f64>, &DVector<f64>) -> Vector3<f64>;

/// A constant force applied over `[t, t + dt)`.
#[derive(Clone, Debug)]
pub(crate) struct ForceImpulse {
    pub frame: usize,
    pub t: f64,
    pub dt: f64,
    pub force: Vector3<f64>,
}

impl ForceImpulse {
    fn active(&self, t: f64) -> bool {
        t >= self.t && t < self.t + self.dt
    }
}

pub(crate) struct ForceProfileEntry {
    pub frame: usize,
    pub profile: Box<ForceProfile>,
}

impl std::fmt::Debug for ForceProfileEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForceProfileEntry")
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}

/// All registered external forces of a simulator.
#[derive(Debug, Default)]
pub(crate) struct ExternalForces {
    pub impulses: Vec<ForceImpulse>,
    pub profiles: Vec<ForceProfileEntry>,
}

impl ExternalForces {
    pub fn is_empty(&self) -> bool {
        self.impulses.is_empty() && self.profiles.is_empty()
    }

    pub fn clear(&mut self) {
        self.impulses.clear();
        self.profiles.clear();
    }

    /// Append the world-frame forces active at `(t, q, v)` to `out`,
    /// as `(frame index, force)` pairs.
    pub fn accumulate(
        &self,
        t: f64,
        q: &DVector<f64>,
        v: &DVector<f64>,
        out: &mut Vec<(usize, Vector3<f64>)>,
    ) {
        for impulse in &self.impulses {
            if impulse.active(t) {
                out.push((impulse.frame, impulse.force));
            }
        }
        for entry in &self.profiles {
            out.push((entry.frame, (entry.profile)(t, q, v)));
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────
