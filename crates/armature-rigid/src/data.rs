//! Reusable algorithm workspace.

use nalgebra::{DMatrix, DVector, Isometry3};

use crate::model::RigidModel;
use crate::spatial::{SpatialInertia, SpatialVec};

/// Buffers the recursive algorithms read and write.
///
/// Sized once against a model; the algorithms then run allocation-free.
/// Fields are plain data on purpose, mirroring the model/data split of
/// the classical dynamics libraries: the model is immutable structure,
/// the data is everything a configuration evaluates to.
#[derive(Clone, Debug)]
pub struct RigidData {
    /// Pose of each body frame in the world.
    pub body_pose: Vec<Isometry3<f64>>,
    /// Pose of each body frame in its parent (joint transform composed).
    pub local_pose: Vec<Isometry3<f64>>,
    /// Spatial velocity of each body, body coordinates.
    pub body_vel: Vec<SpatialVec>,
    /// Spatial acceleration of each body, body coordinates (gravity
    /// offset included while inside the recursions).
    pub body_acc: Vec<SpatialVec>,
    /// Per-body force accumulator for the Newton-Euler backward pass.
    pub body_force: Vec<SpatialVec>,
    /// Composite-inertia accumulator for the mass-matrix pass.
    pub composite: Vec<SpatialInertia>,
    /// Pose of each operational frame in the world.
    pub frame_pose: Vec<Isometry3<f64>>,
    /// Joint-space mass matrix, `nv × nv`.
    pub mass_matrix: DMatrix<f64>,
    /// Nonlinear effects (Coriolis, centrifugal, gravity, minus the
    /// external-force projection), length `nv`.
    pub nle: DVector<f64>,
    /// Forward-dynamics result, length `nv`.
    pub ddq: DVector<f64>,
}

impl RigidData {
    /// Allocate a workspace matching `model`.
    pub fn new(model: &RigidModel) -> Self {
        let nb = model.bodies().len();
        let nv = model.nv();
        Self {
            body_pose: vec![Isometry3::identity(); nb],
            local_pose: vec![Isometry3::identity(); nb],
            body_vel: vec![SpatialVec::zeros(); nb],
            body_acc: vec![SpatialVec::zeros(); nb],
            body_force: vec![SpatialVec::zeros(); nb],
            composite: vec![SpatialInertia::zero(); nb],
            frame_pose: vec![Isometry3::identity(); model.frames().len()],
            mass_matrix: DMatrix::zeros(nv, nv),
            nle: DVector::zeros(nv),
            ddq: DVector::zeros(nv),
        }
    }
}
