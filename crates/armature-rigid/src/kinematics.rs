//! Forward kinematics and frame queries.

use nalgebra::{DVector, Isometry3, UnitQuaternion, Vector3};

use crate::data::RigidData;
use crate::error::RigidError;
use crate::model::RigidModel;
use crate::spatial::{angular, linear, motion_to_child, spatial};

fn check_len(what: &'static str, expected: usize, found: usize) -> Result<(), RigidError> {
    if expected == found {
        Ok(())
    } else {
        Err(RigidError::DimensionMismatch {
            what,
            expected,
            found,
        })
    }
}

/// Update body and frame poses and body spatial velocities.
///
/// One forward sweep: each body's pose composes its parent's, each
/// body's velocity is its parent's expressed locally plus the joint
/// rate along the motion subspace.
pub fn forward_kinematics(
    model: &RigidModel,
    data: &mut RigidData,
    q: &DVector<f64>,
    v: &DVector<f64>,
) -> Result<(), RigidError> {
    check_len("q", model.nq(), q.len())?;
    check_len("v", model.nv(), v.len())?;

    for (i, body) in model.bodies().iter().enumerate() {
        let local = body.placement * body.joint_transform(q[i]);
        data.local_pose[i] = local;
        let (parent_pose, parent_vel) = match body.parent {
            Some(p) => (data.body_pose[p], data.body_vel[p]),
            None => (Isometry3::identity(), crate::spatial::SpatialVec::zeros()),
        };
        data.body_pose[i] = parent_pose * local;
        data.body_vel[i] = motion_to_child(&local, &parent_vel) + body.motion_subspace() * v[i];
    }

    update_frames(model, data);
    Ok(())
}

/// Refresh world frame poses from the current body poses.
pub fn update_frames(model: &RigidModel, data: &mut RigidData) {
    for (k, frame) in model.frames().iter().enumerate() {
        data.frame_pose[k] = match frame.body {
            Some(b) => data.body_pose[b] * frame.placement,
            None => frame.placement,
        };
    }
}

/// World pose of frame `index`, from the last kinematics update.
pub fn frame_placement(data: &RigidData, index: usize) -> Isometry3<f64> {
    data.frame_pose[index]
}

/// World orientation of frame `index` as a unit quaternion.
pub fn frame_orientation(data: &RigidData, index: usize) -> UnitQuaternion<f64> {
    data.frame_pose[index].rotation
}

/// Angular and linear velocity of frame `index`.
///
/// The angular part is expressed in the frame's own axes (what a
/// strapped-down gyro reads); the linear part is the world-frame
/// velocity of the frame origin (what a contact model wants).
pub fn frame_velocity(
    model: &RigidModel,
    data: &RigidData,
    index: usize,
) -> (Vector3<f64>, Vector3<f64>) {
    let frame = &model.frames()[index];
    match frame.body {
        None => (Vector3::zeros(), Vector3::zeros()),
        Some(b) => {
            let vel = data.body_vel[b];
            let w_body = angular(&vel);
            let v_body = linear(&vel);
            // Velocity of the material point under the frame origin.
            let p = frame.placement.translation.vector;
            let v_point = v_body + w_body.cross(&p);
            let world_rot = data.body_pose[b].rotation;
            let frame_rot_in_body = frame.placement.rotation;
            (
                frame_rot_in_body.inverse() * w_body,
                world_rot * v_point,
            )
        }
    }
}

/// Spatial velocity of body `index` in body coordinates, as a raw pair.
pub fn body_velocity(data: &RigidData, index: usize) -> crate::spatial::SpatialVec {
    data.body_vel[index]
}

/// World position of body `index`'s centre of mass.
pub fn com_position(model: &RigidModel, data: &RigidData, index: usize) -> Vector3<f64> {
    let body = &model.bodies()[index];
    (data.body_pose[index] * nalgebra::Point3::from(body.inertia.com)).coords
}

/// Convert a world-frame point force into a body-local spatial force.
///
/// `point` is where the force acts, in world coordinates. The result
/// is the equivalent wrench about the body origin, body axes, ready
/// for the Newton-Euler external-force slot.
pub fn world_force_on_body(
    data: &RigidData,
    body: usize,
    force_world: Vector3<f64>,
    point_world: Vector3<f64>,
) -> crate::spatial::SpatialVec {
    let pose = &data.body_pose[body];
    let r_inv = pose.rotation.inverse();
    let arm = point_world - pose.translation.vector;
    let torque_world = arm.cross(&force_world);
    spatial(r_inv * torque_world, r_inv * force_world)
}

// ── Tests ──────────────────────────────────────────────────────────
