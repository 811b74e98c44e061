//! Mass matrix, inverse dynamics, forward dynamics, and energies.
//!
//! The composite rigid body algorithm and recursive Newton-Euler both
//! run in body-local coordinates over the parent-before-child body
//! ordering the model guarantees. Forward dynamics composes the two
//! with a dense Cholesky solve; at the joint counts this crate targets
//! the factorization is a rounding error next to the recursions.

use nalgebra::DVector;

use crate::data::RigidData;
use crate::error::RigidError;
use crate::model::RigidModel;
use crate::spatial::{
    cross_force, cross_motion, force_to_parent, motion_to_child, spatial, SpatialVec,
};

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

// ── Mass matrix ────────────────────────────────────────────────────

/// Composite rigid body algorithm: fill `data.mass_matrix` for `q`.
///
/// Leaves-to-root accumulation of subtree inertias, then one ancestor
/// walk per joint for the off-diagonal entries. Also refreshes body
/// poses for `q`.
pub fn crba(model: &RigidModel, data: &mut RigidData, q: &DVector<f64>) -> Result<(), RigidError> {
    check_len("q", model.nq(), q.len())?;
    let bodies = model.bodies();

    // Position-only forward pass.
    for (i, body) in bodies.iter().enumerate() {
        let local = body.placement * body.joint_transform(q[i]);
        data.local_pose[i] = local;
        data.body_pose[i] = match body.parent {
            Some(p) => data.body_pose[p] * local,
            None => local,
        };
    }

    // Subtree inertia accumulation, leaves first.
    for (i, body) in bodies.iter().enumerate() {
        data.composite[i] = body.inertia;
    }
    for i in (0..bodies.len()).rev() {
        if let Some(p) = bodies[i].parent {
            let shifted = data.composite[i].to_parent(&data.local_pose[i]);
            data.composite[p].add_assign(&shifted);
        }
    }

    data.mass_matrix.fill(0.0);
    for i in 0..bodies.len() {
        let s_i = bodies[i].motion_subspace();
        // Spatial force a unit acceleration of joint i exerts on the
        // subtree, expressed at body i, then carried up the ancestors.
        let mut f = data.composite[i].apply(&s_i);
        data.mass_matrix[(i, i)] = s_i.dot(&f);
        let mut j = i;
        while let Some(p) = bodies[j].parent {
            f = force_to_parent(&data.local_pose[j], &f);
            let m_ip = bodies[p].motion_subspace().dot(&f);
            data.mass_matrix[(i, p)] = m_ip;
            data.mass_matrix[(p, i)] = m_ip;
            j = p;
        }
    }
    Ok(())
}

// ── Newton-Euler ───────────────────────────────────────────────────

/// Newton-Euler sweep: fill `data.body_force` with the per-body net
/// spatial forces for accelerations `a` (zeros when `None`).
///
/// Gravity rides in as the base acceleration, so the result already
/// contains gravitational loads. `fext`, when given, holds one
/// body-local external wrench per body and is subtracted.
fn newton_euler(
    model: &RigidModel,
    data: &mut RigidData,
    q: &DVector<f64>,
    v: &DVector<f64>,
    a: Option<&DVector<f64>>,
    fext: Option<&[SpatialVec]>,
) -> Result<(), RigidError> {
    check_len("q", model.nq(), q.len())?;
    check_len("v", model.nv(), v.len())?;
    if let Some(a) = a {
        check_len("a", model.nv(), a.len())?;
    }
    if let Some(fext) = fext {
        check_len("fext", model.bodies().len(), fext.len())?;
    }

    let bodies = model.bodies();
    let base_acc = spatial(nalgebra::Vector3::zeros(), -model.gravity());

    for (i, body) in bodies.iter().enumerate() {
        let local = body.placement * body.joint_transform(q[i]);
        data.local_pose[i] = local;
        let (pose_p, vel_p, acc_p) = match body.parent {
            Some(p) => (data.body_pose[p], data.body_vel[p], data.body_acc[p]),
            None => (nalgebra::Isometry3::identity(), SpatialVec::zeros(), base_acc),
        };
        data.body_pose[i] = pose_p * local;

        let s = body.motion_subspace();
        let joint_vel = s * v[i];
        data.body_vel[i] = motion_to_child(&local, &vel_p) + joint_vel;
        data.body_acc[i] = motion_to_child(&local, &acc_p)
            + s * a.map_or(0.0, |a| a[i])
            + cross_motion(&data.body_vel[i], &joint_vel);

        let momentum = body.inertia.apply(&data.body_vel[i]);
        let mut force = body.inertia.apply(&data.body_acc[i])
            + cross_force(&data.body_vel[i], &momentum);
        if let Some(fext) = fext {
            force -= fext[i];
        }
        data.body_force[i] = force;
    }

    // Children fold their net force into their parent; after this pass
    // every entry covers its whole subtree.
    for i in (0..bodies.len()).rev() {
        if let Some(p) = bodies[i].parent {
            let up = force_to_parent(&data.local_pose[i], &data.body_force[i]);
            data.body_force[p] += up;
        }
    }
    Ok(())
}

/// Inverse dynamics: joint torques realizing accelerations `a`.
pub fn rnea(
    model: &RigidModel,
    data: &mut RigidData,
    q: &DVector<f64>,
    v: &DVector<f64>,
    a: &DVector<f64>,
    fext: Option<&[SpatialVec]>,
) -> Result<DVector<f64>, RigidError> {
    newton_euler(model, data, q, v, Some(a), fext)?;
    let mut tau = DVector::zeros(model.nv());
    for (i, body) in model.bodies().iter().enumerate() {
        tau[i] = body.motion_subspace().dot(&data.body_force[i]);
    }
    Ok(tau)
}

/// Nonlinear effects: fill `data.nle` with the joint-space bias
/// (Coriolis, centrifugal, gravity, minus external-force projection).
pub fn nonlinear_effects(
    model: &RigidModel,
    data: &mut RigidData,
    q: &DVector<f64>,
    v: &DVector<f64>,
    fext: Option<&[SpatialVec]>,
) -> Result<(), RigidError> {
    newton_euler(model, data, q, v, None, fext)?;
    for (i, body) in model.bodies().iter().enumerate() {
        data.nle[i] = body.motion_subspace().dot(&data.body_force[i]);
    }
    Ok(())
}

// ── Forward dynamics ───────────────────────────────────────────────

/// Forward dynamics: fill `data.ddq` with the accelerations produced
/// by torques `tau` under external wrenches `fext`.
///
/// Solves `M(q) a = tau - nle(q, v, fext)` by dense Cholesky.
pub fn forward_dynamics(
    model: &RigidModel,
    data: &mut RigidData,
    q: &DVector<f64>,
    v: &DVector<f64>,
    tau: &DVector<f64>,
    fext: Option<&[SpatialVec]>,
) -> Result<(), RigidError> {
    check_len("tau", model.nv(), tau.len())?;
    crba(model, data, q)?;
    nonlinear_effects(model, data, q, v, fext)?;
    let rhs = tau - &data.nle;
    let chol = data
        .mass_matrix
        .clone()
        .cholesky()
        .ok_or(RigidError::SingularMassMatrix)?;
    data.ddq.copy_from(&chol.solve(&rhs));
    // A semidefinite matrix can slip through the factorization with a
    // zero pivot; it surfaces here as non-finite accelerations.
    if data.ddq.iter().any(|x| !x.is_finite()) {
        return Err(RigidError::SingularMassMatrix);
    }
    Ok(())
}

// ── Energies ───────────────────────────────────────────────────────

/// Kinetic energy from the body velocities of the last kinematics or
/// Newton-Euler pass.
pub fn kinetic_energy(model: &RigidModel, data: &RigidData) -> f64 {
    model
        .bodies()
        .iter()
        .enumerate()
        .map(|(i, body)| 0.5 * data.body_vel[i].dot(&body.inertia.apply(&data.body_vel[i])))
        .sum()
}

/// Gravitational potential energy from the body poses of the last
/// kinematics pass. Zero level is the world origin.
pub fn potential_energy(model: &RigidModel, data: &RigidData) -> f64 {
    let g = model.gravity();
    model
        .bodies()
        .iter()
        .enumerate()
        .map(|(i, body)| {
            let com = (data.body_pose[i] * nalgebra::Point3::from(body.inertia.com)).coords;
            -body.inertia.mass * g.dot(&com)
        })
        .sum()
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::{forward_kinematics, world_force_on_body};
    use approx::assert_relative_eq;
    use armature_urdf::load_urdf_str;
    use proptest::prelude::*;

    const POINT_PENDULUM: &str = r#"<?xml version="1.0"?>
<robot name="point_pendulum">
  <link name="base"/>
  <link name="arm">
    <inertial>
      <origin xyz="0 0 -1"/>
      <mass value="1.0"/>
      <inertia ixx="0.0" iyy="0.0" izz="0.0"/>
    </inertial>
  </link>
  <joint name="pivot" type="continuous">
    <parent link="base"/>
    <child link="arm"/>
    <origin xyz="0 0 2"/>
    <axis xyz="0 1 0"/>
  </joint>
</robot>
"#;

    const DOUBLE_PENDULUM: &str = r#"<?xml version="1.0"?>
<robot name="double_pendulum">
  <link name="base"/>
  <link name="first">
    <inertial>
      <origin xyz="0 0 -0.5"/>
      <mass value="1.0"/>
      <inertia ixx="0.08" iyy="0.08" izz="0.002"/>
    </inertial>
  </link>
  <link name="second">
    <inertial>
      <origin xyz="0 0 -0.4"/>
      <mass value="0.7"/>
      <inertia ixx="0.04" iyy="0.04" izz="0.001"/>
    </inertial>
  </link>
  <joint name="first_joint" type="continuous">
    <parent link="base"/>
    <child link="first"/>
    <origin xyz="0 0 2"/>
    <axis xyz="0 1 0"/>
  </joint>
  <joint name="second_joint" type="continuous">
    <parent link="first"/>
    <child link="second"/>
    <origin xyz="0 0 -1"/>
    <axis xyz="0 1 0"/>
  </joint>
</robot>
"#;

    fn setup(urdf: &str) -> (RigidModel, RigidData) {
        let model = RigidModel::from_description(&load_urdf_str(urdf).unwrap()).unwrap();
        let data = RigidData::new(&model);
        (model, data)
    }

    #[test]
    fn point_pendulum_mass_matrix_is_ml_squared() {
        let (model, mut data) = setup(POINT_PENDULUM);
        let q = DVector::from_vec(vec![0.3]);
        crba(&model, &mut data, &q).unwrap();
        assert_relative_eq!(data.mass_matrix[(0, 0)], 1.0, epsilon = 1.0e-12);
    }

    #[test]
    fn point_pendulum_swing_acceleration() {
        // qdd = -(g/l) sin(q) for this geometry.
        let (model, mut data) = setup(POINT_PENDULUM);
        let q = DVector::from_vec(vec![0.1]);
        let v = DVector::zeros(1);
        let tau = DVector::zeros(1);
        forward_dynamics(&model, &mut data, &q, &v, &tau, None).unwrap();
        assert_relative_eq!(data.ddq[0], -9.81 * 0.1_f64.sin(), epsilon = 1.0e-10);
    }

    #[test]
    fn hanging_at_rest_stays_at_rest() {
        let (model, mut data) = setup(DOUBLE_PENDULUM);
        let q = DVector::zeros(2);
        let v = DVector::zeros(2);
        let tau = DVector::zeros(2);
        forward_dynamics(&model, &mut data, &q, &v, &tau, None).unwrap();
        assert_relative_eq!(data.ddq.norm(), 0.0, epsilon = 1.0e-10);
    }

    #[test]
    fn mass_matrix_columns_match_inverse_dynamics() {
        // M e_j == rnea(q, 0, e_j) - rnea(q, 0, 0).
        let (model, mut data) = setup(DOUBLE_PENDULUM);
        let q = DVector::from_vec(vec![0.4, -0.9]);
        let zero = DVector::zeros(2);
        crba(&model, &mut data, &q).unwrap();
        let mass_matrix = data.mass_matrix.clone();
        let bias = rnea(&model, &mut data, &q, &zero, &zero, None).unwrap();
        for j in 0..2 {
            let mut unit = DVector::zeros(2);
            unit[j] = 1.0;
            let tau = rnea(&model, &mut data, &q, &zero, &unit, None).unwrap();
            for i in 0..2 {
                assert_relative_eq!(
                    mass_matrix[(i, j)],
                    tau[i] - bias[i],
                    epsilon = 1.0e-10
                );
            }
        }
    }

    #[test]
    fn kinetic_energy_matches_quadratic_form() {
        let (model, mut data) = setup(DOUBLE_PENDULUM);
        let q = DVector::from_vec(vec![0.7, 0.2]);
        let v = DVector::from_vec(vec![-1.1, 0.8]);
        crba(&model, &mut data, &q).unwrap();
        let quadratic = 0.5 * v.dot(&(&data.mass_matrix * &v));
        forward_kinematics(&model, &mut data, &q, &v).unwrap();
        assert_relative_eq!(kinetic_energy(&model, &data), quadratic, epsilon = 1.0e-10);
    }

    #[test]
    fn potential_energy_tracks_height() {
        let (model, mut data) = setup(POINT_PENDULUM);
        let v = DVector::zeros(1);
        let down = DVector::zeros(1);
        forward_kinematics(&model, &mut data, &down, &v).unwrap();
        let e_down = potential_energy(&model, &data);
        let up = DVector::from_vec(vec![std::f64::consts::PI]);
        forward_kinematics(&model, &mut data, &up, &v).unwrap();
        let e_up = potential_energy(&model, &data);
        // Raising the bob by 2l gains m g (2l) of potential.
        assert_relative_eq!(e_up - e_down, 9.81 * 2.0, epsilon = 1.0e-10);
    }

    #[test]
    fn supporting_force_cancels_gravity() {
        let (model, mut data) = setup(POINT_PENDULUM);
        let q = DVector::from_vec(vec![0.6]);
        let v = DVector::zeros(1);
        let tau = DVector::zeros(1);
        forward_kinematics(&model, &mut data, &q, &v).unwrap();
        let com = crate::kinematics::com_position(&model, &data, 0);
        let lift = world_force_on_body(&data, 0, nalgebra::Vector3::new(0.0, 0.0, 9.81), com);
        let fext = vec![lift];
        forward_dynamics(&model, &mut data, &q, &v, &tau, Some(&fext)).unwrap();
        assert_relative_eq!(data.ddq[0], 0.0, epsilon = 1.0e-10);
    }

    #[test]
    fn zero_rotational_inertia_point_mass_at_origin_is_singular() {
        let urdf = POINT_PENDULUM.replace("xyz=\"0 0 -1\"", "xyz=\"0 0 0\"");
        let (model, mut data) = setup(&urdf);
        let q = DVector::zeros(1);
        let v = DVector::zeros(1);
        let tau = DVector::from_vec(vec![1.0]);
        match forward_dynamics(&model, &mut data, &q, &v, &tau, None) {
            Err(RigidError::SingularMassMatrix) => {}
            other => panic!("expected SingularMassMatrix, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn mass_matrix_is_symmetric_positive_definite(
            q0 in -3.1_f64..3.1,
            q1 in -3.1_f64..3.1,
        ) {
            let (model, mut data) = setup(DOUBLE_PENDULUM);
            let q = DVector::from_vec(vec![q0, q1]);
            crba(&model, &mut data, &q).unwrap();
            let m = &data.mass_matrix;
            prop_assert!((m[(0, 1)] - m[(1, 0)]).abs() < 1.0e-12);
            // Leading minors positive.
            prop_assert!(m[(0, 0)] > 0.0);
            prop_assert!(m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)] > 0.0);
        }

        #[test]
        fn coriolis_terms_vanish_at_zero_velocity(
            q0 in -3.1_f64..3.1,
            q1 in -3.1_f64..3.1,
        ) {
            // With v = 0 the bias equals pure gravity torque, which for
            // this planar chain is bounded by total weight times reach.
            let (model, mut data) = setup(DOUBLE_PENDULUM);
            let q = DVector::from_vec(vec![q0, q1]);
            let v = DVector::zeros(2);
            nonlinear_effects(&model, &mut data, &q, &v, None).unwrap();
            let bound = (1.0 + 0.7) * 9.81 * 2.0;
            prop_assert!(data.nle[0].abs() < bound);
            prop_assert!(data.nle[1].abs() < bound);
        }
    }
}
