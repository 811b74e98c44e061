//! Executable rigid-body model.
//!
//! [`RigidModel`] flattens a validated robot description into the form
//! the recursive algorithms want: one [`Body`] per moving joint, in
//! parent-before-child order, with fixed joints composed into their
//! supporting body's placements and surfaced as [`Frame`]s. Every
//! moving joint has one degree of freedom, so body index, joint index,
//! and velocity index coincide.

use std::collections::HashMap;

use nalgebra::{Isometry3, Translation3, Unit, UnitQuaternion, Vector3};
use smallvec::SmallVec;

use armature_urdf::{JointType, RobotDescription, UrdfError};

use crate::error::RigidError;
use crate::spatial::{spatial, SpatialInertia, SpatialVec};

// ── Joints and bodies ──────────────────────────────────────────────

/// Motion archetype of a one-DoF joint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JointKind {
    /// Rotation about the joint axis.
    Revolute,
    /// Translation along the joint axis.
    Prismatic,
}

/// A moving body: one link driven by one one-DoF joint.
#[derive(Clone, Debug)]
pub struct Body {
    /// Name of the link this body carries.
    pub name: String,
    /// Name of the joint driving this body.
    pub joint_name: String,
    /// Supporting body index; `None` means the fixed base.
    pub parent: Option<usize>,
    /// Joint frame in the parent body's frame, fixed joints composed in.
    pub placement: Isometry3<f64>,
    /// Motion archetype.
    pub kind: JointKind,
    /// Motion axis in the joint frame.
    pub axis: Unit<Vector3<f64>>,
    /// Link inertia in the body frame.
    pub inertia: SpatialInertia,
    /// Position bounds, when the joint declares them.
    pub limit: Option<(f64, f64)>,
    /// Direct child bodies.
    pub children: SmallVec<[usize; 4]>,
}

impl Body {
    /// Pose of the body frame in its parent for joint position `q`.
    #[inline]
    pub fn joint_transform(&self, q: f64) -> Isometry3<f64> {
        match self.kind {
            JointKind::Revolute => Isometry3::from_parts(
                Translation3::identity(),
                UnitQuaternion::from_axis_angle(&self.axis, q),
            ),
            JointKind::Prismatic => Isometry3::from_parts(
                Translation3::from(self.axis.into_inner() * q),
                UnitQuaternion::identity(),
            ),
        }
    }

    /// Motion subspace column in body coordinates.
    #[inline]
    pub fn motion_subspace(&self) -> SpatialVec {
        match self.kind {
            JointKind::Revolute => spatial(self.axis.into_inner(), Vector3::zeros()),
            JointKind::Prismatic => spatial(Vector3::zeros(), self.axis.into_inner()),
        }
    }
}

/// An operational frame rigidly attached to a body or to the base.
///
/// Every link contributes a frame at its origin, and every fixed joint
/// contributes a frame named after the joint.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Frame name.
    pub name: String,
    /// Supporting body; `None` means the fixed base.
    pub body: Option<usize>,
    /// Pose in the supporting body's frame.
    pub placement: Isometry3<f64>,
}

// ── RigidModel ─────────────────────────────────────────────────────

/// A fixed-base kinematic tree ready for the recursive algorithms.
#[derive(Clone, Debug)]
pub struct RigidModel {
    name: String,
    bodies: Vec<Body>,
    frames: Vec<Frame>,
    gravity: Vector3<f64>,
}

impl RigidModel {
    /// Build a model from a robot description.
    ///
    /// The description is re-validated, so a hand-assembled one cannot
    /// smuggle in a broken tree. Gravity defaults to `[0, 0, -9.81]`.
    pub fn from_description(desc: &RobotDescription) -> Result<Self, RigidError> {
        desc.validate()?;

        let mut bodies: Vec<Body> = Vec::new();
        let mut frames: Vec<Frame> = Vec::new();
        // Link name -> (supporting body, offset of the link frame in it).
        let mut support: HashMap<&str, (Option<usize>, Isometry3<f64>)> = HashMap::new();

        if let Some(root) = desc.root_link() {
            let root_name = desc.links[root].name.as_str();
            support.insert(root_name, (None, Isometry3::identity()));
            frames.push(Frame {
                name: root_name.to_string(),
                body: None,
                placement: Isometry3::identity(),
            });
        }

        // Parent-before-child sweep; repeats until every joint whose
        // parent link is reachable has been placed.
        let mut placed = vec![false; desc.joints.len()];
        loop {
            let mut advanced = false;
            for (index, joint) in desc.joints.iter().enumerate() {
                if placed[index] {
                    continue;
                }
                let Some(&(parent_body, parent_offset)) = support.get(joint.parent.as_str())
                else {
                    continue;
                };
                placed[index] = true;
                advanced = true;
                let pose = parent_offset * joint.origin;

                if joint.joint_type.is_fixed() {
                    // Welded link: no body, two frames (joint and link).
                    support.insert(joint.child.as_str(), (parent_body, pose));
                    frames.push(Frame {
                        name: joint.name.clone(),
                        body: parent_body,
                        placement: pose,
                    });
                    frames.push(Frame {
                        name: joint.child.clone(),
                        body: parent_body,
                        placement: pose,
                    });
                    continue;
                }

                let link = &desc.links[desc
                    .link_index(&joint.child)
                    .ok_or_else(|| RigidError::NameNotFound {
                        kind: "link",
                        name: joint.child.clone(),
                    })?];
                let inertial =
                    link.inertial
                        .as_ref()
                        .ok_or(RigidError::Description(UrdfError::MissingInertial {
                            link: link.name.clone(),
                        }))?;

                let body_index = bodies.len();
                bodies.push(Body {
                    name: joint.child.clone(),
                    joint_name: joint.name.clone(),
                    parent: parent_body,
                    placement: pose,
                    kind: match joint.joint_type {
                        JointType::Prismatic => JointKind::Prismatic,
                        _ => JointKind::Revolute,
                    },
                    axis: joint.axis,
                    inertia: SpatialInertia::from_com_inertia(
                        inertial.mass,
                        inertial.com,
                        inertial.inertia,
                    ),
                    limit: match joint.joint_type {
                        JointType::Continuous => None,
                        _ => joint.limit.map(|l| (l.lower, l.upper)),
                    },
                    children: SmallVec::new(),
                });
                if let Some(parent) = parent_body {
                    bodies[parent].children.push(body_index);
                }
                support.insert(joint.child.as_str(), (Some(body_index), Isometry3::identity()));
                frames.push(Frame {
                    name: joint.child.clone(),
                    body: Some(body_index),
                    placement: Isometry3::identity(),
                });
            }
            if !advanced {
                break;
            }
        }

        Ok(Self {
            name: desc.name.clone(),
            bodies,
            frames,
            gravity: Vector3::new(0.0, 0.0, -9.81),
        })
    }

    /// Robot name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Moving bodies in parent-before-child order.
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Operational frames.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of configuration variables (one per moving joint).
    pub fn nq(&self) -> usize {
        self.bodies.len()
    }

    /// Number of velocity variables (one per moving joint).
    pub fn nv(&self) -> usize {
        self.bodies.len()
    }

    /// Flat state length, `nq + nv`.
    pub fn nx(&self) -> usize {
        self.nq() + self.nv()
    }

    /// World gravity vector.
    pub fn gravity(&self) -> Vector3<f64> {
        self.gravity
    }

    /// Replace the world gravity vector.
    pub fn set_gravity(&mut self, gravity: Vector3<f64>) {
        self.gravity = gravity;
    }

    /// Index of the moving joint called `name`.
    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.bodies.iter().position(|b| b.joint_name == name)
    }

    /// Index of the frame called `name`.
    pub fn frame_index(&self, name: &str) -> Option<usize> {
        self.frames.iter().position(|f| f.name == name)
    }

    /// Whether a frame called `name` exists.
    pub fn exists_frame(&self, name: &str) -> bool {
        self.frame_index(name).is_some()
    }

    /// Moving joint names in model order.
    pub fn joint_names(&self) -> Vec<&str> {
        self.bodies.iter().map(|b| b.joint_name.as_str()).collect()
    }

    /// Per-joint position bounds, `None` where unbounded.
    pub fn position_limits(&self) -> Vec<Option<(f64, f64)>> {
        self.bodies.iter().map(|b| b.limit).collect()
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use armature_urdf::load_urdf_str;

    const TWO_LINK: &str = r#"<?xml version="1.0"?>
<robot name="two_link">
  <link name="base"/>
  <link name="upper">
    <inertial>
      <origin xyz="0 0 -0.5"/>
      <mass value="1.0"/>
      <inertia ixx="0.05" iyy="0.05" izz="0.001"/>
    </inertial>
  </link>
  <link name="lower">
    <inertial>
      <origin xyz="0 0 -0.4"/>
      <mass value="0.8"/>
      <inertia ixx="0.03" iyy="0.03" izz="0.001"/>
    </inertial>
  </link>
  <link name="tip"/>
  <joint name="shoulder" type="revolute">
    <parent link="base"/>
    <child link="upper"/>
    <origin xyz="0 0 2"/>
    <axis xyz="0 1 0"/>
    <limit lower="-3.0" upper="3.0" effort="50" velocity="10"/>
  </joint>
  <joint name="elbow" type="continuous">
    <parent link="upper"/>
    <child link="lower"/>
    <origin xyz="0 0 -1"/>
    <axis xyz="0 1 0"/>
  </joint>
  <joint name="tip_weld" type="fixed">
    <parent link="lower"/>
    <child link="tip"/>
    <origin xyz="0 0 -0.8"/>
  </joint>
</robot>
"#;

    fn model() -> RigidModel {
        RigidModel::from_description(&load_urdf_str(TWO_LINK).unwrap()).unwrap()
    }

    #[test]
    fn bodies_are_parent_before_child() {
        let model = model();
        assert_eq!(model.nq(), 2);
        assert_eq!(model.bodies()[0].name, "upper");
        assert_eq!(model.bodies()[0].parent, None);
        assert_eq!(model.bodies()[1].name, "lower");
        assert_eq!(model.bodies()[1].parent, Some(0));
        assert_eq!(model.bodies()[0].children.as_slice(), &[1]);
    }

    #[test]
    fn fixed_joint_becomes_frames_on_supporting_body() {
        let model = model();
        let weld = model.frame_index("tip_weld").unwrap();
        let tip = model.frame_index("tip").unwrap();
        assert_eq!(model.frames()[weld].body, Some(1));
        assert_eq!(model.frames()[tip].body, Some(1));
        assert_relative_eq!(
            model.frames()[tip].placement.translation.z,
            -0.8,
            epsilon = 1.0e-12
        );
    }

    #[test]
    fn continuous_joint_has_no_limit() {
        let model = model();
        assert_eq!(model.position_limits(), vec![Some((-3.0, 3.0)), None]);
    }

    #[test]
    fn joint_lookup_by_name() {
        let model = model();
        assert_eq!(model.joint_index("elbow"), Some(1));
        assert_eq!(model.joint_index("tip_weld"), None);
        assert!(model.exists_frame("base"));
        assert!(!model.exists_frame("nowhere"));
    }

    #[test]
    fn revolute_transform_rotates_about_axis() {
        let model = model();
        let pose = model.bodies()[0].joint_transform(std::f64::consts::FRAC_PI_2);
        // +90 degrees about y maps +x onto -z.
        let mapped = pose * Vector3::x();
        assert_relative_eq!(mapped.x, 0.0, epsilon = 1.0e-12);
        assert_relative_eq!(mapped.z, -1.0, epsilon = 1.0e-12);
    }

    #[test]
    fn default_gravity_points_down() {
        let model = model();
        assert_relative_eq!(model.gravity().z, -9.81, epsilon = 1.0e-12);
    }
}
