//! Robot description types and kinematic-tree validation.
//!
//! A [`RobotDescription`] is the parsed form of a URDF document. It is
//! deliberately close to the document structure; turning it into an
//! executable model (joint ordering, spatial inertias, frames) is the
//! job of the rigid-body layer.

use nalgebra::{Isometry3, Matrix3, Unit, Vector3};

use crate::error::UrdfError;

// ── Joints ─────────────────────────────────────────────────────────

/// The joint archetypes this parser models.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JointType {
    /// One-DoF rotation about `axis`, with position limits.
    Revolute,
    /// One-DoF unbounded rotation about `axis`.
    Continuous,
    /// One-DoF translation along `axis`.
    Prismatic,
    /// Rigid attachment; contributes a frame, not a degree of freedom.
    Fixed,
}

impl JointType {
    /// Degrees of freedom contributed by this joint.
    pub fn dof(self) -> usize {
        match self {
            Self::Revolute | Self::Continuous | Self::Prismatic => 1,
            Self::Fixed => 0,
        }
    }

    /// Whether this joint is a rigid attachment.
    pub fn is_fixed(self) -> bool {
        self == Self::Fixed
    }
}

/// Position/velocity/effort bounds of a joint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JointLimit {
    /// Lower position bound (rad or m).
    pub lower: f64,
    /// Upper position bound (rad or m).
    pub upper: f64,
    /// Maximum joint effort (N·m or N).
    pub effort: f64,
    /// Maximum joint velocity (rad/s or m/s).
    pub velocity: f64,
}

/// A parsed `<joint>` element.
#[derive(Clone, Debug, PartialEq)]
pub struct UrdfJoint {
    /// Joint name.
    pub name: String,
    /// Joint archetype.
    pub joint_type: JointType,
    /// Name of the parent link.
    pub parent: String,
    /// Name of the child link.
    pub child: String,
    /// Pose of the joint frame in the parent link frame.
    pub origin: Isometry3<f64>,
    /// Motion axis in the joint frame. URDF default is `+x`.
    pub axis: Unit<Vector3<f64>>,
    /// Bounds, when the document declares a `<limit>`.
    pub limit: Option<JointLimit>,
}

// ── Links ──────────────────────────────────────────────────────────

/// Mass properties of a link, expressed in the link frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Inertial {
    /// Link mass (kg).
    pub mass: f64,
    /// Centre of mass in the link frame (m).
    pub com: Vector3<f64>,
    /// Rotational inertia about the centre of mass, in link-frame axes.
    pub inertia: Matrix3<f64>,
}

/// A parsed `<link>` element.
#[derive(Clone, Debug, PartialEq)]
pub struct UrdfLink {
    /// Link name.
    pub name: String,
    /// Mass properties; absent for pure frame links.
    pub inertial: Option<Inertial>,
}

// ── RobotDescription ───────────────────────────────────────────────

/// A validated robot description.
#[derive(Clone, Debug, PartialEq)]
pub struct RobotDescription {
    /// Robot name from the `<robot>` element.
    pub name: String,
    /// Links in document order.
    pub links: Vec<UrdfLink>,
    /// Joints in document order.
    pub joints: Vec<UrdfJoint>,
}

impl RobotDescription {
    /// Index of the link called `name`.
    pub fn link_index(&self, name: &str) -> Option<usize> {
        self.links.iter().position(|l| l.name == name)
    }

    /// Index of the joint called `name`.
    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|j| j.name == name)
    }

    /// The joint whose child is the link called `name`, if any.
    pub fn parent_joint_of(&self, name: &str) -> Option<&UrdfJoint> {
        self.joints.iter().find(|j| j.child == name)
    }

    /// Index of the root link: the unique link that is nobody's child.
    ///
    /// Only meaningful after [`validate`](Self::validate) has passed.
    pub fn root_link(&self) -> Option<usize> {
        self.links
            .iter()
            .position(|l| self.parent_joint_of(&l.name).is_none())
    }

    /// Check the kinematic-tree invariants.
    pub fn validate(&self) -> Result<(), UrdfError> {
        // 1. Link names are unique.
        for (i, link) in self.links.iter().enumerate() {
            if self.links[..i].iter().any(|other| other.name == link.name) {
                return Err(UrdfError::DuplicateLink {
                    name: link.name.clone(),
                });
            }
        }
        // 2. Joint names are unique.
        for (i, joint) in self.joints.iter().enumerate() {
            if self.joints[..i].iter().any(|other| other.name == joint.name) {
                return Err(UrdfError::DuplicateJoint {
                    name: joint.name.clone(),
                });
            }
        }
        // 3. Parent and child links resolve.
        for joint in &self.joints {
            for link in [&joint.parent, &joint.child] {
                if self.link_index(link).is_none() {
                    return Err(UrdfError::DanglingLink {
                        joint: joint.name.clone(),
                        link: link.clone(),
                    });
                }
            }
        }
        // 4. No link is the child of two joints.
        for (i, joint) in self.joints.iter().enumerate() {
            if self.joints[..i].iter().any(|other| other.child == joint.child) {
                return Err(UrdfError::LinkHasTwoParents {
                    link: joint.child.clone(),
                });
            }
        }
        // 5. Exactly one root. With 1-4 established this also rules out
        //    cycles and disconnected islands.
        let mut root: Option<&str> = None;
        for link in &self.links {
            if self.parent_joint_of(&link.name).is_none() {
                match root {
                    None => root = Some(&link.name),
                    Some(first) => {
                        return Err(UrdfError::MultipleRoots {
                            first: first.to_string(),
                            second: link.name.clone(),
                        })
                    }
                }
            }
        }
        if root.is_none() && !self.links.is_empty() {
            return Err(UrdfError::NoRoot);
        }
        // 6. Articulated links carry usable mass. Fixed-joint children
        //    and the root may be pure frames.
        for joint in &self.joints {
            if joint.joint_type.is_fixed() {
                continue;
            }
            let child = &self.links[self.link_index(&joint.child).expect("resolved in 3")];
            let has_mass = child.inertial.as_ref().is_some_and(|i| i.mass > 0.0);
            if !has_mass {
                return Err(UrdfError::MissingInertial {
                    link: child.name.clone(),
                });
            }
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn link(name: &str, mass: Option<f64>) -> UrdfLink {
        UrdfLink {
            name: name.to_string(),
            inertial: mass.map(|m| Inertial {
                mass: m,
                com: Vector3::zeros(),
                inertia: Matrix3::identity(),
            }),
        }
    }

    fn joint(name: &str, joint_type: JointType, parent: &str, child: &str) -> UrdfJoint {
        UrdfJoint {
            name: name.to_string(),
            joint_type,
            parent: parent.to_string(),
            child: child.to_string(),
            origin: Isometry3::identity(),
            axis: Vector3::x_axis(),
            limit: None,
        }
    }

    fn two_link_chain() -> RobotDescription {
        RobotDescription {
            name: "chain".to_string(),
            links: vec![link("base", None), link("upper", Some(1.0))],
            joints: vec![joint("shoulder", JointType::Revolute, "base", "upper")],
        }
    }

    #[test]
    fn valid_chain_passes() {
        assert!(two_link_chain().validate().is_ok());
    }

    #[test]
    fn duplicate_link_fails() {
        let mut robot = two_link_chain();
        robot.links.push(link("upper", Some(1.0)));
        match robot.validate() {
            Err(UrdfError::DuplicateLink { name }) => assert_eq!(name, "upper"),
            other => panic!("expected DuplicateLink, got {other:?}"),
        }
    }

    #[test]
    fn dangling_child_fails() {
        let mut robot = two_link_chain();
        robot.joints[0].child = "forearm".to_string();
        match robot.validate() {
            Err(UrdfError::DanglingLink { joint, link }) => {
                assert_eq!(joint, "shoulder");
                assert_eq!(link, "forearm");
            }
            other => panic!("expected DanglingLink, got {other:?}"),
        }
    }

    #[test]
    fn second_parent_for_a_link_fails() {
        let mut robot = two_link_chain();
        robot
            .joints
            .push(joint("shoulder2", JointType::Revolute, "base", "upper"));
        match robot.validate() {
            Err(UrdfError::LinkHasTwoParents { link }) => assert_eq!(link, "upper"),
            other => panic!("expected LinkHasTwoParents, got {other:?}"),
        }
    }

    #[test]
    fn disconnected_island_is_a_second_root() {
        let mut robot = two_link_chain();
        robot.links.push(link("floating", Some(1.0)));
        match robot.validate() {
            Err(UrdfError::MultipleRoots { .. }) => {}
            other => panic!("expected MultipleRoots, got {other:?}"),
        }
    }

    #[test]
    fn massless_articulated_link_fails() {
        let mut robot = two_link_chain();
        robot.links[1].inertial = None;
        match robot.validate() {
            Err(UrdfError::MissingInertial { link }) => assert_eq!(link, "upper"),
            other => panic!("expected MissingInertial, got {other:?}"),
        }
    }

    #[test]
    fn massless_fixed_frame_is_allowed() {
        let mut robot = two_link_chain();
        robot.links.push(link("tip", None));
        robot
            .joints
            .push(joint("tip_weld", JointType::Fixed, "upper", "tip"));
        assert!(robot.validate().is_ok());
        assert_eq!(robot.root_link(), robot.link_index("base"));
    }
}
