//! URDF robot description parsing for Armature.
//!
//! Reads the subset of URDF a fixed-base rigid-body model needs: links
//! with inertials, and revolute/continuous/prismatic/fixed joints with
//! origins, axes, and limits. Visuals, collisions, materials, and
//! transmission/gazebo extensions are skipped without error.
//!
//! Entry points are [`load_urdf`] for files and [`load_urdf_str`] for
//! in-memory documents; both return a validated [`RobotDescription`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod description;
pub mod error;
mod parser;

pub use description::{Inertial, JointLimit, JointType, RobotDescription, UrdfJoint, UrdfLink};
pub use error::UrdfError;
pub use parser::{load_urdf, load_urdf_str};
