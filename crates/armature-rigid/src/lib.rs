//! Fixed-base rigid-body kinematics and dynamics for Armature.
//!
//! Builds an executable model ([`RigidModel`]) from a parsed robot
//! description and runs the classical recursive algorithms over it:
//! forward kinematics, the composite rigid body algorithm for the mass
//! matrix, recursive Newton-Euler for bias forces and inverse dynamics,
//! and a Cholesky-based forward dynamics on top of those.
//!
//! All spatial vectors are 6D with the angular block first, per
//! Featherstone's convention. Algorithms write into a reusable
//! [`RigidData`] workspace so stepping a model does not allocate.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod data;
pub mod dynamics;
pub mod error;
pub mod kinematics;
pub mod model;
pub mod spatial;

pub use data::RigidData;
pub use error::RigidError;
pub use model::{Body, Frame, JointKind, RigidModel};
pub use spatial::{SpatialInertia, SpatialVec};
