//! Rigid-body layer errors.

use std::error::Error;
use std::fmt;

use armature_urdf::UrdfError;

/// Errors from model construction or the dynamics algorithms.
#[derive(Clone, Debug, PartialEq)]
pub enum RigidError {
    /// The robot description is not a usable kinematic tree.
    Description(UrdfError),
    /// A vector argument has the wrong length.
    DimensionMismatch {
        /// What the vector holds.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Provided length.
        found: usize,
    },
    /// The mass matrix is not positive definite at this configuration.
    SingularMassMatrix,
    /// A body, joint, or frame name did not resolve.
    NameNotFound {
        /// The kind of entity looked up.
        kind: &'static str,
        /// The name that failed to resolve.
        name: String,
    },
}

impl fmt::Display for RigidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Description(e) => write!(f, "description: {e}"),
            Self::DimensionMismatch {
                what,
                expected,
                found,
            } => {
                write!(f, "{what} has length {found}, expected {expected}")
            }
            Self::SingularMassMatrix => {
                write!(f, "mass matrix is not positive definite")
            }
            Self::NameNotFound { kind, name } => {
                write!(f, "no {kind} named '{name}'")
            }
        }
    }
}

impl Error for RigidError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Description(e) => Some(e),
            _ => None,
        }
    }
}

impl From<UrdfError> for RigidError {
    fn from(e: UrdfError) -> Self {
        Self::Description(e)
    }
}
