//! Armature: a rigid-body simulator for poly-articulated robots.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all Armature sub-crates. For most users, adding `armature` as
//! a single dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use armature::nalgebra::DVector;
//! use armature::prelude::*;
//!
//! let urdf = r#"<?xml version="1.0"?>
//! <robot name="pendulum">
//!   <link name="base"/>
//!   <link name="arm">
//!     <inertial>
//!       <origin xyz="0 0 -0.5"/>
//!       <mass value="1.0"/>
//!       <inertia ixx="0.084" iyy="0.084" izz="0.002"/>
//!     </inertial>
//!   </link>
//!   <joint name="Pivot" type="continuous">
//!     <parent link="base"/>
//!     <child link="arm"/>
//!     <origin xyz="0 0 1"/>
//!     <axis xyz="0 1 0"/>
//!   </joint>
//! </robot>"#;
//!
//! // A one-motor pendulum with a do-nothing controller.
//! let mut model = Model::new();
//! model
//!     .initialize_from_str(urdf, "pendulum.urdf", &[], &["Pivot"], false)
//!     .unwrap();
//! let mut controller = ControllerFunctor::new(|_, _, _, _| {}, |_, _, _, _| {});
//! controller.initialize(&model).unwrap();
//! let mut simulator = Simulator::new(model, controller).unwrap();
//!
//! // Swing for 100 ms from a 0.1 rad offset; one telemetry row per
//! // millisecond plus the initial sample.
//! let mut x0 = DVector::zeros(2);
//! x0[0] = 0.1;
//! simulator.run(&x0, 0.1).unwrap();
//! assert_eq!(simulator.log().unwrap().nrows(), 101);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in
//! the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `armature-core` | Option trees and generalized state |
//! | [`urdf`] | `armature-urdf` | URDF parsing into robot descriptions |
//! | [`rigid`] | `armature-rigid` | Kinematics and dynamics algorithms |
//! | [`sensor`] | `armature-sensor` | IMU, encoder, and force sensors |
//! | [`telemetry`] | `armature-telemetry` | Log recording and export |
//! | [`engine`] | `armature-engine` | The closed-loop simulator |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Option trees and generalized state (`armature-core`).
///
/// Contains [`types::ConfigNode`], the dynamic option tree every
/// configurable device exposes, and the [`types::State`] pair.
pub use armature_core as types;

/// URDF parsing (`armature-urdf`).
///
/// [`urdf::load_urdf`] and [`urdf::load_urdf_str`] turn a robot
/// description file into the [`urdf::RobotDescription`] the rigid
/// layer consumes.
pub use armature_urdf as urdf;

/// Rigid-body kinematics and dynamics (`armature-rigid`).
///
/// The [`rigid::RigidModel`]/[`rigid::RigidData`] pair and the
/// algorithms over them: forward kinematics, CRBA, RNEA, and forward
/// dynamics.
pub use armature_rigid as rigid;

/// Sensor models (`armature-sensor`).
///
/// [`sensor::ImuSensor`], [`sensor::EncoderSensor`], and
/// [`sensor::ForceSensor`], plus the [`sensor::Sensor`] trait for
/// custom measurements.
pub use armature_sensor as sensor;

/// Telemetry recording and export (`armature-telemetry`).
///
/// In-memory [`telemetry::Log`]s, CSV and binary export, and
/// trajectory extraction.
pub use armature_telemetry as telemetry;

/// The closed-loop simulation engine (`armature-engine`).
///
/// [`engine::Model`], [`engine::ControllerFunctor`], and
/// [`engine::Simulator`] wire the lower layers into a runnable loop.
pub use armature_engine as engine;

/// Linear algebra backbone, re-exported for convenience.
///
/// The public API speaks [`nalgebra::DVector`] and friends; this
/// re-export saves downstream crates a separate version-matched
/// dependency.
pub use nalgebra;

/// Common imports for typical Armature usage.
///
/// ```rust
/// use armature::prelude::*;
/// ```
///
/// This imports the most frequently used types: the simulator triple,
/// option trees, the rigid-body pair, sensors, and logs.
pub mod prelude {
    // Option trees and state
    pub use armature_core::{ConfigNode, ConfigValue, State};

    // Robot descriptions
    pub use armature_urdf::{load_urdf, load_urdf_str, RobotDescription};

    // Rigid-body layer
    pub use armature_rigid::{RigidData, RigidModel};

    // Sensors
    pub use armature_sensor::{EncoderSensor, ForceSensor, ImuSensor, Sensor};

    // Telemetry
    pub use armature_telemetry::{Log, Trajectory};

    // Engine
    pub use armature_engine::{ControllerFunctor, Model, Simulator, Solver};

    // Errors
    pub use armature_core::{ConfigError, StateError};
    pub use armature_engine::{ModelError, SimulatorError};
    pub use armature_rigid::RigidError;
    pub use armature_sensor::SensorError;
    pub use armature_telemetry::TelemetryError;
}
