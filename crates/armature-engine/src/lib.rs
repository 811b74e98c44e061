//! Simulation engine for the Armature stack.
//!
//! Wires the lower layers into a runnable closed loop: a [`Model`]
//! wraps the rigid-body tree with sensors and device options, a
//! [`ControllerFunctor`] wraps a pair of user callbacks, and a
//! [`Simulator`] owns both and integrates the coupled dynamics with
//! breakpoint-accurate controller and sensor updates, ground contact,
//! user-registered external forces, and telemetry capture.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod contact;
pub mod controller;
pub mod error;
pub mod forces;
pub mod model;
pub mod options;
pub mod simulator;

mod stepper;

pub use contact::{ground_force, saturate_soft};
pub use controller::{ControlCallback, ControllerFunctor};
pub use error::{ModelError, SimulatorError};
pub use forces::ForceProfile;
pub use model::Model;
pub use options::{
    ContactOptions, ControllerOptions, EngineOptions, JointOptions, ModelOptions,
    ModelTelemetryOptions, MotorOptions, Solver, StepperOptions, TelemetryOptions, WorldOptions,
};
pub use simulator::Simulator;
