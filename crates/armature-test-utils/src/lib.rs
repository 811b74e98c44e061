//! Shared fixtures and builders for Armature development.
//!
//! Canonical robot descriptions (a double pendulum and a configurable
//! single pendulum) plus ready-made model, controller, and simulator
//! builders, so tests and benches across the workspace agree on one
//! reference mechanism.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod fixtures;

pub use fixtures::{single_pendulum_urdf, DOUBLE_PENDULUM_URDF};

use armature_engine::{ControllerFunctor, Model, Simulator};
use armature_rigid::{RigidData, RigidModel};
use armature_urdf::load_urdf_str;

/// Path label recorded in logs produced from the in-memory fixture.
pub const DOUBLE_PENDULUM_LABEL: &str = "double_pendulum.urdf";

/// Rigid model of the canonical double pendulum, with its workspace.
pub fn double_pendulum_rigid() -> (RigidModel, RigidData) {
    let description = load_urdf_str(DOUBLE_PENDULUM_URDF).expect("fixture parses");
    let model = RigidModel::from_description(&description).expect("fixture builds");
    let data = RigidData::new(&model);
    (model, data)
}

/// Device model of the canonical double pendulum: one motor on the
/// second joint, no contact frames.
pub fn double_pendulum_model() -> Model {
    let mut model = Model::new();
    model
        .initialize_from_str(
            DOUBLE_PENDULUM_URDF,
            DOUBLE_PENDULUM_LABEL,
            &[],
            &["SecondPendulumJoint"],
            false,
        )
        .expect("fixture initializes");
    model
}

/// A do-nothing controller bound to the given model.
pub fn zero_controller(model: &Model) -> ControllerFunctor {
    let mut controller = ControllerFunctor::new(|_, _, _, _| {}, |_, _, _, _| {});
    controller.initialize(model).expect("model is initialized");
    controller
}

/// A simulator over the canonical double pendulum with a zero
/// controller and default options.
pub fn double_pendulum_simulator() -> Simulator {
    let model = double_pendulum_model();
    let controller = zero_controller(&model);
    Simulator::new(model, controller).expect("parts are consistent")
}
