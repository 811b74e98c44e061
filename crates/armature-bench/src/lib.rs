//! Benchmark profiles for the Armature simulator.
//!
//! Pre-built simulators over the reference double-pendulum scenario,
//! shared by the benches and the `double_pendulum` example:
//!
//! - [`scenario_simulator`]: the fully configured scenario for a solver
//! - [`scenario_state`]: its initial state
//! - [`urdf_path`]: the on-disk robot description the scenario loads

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::PathBuf;

use nalgebra::DVector;

use armature_engine::{ControllerFunctor, Model, Simulator, Solver};

/// Path of the double-pendulum URDF shipped with this crate.
pub fn urdf_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("double_pendulum.urdf")
}

/// The scenario initial state: at rest, 0.1 rad on the second joint.
pub fn scenario_state() -> DVector<f64> {
    let mut x0 = DVector::zeros(4);
    x0[1] = 0.1;
    x0
}

/// The scenario model: the on-disk double pendulum with one motor on
/// the second joint and no contact frames.
pub fn scenario_model() -> Model {
    let path = urdf_path();
    let mut model = Model::new();
    model
        .initialize(
            path.to_str().expect("data path is valid UTF-8"),
            &[],
            &["SecondPendulumJoint"],
            false,
        )
        .unwrap();
    model
}

/// Build the reference scenario simulator for the given solver.
///
/// Zero command and internal-dynamics callbacks, and the scenario
/// option literals: tolRel 1e-5, tolAbs 1e-4, dtMax 2 ms, 1 kHz sensor
/// and controller updates, seed 0.
pub fn scenario_simulator(solver: Solver) -> Simulator {
    let model = scenario_model();
    let mut controller = ControllerFunctor::new(|_, _, _, _| {}, |_, _, _, _| {});
    controller.initialize(&model).unwrap();
    let mut sim = Simulator::new(model, controller).unwrap();

    let mut node = sim.engine_options();
    {
        let world = node.node_mut("world").unwrap();
        world.set("gravity", vec![0.0, 0.0, -9.81]);
    }
    {
        let stepper = node.node_mut("stepper").unwrap();
        stepper.set("solver", solver.name());
        stepper.set("tolRel", 1.0e-5);
        stepper.set("tolAbs", 1.0e-4);
        stepper.set("dtMax", 2.0e-3);
        stepper.set("iterMax", 100_000_i64);
        stepper.set("sensorsUpdatePeriod", 1.0e-3);
        stepper.set("controllerUpdatePeriod", 1.0e-3);
        stepper.set("randomSeed", 0_i64);
    }
    {
        let contacts = node.node_mut("contacts").unwrap();
        contacts.set("stiffness", 1.0e6);
        contacts.set("damping", 2000.0);
        contacts.set("dryFrictionVelEps", 0.01);
        contacts.set("frictionDry", 5.0);
        contacts.set("frictionViscous", 5.0);
        contacts.set("transitionEps", 0.001);
    }
    {
        let telemetry = node.node_mut("telemetry").unwrap();
        telemetry.set("enableConfiguration", true);
        telemetry.set("enableVelocity", true);
        telemetry.set("enableAcceleration", true);
        telemetry.set("enableCommand", true);
        telemetry.set("enableEnergy", true);
    }
    sim.set_engine_options(&node).unwrap();

    let mut model_node = sim.model().model_options();
    model_node
        .node_mut("telemetry")
        .unwrap()
        .set("enableImuSensors", true);
    sim.model_mut().set_model_options(&model_node).unwrap();

    sim
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_simulator_builds_for_both_solvers() {
        for solver in [Solver::RungeKuttaDopri5, Solver::ExplicitEuler] {
            let sim = scenario_simulator(solver);
            let node = sim.engine_options();
            let stepper = node.get_node("stepper").unwrap();
            assert_eq!(stepper.get_str("solver").unwrap(), solver.name());
            assert_eq!(stepper.get_float("tolRel").unwrap(), 1.0e-5);
        }
    }

    #[test]
    fn scenario_runs_a_short_horizon() {
        let mut sim = scenario_simulator(Solver::RungeKuttaDopri5);
        sim.run(&scenario_state(), 0.02).unwrap();
        assert_eq!(sim.log().unwrap().nrows(), 21);
    }
}
