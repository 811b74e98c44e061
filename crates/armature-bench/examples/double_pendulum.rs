//! Reference double-pendulum scenario.
//!
//! Builds the simulator from the shipped URDF, configures it with the
//! reference option literals, runs a warm-up pass then a timed 3 s
//! simulation, and prints the log summary.

use std::time::Instant;

use nalgebra::DVector;

use armature_bench::urdf_path;
use armature_engine::{ControllerFunctor, Model, Simulator};

fn main() {
    env_logger::init();

    // ── Initialize the simulation ──────────────────────────────────

    let path = urdf_path();
    let contacts: [&str; 0] = [];
    let motors = ["SecondPendulumJoint"];
    let mut model = Model::new();
    model
        .initialize(path.to_str().unwrap(), &contacts, &motors, false)
        .unwrap();

    let mut controller = ControllerFunctor::new(
        |_t, _q, _v, u: &mut DVector<f64>| u[0] = 0.0,
        |_t, _q, _v, u: &mut DVector<f64>| u.fill(0.0),
    );
    controller.initialize(&model).unwrap();

    let mut simulator = Simulator::new(model, controller).unwrap();

    // ── Configure the simulation ───────────────────────────────────

    let mut model_options = simulator.model().model_options();
    let sensors_options = simulator.model().sensors_options();
    let mut simu_options = simulator.engine_options();
    let ctrl_options = simulator.controller().controller_options();

    model_options
        .node_mut("telemetry")
        .unwrap()
        .set("enableImuSensors", true);
    {
        let telemetry = simu_options.node_mut("telemetry").unwrap();
        telemetry.set("enableConfiguration", true);
        telemetry.set("enableVelocity", true);
        telemetry.set("enableAcceleration", true);
        telemetry.set("enableCommand", true);
        telemetry.set("enableEnergy", true);
    }
    {
        let world = simu_options.node_mut("world").unwrap();
        world.set("gravity", vec![0.0, 0.0, -9.81]);
    }
    {
        let stepper = simu_options.node_mut("stepper").unwrap();
        stepper.set("solver", "runge_kutta_dopri5"); // or "explicit_euler"
        stepper.set("tolRel", 1.0e-5);
        stepper.set("tolAbs", 1.0e-4);
        stepper.set("dtMax", 2.0e-3); // 2.0e-4 for "explicit_euler"
        stepper.set("iterMax", 100_000_i64);
        stepper.set("sensorsUpdatePeriod", 1.0e-3);
        stepper.set("controllerUpdatePeriod", 1.0e-3);
        stepper.set("randomSeed", 0_i64);
    }
    {
        let contacts = simu_options.node_mut("contacts").unwrap();
        contacts.set("stiffness", 1.0e6);
        contacts.set("damping", 2000.0);
        contacts.set("dryFrictionVelEps", 0.01);
        contacts.set("frictionDry", 5.0);
        contacts.set("frictionViscous", 5.0);
        contacts.set("transitionEps", 0.001);
    }

    simulator
        .model_mut()
        .set_model_options(&model_options)
        .unwrap();
    simulator
        .model_mut()
        .set_sensors_options(&sensors_options)
        .unwrap();
    simulator.set_engine_options(&simu_options).unwrap();
    simulator
        .controller_mut()
        .set_controller_options(&ctrl_options)
        .unwrap();

    // ── Run the simulation ─────────────────────────────────────────

    let mut x0 = DVector::zeros(4);
    x0[1] = 0.1;
    let tf = 3.0;

    // Warm-up pass so caches and allocations do not skew the timing.
    simulator.run(&x0, 5.0e-2).unwrap();

    let start = Instant::now();
    simulator.run(&x0, tf).unwrap();
    println!("Simulation time: {:3.0}ms", start.elapsed().as_secs_f64() * 1.0e3);

    // ── Extract the results ────────────────────────────────────────

    let (log_info, log_data) = simulator.get_log().unwrap();
    let columns_at = log_info.iter().position(|s| s == "StartColumns").unwrap();
    let log_constants = &log_info[1..columns_at];
    let log_header = &log_info[columns_at + 1..log_info.len() - 1];

    println!("{} log points, {} columns", log_data.nrows(), log_header.len());
    println!("{log_constants:?}");
    let trajectory = simulator.extract_trajectory().unwrap();
    println!(
        "trajectory: {} states over [0, {:.1}] s",
        trajectory.states.len(),
        trajectory.times.last().copied().unwrap_or(0.0)
    );

    // Save the log in CSV
    // simulator.write_log("/tmp/blackbox/log.data", false).unwrap();

    // ── Display the results ────────────────────────────────────────

    // Plot the mechanical energy over time, e.g. with plotters:
    // let t = log_header.iter().position(|h| h == "Global.Time").unwrap();
    // let e = log_header.iter().position(|h| h == "HighLevelController.energy").unwrap();
    // plot(log_data.column(t), log_data.column(e));
}
