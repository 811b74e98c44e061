//! Typed option structs behind the dynamic option trees.
//!
//! Every device hands out its options as a [`ConfigNode`] and parses
//! the tree back into one of these structs when it is pushed in again.
//! Parsing rejects unknown keys, wrong types, and unusable values, so
//! a misspelled or out-of-range option fails at `set_*_options` time
//! rather than mid-run.

use armature_core::{ConfigError, ConfigNode};
use nalgebra::Vector3;

// ── Solver ─────────────────────────────────────────────────────────

/// Integration scheme used by the stepper.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Solver {
    /// Dormand-Prince 5(4) adaptive Runge-Kutta.
    #[default]
    RungeKuttaDopri5,
    /// Fixed-step explicit Euler at `dtMax`.
    ExplicitEuler,
}

impl Solver {
    /// Name used in the `stepper.solver` option.
    pub fn name(self) -> &'static str {
        match self {
            Self::RungeKuttaDopri5 => "runge_kutta_dopri5",
            Self::ExplicitEuler => "explicit_euler",
        }
    }

    /// Parse a `stepper.solver` option value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "runge_kutta_dopri5" => Some(Self::RungeKuttaDopri5),
            "explicit_euler" => Some(Self::ExplicitEuler),
            _ => None,
        }
    }
}

// ── Engine options ─────────────────────────────────────────────────

/// `telemetry` group of the engine options: which signal families get
/// a log column.
#[derive(Clone, Debug, PartialEq)]
pub struct TelemetryOptions {
    /// Log the generalized configuration.
    pub enable_configuration: bool,
    /// Log the generalized velocity.
    pub enable_velocity: bool,
    /// Log the generalized acceleration.
    pub enable_acceleration: bool,
    /// Log the motor command torques.
    pub enable_command: bool,
    /// Log the total mechanical energy.
    pub enable_energy: bool,
}

impl Default for TelemetryOptions {
    fn default() -> Self {
        Self {
            enable_configuration: true,
            enable_velocity: true,
            enable_acceleration: true,
            enable_command: true,
            enable_energy: true,
        }
    }
}

/// `world` group of the engine options.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldOptions {
    /// World gravity vector.
    pub gravity: Vector3<f64>,
}

impl Default for WorldOptions {
    fn default() -> Self {
        Self {
            gravity: Vector3::new(0.0, 0.0, -9.81),
        }
    }
}

/// `stepper` group of the engine options.
#[derive(Clone, Debug, PartialEq)]
pub struct StepperOptions {
    /// Integration scheme.
    pub solver: Solver,
    /// Relative tolerance of the adaptive error control.
    pub tol_rel: f64,
    /// Absolute tolerance of the adaptive error control.
    pub tol_abs: f64,
    /// Largest step size the stepper may take.
    pub dt_max: f64,
    /// Budget of attempted integration steps per run.
    pub iter_max: i64,
    /// Period of sensor refreshes and telemetry rows. Zero disables
    /// periodic updates (sensors sample at the run boundaries only).
    pub sensors_update_period: f64,
    /// Period of the zero-order-hold command updates. Zero holds the
    /// initial command for the whole run.
    pub controller_update_period: f64,
    /// Seed of the per-run sensor-noise stream.
    pub random_seed: i64,
}

impl Default for StepperOptions {
    fn default() -> Self {
        Self {
            solver: Solver::RungeKuttaDopri5,
            tol_rel: 1.0e-4,
            tol_abs: 1.0e-6,
            dt_max: 1.0e-3,
            iter_max: 100_000,
            sensors_update_period: 1.0e-3,
            controller_update_period: 1.0e-3,
            random_seed: 0,
        }
    }
}

/// `contacts` group of the engine options: the ground-reaction model
/// applied at every contact frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ContactOptions {
    /// Normal spring stiffness.
    pub stiffness: f64,
    /// Normal damping, applied while the frame moves downward.
    pub damping: f64,
    /// Tangential velocity below which dry friction ramps in.
    pub dry_friction_vel_eps: f64,
    /// Dry friction coefficient.
    pub friction_dry: f64,
    /// Viscous friction coefficient.
    pub friction_viscous: f64,
    /// Penetration depth over which the whole wrench blends in.
    pub transition_eps: f64,
}

impl Default for ContactOptions {
    fn default() -> Self {
        Self {
            stiffness: 1.0e6,
            damping: 2000.0,
            dry_friction_vel_eps: 0.01,
            friction_dry: 5.0,
            friction_viscous: 5.0,
            transition_eps: 0.001,
        }
    }
}

/// The complete engine option tree as a typed struct.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EngineOptions {
    /// `telemetry` group.
    pub telemetry: TelemetryOptions,
    /// `world` group.
    pub world: WorldOptions,
    /// `stepper` group.
    pub stepper: StepperOptions,
    /// `contacts` group.
    pub contacts: ContactOptions,
}

impl EngineOptions {
    /// Render as the dynamic tree handed to callers.
    pub fn to_node(&self) -> ConfigNode {
        let mut telemetry = ConfigNode::new();
        telemetry.set("enableConfiguration", self.telemetry.enable_configuration);
        telemetry.set("enableVelocity", self.telemetry.enable_velocity);
        telemetry.set("enableAcceleration", self.telemetry.enable_acceleration);
        telemetry.set("enableCommand", self.telemetry.enable_command);
        telemetry.set("enableEnergy", self.telemetry.enable_energy);

        let mut world = ConfigNode::new();
        world.set(
            "gravity",
            vec![self.world.gravity.x, self.world.gravity.y, self.world.gravity.z],
        );

        let mut stepper = ConfigNode::new();
        stepper.set("solver", self.stepper.solver.name());
        stepper.set("tolRel", self.stepper.tol_rel);
        stepper.set("tolAbs", self.stepper.tol_abs);
        stepper.set("dtMax", self.stepper.dt_max);
        stepper.set("iterMax", self.stepper.iter_max);
        stepper.set("sensorsUpdatePeriod", self.stepper.sensors_update_period);
        stepper.set("controllerUpdatePeriod", self.stepper.controller_update_period);
        stepper.set("randomSeed", self.stepper.random_seed);

        let mut contacts = ConfigNode::new();
        contacts.set("stiffness", self.contacts.stiffness);
        contacts.set("damping", self.contacts.damping);
        contacts.set("dryFrictionVelEps", self.contacts.dry_friction_vel_eps);
        contacts.set("frictionDry", self.contacts.friction_dry);
        contacts.set("frictionViscous", self.contacts.friction_viscous);
        contacts.set("transitionEps", self.contacts.transition_eps);

        let mut root = ConfigNode::new();
        root.set("telemetry", telemetry);
        root.set("world", world);
        root.set("stepper", stepper);
        root.set("contacts", contacts);
        root
    }

    /// Parse and validate a tree produced by [`to_node`](Self::to_node),
    /// possibly modified by the caller.
    pub fn from_node(node: &ConfigNode) -> Result<Self, ConfigError> {
        node.reject_unknown(&["telemetry", "world", "stepper", "contacts"])?;

        let telemetry = node.get_node("telemetry")?;
        telemetry.reject_unknown(&[
            "enableConfiguration",
            "enableVelocity",
            "enableAcceleration",
            "enableCommand",
            "enableEnergy",
        ])?;
        let telemetry = TelemetryOptions {
            enable_configuration: telemetry.get_bool("enableConfiguration")?,
            enable_velocity: telemetry.get_bool("enableVelocity")?,
            enable_acceleration: telemetry.get_bool("enableAcceleration")?,
            enable_command: telemetry.get_bool("enableCommand")?,
            enable_energy: telemetry.get_bool("enableEnergy")?,
        };

        let world = node.get_node("world")?;
        world.reject_unknown(&["gravity"])?;
        let gravity = world.get_floats("gravity")?;
        if gravity.len() != 3 {
            return Err(ConfigError::invalid_value(
                "world.gravity",
                format!("expected 3 components, got {}", gravity.len()),
            ));
        }
        if gravity.iter().any(|g| !g.is_finite()) {
            return Err(ConfigError::invalid_value(
                "world.gravity",
                "components must be finite",
            ));
        }
        let world = WorldOptions {
            gravity: Vector3::new(gravity[0], gravity[1], gravity[2]),
        };

        let stepper = node.get_node("stepper")?;
        stepper.reject_unknown(&[
            "solver",
            "tolRel",
            "tolAbs",
            "dtMax",
            "iterMax",
            "sensorsUpdatePeriod",
            "controllerUpdatePeriod",
            "randomSeed",
        ])?;
        let solver_name = stepper.get_str("solver")?;
        let solver = Solver::from_name(solver_name).ok_or_else(|| {
            ConfigError::invalid_value(
                "stepper.solver",
                format!("unknown solver '{solver_name}'"),
            )
        })?;
        let tol_rel = positive("stepper.tolRel", stepper.get_float("tolRel")?)?;
        let tol_abs = positive("stepper.tolAbs", stepper.get_float("tolAbs")?)?;
        let dt_max = positive("stepper.dtMax", stepper.get_float("dtMax")?)?;
        let iter_max = stepper.get_int("iterMax")?;
        if iter_max <= 0 {
            return Err(ConfigError::invalid_value(
                "stepper.iterMax",
                format!("must be positive, got {iter_max}"),
            ));
        }
        let sensors_update_period = period(
            "stepper.sensorsUpdatePeriod",
            stepper.get_float("sensorsUpdatePeriod")?,
        )?;
        let controller_update_period = period(
            "stepper.controllerUpdatePeriod",
            stepper.get_float("controllerUpdatePeriod")?,
        )?;
        let random_seed = stepper.get_int("randomSeed")?;
        if !(0..=i64::from(u32::MAX)).contains(&random_seed) {
            return Err(ConfigError::invalid_value(
                "stepper.randomSeed",
                format!("must fit an unsigned 32-bit value, got {random_seed}"),
            ));
        }
        let stepper = StepperOptions {
            solver,
            tol_rel,
            tol_abs,
            dt_max,
            iter_max,
            sensors_update_period,
            controller_update_period,
            random_seed,
        };

        let contacts = node.get_node("contacts")?;
        contacts.reject_unknown(&[
            "stiffness",
            "damping",
            "dryFrictionVelEps",
            "frictionDry",
            "frictionViscous",
            "transitionEps",
        ])?;
        let contacts = ContactOptions {
            stiffness: non_negative("contacts.stiffness", contacts.get_float("stiffness")?)?,
            damping: non_negative("contacts.damping", contacts.get_float("damping")?)?,
            dry_friction_vel_eps: positive(
                "contacts.dryFrictionVelEps",
                contacts.get_float("dryFrictionVelEps")?,
            )?,
            friction_dry: non_negative(
                "contacts.frictionDry",
                contacts.get_float("frictionDry")?,
            )?,
            friction_viscous: non_negative(
                "contacts.frictionViscous",
                contacts.get_float("frictionViscous")?,
            )?,
            transition_eps: positive(
                "contacts.transitionEps",
                contacts.get_float("transitionEps")?,
            )?,
        };

        Ok(Self {
            telemetry,
            world,
            stepper,
            contacts,
        })
    }
}

fn positive(key: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::invalid_value(
            key,
            format!("must be finite and positive, got {value}"),
        ))
    }
}

fn non_negative(key: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::invalid_value(
            key,
            format!("must be finite and non-negative, got {value}"),
        ))
    }
}

fn period(key: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::invalid_value(
            key,
            format!("must be finite and non-negative, got {value}"),
        ))
    }
}

// ── Model options ──────────────────────────────────────────────────

/// `telemetry` group of the model options: which sensor types get log
/// columns.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelTelemetryOptions {
    /// Log IMU measurements.
    pub enable_imu_sensors: bool,
    /// Log force-sensor measurements.
    pub enable_force_sensors: bool,
    /// Log encoder measurements.
    pub enable_encoder_sensors: bool,
}

impl Default for ModelTelemetryOptions {
    fn default() -> Self {
        Self {
            enable_imu_sensors: true,
            enable_force_sensors: true,
            enable_encoder_sensors: true,
        }
    }
}

/// `joints` group of the model options.
#[derive(Clone, Debug, PartialEq)]
pub struct JointOptions {
    /// Apply a restoring torque when a joint leaves its position bounds.
    pub enable_position_limit: bool,
}

impl Default for JointOptions {
    fn default() -> Self {
        Self {
            enable_position_limit: true,
        }
    }
}

/// `motors` group of the model options: internal joint friction at the
/// actuated joints. Disabled by default; empty coefficient vectors
/// stand for all-zero.
#[derive(Clone, Debug, PartialEq)]
pub struct MotorOptions {
    /// Apply the friction law at the actuated joints.
    pub enable_friction: bool,
    /// Per-motor viscous friction coefficients.
    pub friction_viscous: Vec<f64>,
    /// Per-motor dry friction coefficients.
    pub friction_dry: Vec<f64>,
    /// Velocity scale of the dry-friction regularization.
    pub dry_friction_vel_eps: f64,
}

impl Default for MotorOptions {
    fn default() -> Self {
        Self {
            enable_friction: false,
            friction_viscous: Vec::new(),
            friction_dry: Vec::new(),
            dry_friction_vel_eps: 0.01,
        }
    }
}

/// The complete model option tree as a typed struct.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelOptions {
    /// `telemetry` group.
    pub telemetry: ModelTelemetryOptions,
    /// `joints` group.
    pub joints: JointOptions,
    /// `motors` group.
    pub motors: MotorOptions,
}

impl ModelOptions {
    /// Render as the dynamic tree handed to callers.
    pub fn to_node(&self) -> ConfigNode {
        let mut telemetry = ConfigNode::new();
        telemetry.set("enableImuSensors", self.telemetry.enable_imu_sensors);
        telemetry.set("enableForceSensors", self.telemetry.enable_force_sensors);
        telemetry.set("enableEncoderSensors", self.telemetry.enable_encoder_sensors);

        let mut joints = ConfigNode::new();
        joints.set("enablePositionLimit", self.joints.enable_position_limit);

        let mut motors = ConfigNode::new();
        motors.set("enableFriction", self.motors.enable_friction);
        motors.set("frictionViscous", self.motors.friction_viscous.clone());
        motors.set("frictionDry", self.motors.friction_dry.clone());
        motors.set("dryFrictionVelEps", self.motors.dry_friction_vel_eps);

        let mut root = ConfigNode::new();
        root.set("telemetry", telemetry);
        root.set("joints", joints);
        root.set("motors", motors);
        root
    }

    /// Parse and validate a tree produced by [`to_node`](Self::to_node).
    ///
    /// `nu` is the motor count; non-empty friction vectors must match it.
    pub fn from_node(node: &ConfigNode, nu: usize) -> Result<Self, ConfigError> {
        node.reject_unknown(&["telemetry", "joints", "motors"])?;

        let telemetry = node.get_node("telemetry")?;
        telemetry.reject_unknown(&[
            "enableImuSensors",
            "enableForceSensors",
            "enableEncoderSensors",
        ])?;
        let telemetry = ModelTelemetryOptions {
            enable_imu_sensors: telemetry.get_bool("enableImuSensors")?,
            enable_force_sensors: telemetry.get_bool("enableForceSensors")?,
            enable_encoder_sensors: telemetry.get_bool("enableEncoderSensors")?,
        };

        let joints = node.get_node("joints")?;
        joints.reject_unknown(&["enablePositionLimit"])?;
        let joints = JointOptions {
            enable_position_limit: joints.get_bool("enablePositionLimit")?,
        };

        let motors = node.get_node("motors")?;
        motors.reject_unknown(&[
            "enableFriction",
            "frictionViscous",
            "frictionDry",
            "dryFrictionVelEps",
        ])?;
        let friction_viscous = motors.get_floats("frictionViscous")?.to_vec();
        let friction_dry = motors.get_floats("frictionDry")?.to_vec();
        for (key, values) in [
            ("motors.frictionViscous", &friction_viscous),
            ("motors.frictionDry", &friction_dry),
        ] {
            if !values.is_empty() && values.len() != nu {
                return Err(ConfigError::invalid_value(
                    key,
                    format!("expected {nu} coefficients, got {}", values.len()),
                ));
            }
            if values.iter().any(|c| !c.is_finite() || *c < 0.0) {
                return Err(ConfigError::invalid_value(
                    key,
                    "coefficients must be finite and non-negative",
                ));
            }
        }
        let motors = MotorOptions {
            enable_friction: motors.get_bool("enableFriction")?,
            friction_viscous,
            friction_dry,
            dry_friction_vel_eps: positive(
                "motors.dryFrictionVelEps",
                motors.get_float("dryFrictionVelEps")?,
            )?,
        };

        Ok(Self {
            telemetry,
            joints,
            motors,
        })
    }
}

// ── Controller options ─────────────────────────────────────────────

/// Options of a [`ControllerFunctor`](crate::ControllerFunctor).
#[derive(Clone, Debug, PartialEq)]
pub struct ControllerOptions {
    /// Log the controller's registered telemetry entries.
    pub telemetry_enable: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            telemetry_enable: true,
        }
    }
}

impl ControllerOptions {
    /// Render as the dynamic tree handed to callers.
    pub fn to_node(&self) -> ConfigNode {
        let mut root = ConfigNode::new();
        root.set("telemetryEnable", self.telemetry_enable);
        root
    }

    /// Parse a tree produced by [`to_node`](Self::to_node).
    pub fn from_node(node: &ConfigNode) -> Result<Self, ConfigError> {
        node.reject_unknown(&["telemetryEnable"])?;
        Ok(Self {
            telemetry_enable: node.get_bool("telemetryEnable")?,
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_options_round_trip_the_default_tree() {
        let options = EngineOptions::default();
        let node = options.to_node();
        assert_eq!(EngineOptions::from_node(&node).unwrap(), options);
    }

    #[test]
    fn scenario_literals_round_trip() {
        let mut node = EngineOptions::default().to_node();
        {
            let world = node.node_mut("world").unwrap();
            world.set("gravity", vec![0.0, 0.0, -9.81]);
        }
        {
            let stepper = node.node_mut("stepper").unwrap();
            stepper.set("solver", "runge_kutta_dopri5");
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
        let options = EngineOptions::from_node(&node).unwrap();
        assert_eq!(options.stepper.solver, Solver::RungeKuttaDopri5);
        assert_eq!(options.stepper.tol_rel, 1.0e-5);
        assert_eq!(options.contacts.friction_dry, 5.0);
        // Rendering back yields the exact same tree.
        assert_eq!(options.to_node(), node);
    }

    #[test]
    fn unknown_solver_is_rejected() {
        let mut node = EngineOptions::default().to_node();
        node.node_mut("stepper").unwrap().set("solver", "implicit_midpoint");
        match EngineOptions::from_node(&node) {
            Err(ConfigError::InvalidValue { key, .. }) => {
                assert_eq!(key, "stepper.solver");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn non_positive_tolerances_are_rejected() {
        for (key, value) in [("tolRel", 0.0), ("tolAbs", -1.0e-6), ("dtMax", f64::NAN)] {
            let mut node = EngineOptions::default().to_node();
            node.node_mut("stepper").unwrap().set(key, value);
            assert!(
                EngineOptions::from_node(&node).is_err(),
                "stepper.{key} = {value} must be rejected"
            );
        }
    }

    #[test]
    fn non_positive_iter_max_is_rejected() {
        let mut node = EngineOptions::default().to_node();
        node.node_mut("stepper").unwrap().set("iterMax", 0_i64);
        assert!(EngineOptions::from_node(&node).is_err());
    }

    #[test]
    fn negative_update_period_is_rejected() {
        let mut node = EngineOptions::default().to_node();
        node.node_mut("stepper").unwrap().set("sensorsUpdatePeriod", -1.0e-3);
        assert!(EngineOptions::from_node(&node).is_err());
    }

    #[test]
    fn zero_update_period_is_allowed() {
        let mut node = EngineOptions::default().to_node();
        node.node_mut("stepper").unwrap().set("sensorsUpdatePeriod", 0.0);
        node.node_mut("stepper").unwrap().set("controllerUpdatePeriod", 0.0);
        assert!(EngineOptions::from_node(&node).is_ok());
    }

    #[test]
    fn out_of_range_seed_is_rejected() {
        for seed in [-1_i64, i64::from(u32::MAX) + 1] {
            let mut node = EngineOptions::default().to_node();
            node.node_mut("stepper").unwrap().set("randomSeed", seed);
            assert!(EngineOptions::from_node(&node).is_err(), "seed {seed}");
        }
    }

    #[test]
    fn wrong_gravity_arity_is_rejected() {
        let mut node = EngineOptions::default().to_node();
        node.node_mut("world").unwrap().set("gravity", vec![0.0, -9.81]);
        match EngineOptions::from_node(&node) {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "world.gravity"),
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn stray_key_is_rejected_per_group() {
        let mut node = EngineOptions::default().to_node();
        node.node_mut("contacts").unwrap().set("restitution", 0.5);
        match EngineOptions::from_node(&node) {
            Err(ConfigError::UnknownKey { key }) => assert_eq!(key, "restitution"),
            other => panic!("expected UnknownKey, got {other:?}"),
        }
    }

    #[test]
    fn model_options_round_trip() {
        let options = ModelOptions::default();
        let node = options.to_node();
        assert_eq!(ModelOptions::from_node(&node, 1).unwrap(), options);
    }

    #[test]
    fn motor_friction_vectors_must_match_motor_count() {
        let mut node = ModelOptions::default().to_node();
        node.node_mut("motors").unwrap().set("frictionDry", vec![1.0, 2.0]);
        assert!(ModelOptions::from_node(&node, 1).is_err());
        assert!(ModelOptions::from_node(&node, 2).is_ok());
    }

    #[test]
    fn controller_options_round_trip() {
        let mut node = ControllerOptions::default().to_node();
        node.set("telemetryEnable", false);
        let options = ControllerOptions::from_node(&node).unwrap();
        assert!(!options.telemetry_enable);
        assert_eq!(options.to_node(), node);
    }
}
