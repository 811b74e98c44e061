//! Closed-loop simulation engine.
//!
//! A [`Simulator`] owns one model and one controller and integrates
//! the coupled dynamics breakpoint to breakpoint: the command is held
//! constant between controller updates, sensors refresh and one
//! telemetry row is recorded at every sensor update, and the stepper
//! fills the gaps. Every run starts from scratch: engine state, sensor
//! noise stream, and telemetry are reset so a given seed reproduces
//! the exact same log.

use std::path::Path;

use nalgebra::{DMatrix, DVector, Vector3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use armature_core::{ConfigNode, State};
use armature_rigid::dynamics::{forward_dynamics, kinetic_energy, potential_energy};
use armature_rigid::kinematics::{
    forward_kinematics, frame_placement, frame_velocity, world_force_on_body,
};
use armature_rigid::{RigidData, RigidModel, SpatialVec};
use armature_sensor::{EncoderSensor, ForceSensor, ImuSensor, SensorContext, SensorSet};
use armature_telemetry::{write_binary_file, write_text_file, Log, TelemetryRecorder, Trajectory};

use crate::contact::{ground_force, saturate_soft};
use crate::controller::ControllerFunctor;
use crate::error::{ModelError, SimulatorError};
use crate::forces::{ExternalForces, ForceImpulse, ForceProfileEntry};
use crate::model::Model;
use crate::options::{ContactOptions, EngineOptions, ModelTelemetryOptions, MotorOptions};
use crate::stepper::{Derivative, Stepper};

/// Restoring stiffness applied past a joint position bound.
const JOINT_BOUND_STIFFNESS: f64 = 1.0e5;
/// Damping applied while a joint position bound is violated.
const JOINT_BOUND_DAMPING: f64 = 1.0e2;

/// Prefix of every engine- and controller-produced telemetry column.
const CONTROLLER_PREFIX: &str = "HighLevelController";

// ── Closed-loop derivative ─────────────────────────────────────────

/// The closed-loop derivative and its workspace for one run.
///
/// Owns every buffer the derivative evaluation touches, so the stepper
/// never allocates and the borrowed model and controller stay split
/// from the rest of the engine.
struct Dynamics<'a> {
    rigid: &'a RigidModel,
    motor_indices: &'a [usize],
    contact_frames: &'a [usize],
    contact_options: &'a ContactOptions,
    motor_options: &'a MotorOptions,
    position_limit: bool,
    limits: Vec<Option<(f64, f64)>>,
    controller: &'a mut ControllerFunctor,
    forces: &'a ExternalForces,
    data: RigidData,
    /// Zero-order-hold motor command.
    u_hold: DVector<f64>,
    q: DVector<f64>,
    v: DVector<f64>,
    tau: DVector<f64>,
    fext: Vec<SpatialVec>,
    contacts: Vec<(usize, Vector3<f64>)>,
    external: Vec<(usize, Vector3<f64>)>,
    nq: usize,
    nv: usize,
}

impl Dynamics<'_> {
    fn split_state(&mut self, x: &DVector<f64>) {
        self.q.copy_from(&x.rows(0, self.nq));
        self.v.copy_from(&x.rows(self.nq, self.nv));
    }

    /// Re-evaluate the command callback and refresh the held command.
    fn update_command(&mut self, t: f64, x: &DVector<f64>) {
        self.split_state(x);
        let u = self.controller.compute_command(t, &self.q, &self.v);
        self.u_hold.copy_from(u);
    }

    /// Total mechanical energy at the last evaluated state.
    fn energy(&self) -> f64 {
        kinetic_energy(self.rigid, &self.data) + potential_energy(self.rigid, &self.data)
    }
}

impl Derivative for Dynamics<'_> {
    fn eval(
        &mut self,
        t: f64,
        x: &DVector<f64>,
        dx: &mut DVector<f64>,
    ) -> Result<(), SimulatorError> {
        self.split_state(x);
        forward_kinematics(self.rigid, &mut self.data, &self.q, &self.v)?;

        // Ground reactions at the contact frames.
        self.contacts.clear();
        for &frame in self.contact_frames {
            let pose = frame_placement(&self.data, frame);
            let (_, vel) = frame_velocity(self.rigid, &self.data, frame);
            let force = ground_force(self.contact_options, &pose.translation.vector, &vel);
            if force != Vector3::zeros() {
                self.contacts.push((frame, force));
            }
        }

        // User-registered impulses and profiles.
        self.external.clear();
        if !self.forces.is_empty() {
            self.forces.accumulate(t, &self.q, &self.v, &mut self.external);
        }

        let has_fext = !self.contacts.is_empty() || !self.external.is_empty();
        if has_fext {
            for f in &mut self.fext {
                *f = SpatialVec::zeros();
            }
            for (frame, force) in self.contacts.iter().chain(self.external.iter()) {
                let Some(body) = self.rigid.frames()[*frame].body else {
                    continue;
                };
                let point = self.data.frame_pose[*frame].translation.vector;
                self.fext[body] += world_force_on_body(&self.data, body, *force, point);
            }
        }

        // Joint torques: held command through the motor map, then the
        // controller's internal dynamics, motor friction, and position
        // bounds.
        self.tau.fill(0.0);
        for (k, &j) in self.motor_indices.iter().enumerate() {
            self.tau[j] += self.u_hold[k];
        }
        let u_internal = self.controller.compute_internal_dynamics(t, &self.q, &self.v);
        self.tau += u_internal;

        if self.motor_options.enable_friction {
            let eps = self.motor_options.dry_friction_vel_eps;
            for (k, &j) in self.motor_indices.iter().enumerate() {
                let viscous = self.motor_options.friction_viscous.get(k).copied().unwrap_or(0.0);
                let dry = self.motor_options.friction_dry.get(k).copied().unwrap_or(0.0);
                self.tau[j] -=
                    viscous * self.v[j] + dry * saturate_soft(self.v[j] / eps, -1.0, 1.0, 0.7);
            }
        }

        if self.position_limit {
            for (j, limit) in self.limits.iter().enumerate() {
                let Some((lower, upper)) = limit else { continue };
                if self.q[j] > *upper {
                    self.tau[j] -= JOINT_BOUND_STIFFNESS * (self.q[j] - upper)
                        + JOINT_BOUND_DAMPING * self.v[j];
                } else if self.q[j] < *lower {
                    self.tau[j] -= JOINT_BOUND_STIFFNESS * (self.q[j] - lower)
                        + JOINT_BOUND_DAMPING * self.v[j];
                }
            }
        }

        let fext = has_fext.then_some(self.fext.as_slice());
        forward_dynamics(self.rigid, &mut self.data, &self.q, &self.v, &self.tau, fext)?;

        dx.rows_mut(0, self.nq).copy_from(&self.v);
        dx.rows_mut(self.nq, self.nv).copy_from(&self.data.ddq);
        Ok(())
    }
}

fn sensor_type_enabled(options: &ModelTelemetryOptions, sensor_type: &str) -> bool {
    match sensor_type {
        ImuSensor::TYPE => options.enable_imu_sensors,
        ForceSensor::TYPE => options.enable_force_sensors,
        EncoderSensor::TYPE => options.enable_encoder_sensors,
        _ => true,
    }
}

/// Assemble one telemetry row; must mirror the column registration
/// order in [`Simulator::run`] exactly.
#[allow(clippy::too_many_arguments)]
fn fill_row(
    row: &mut Vec<f64>,
    x: &DVector<f64>,
    dynamics: &Dynamics<'_>,
    sensors: &SensorSet,
    telemetry: &crate::options::TelemetryOptions,
    sensor_telemetry: &ModelTelemetryOptions,
    log_entries: bool,
    nq: usize,
    nv: usize,
) {
    row.clear();
    if telemetry.enable_configuration {
        row.extend(x.rows(0, nq).iter());
    }
    if telemetry.enable_velocity {
        row.extend(x.rows(nq, nv).iter());
    }
    if telemetry.enable_acceleration {
        row.extend(dynamics.data.ddq.iter());
    }
    if telemetry.enable_command {
        row.extend(dynamics.u_hold.iter());
    }
    if telemetry.enable_energy {
        row.push(dynamics.energy());
    }
    if log_entries {
        for (_, handle) in dynamics.controller.entries() {
            row.push(handle.get());
        }
    }
    for sensor in sensors.iter() {
        if sensor_type_enabled(sensor_telemetry, sensor.sensor_type()) {
            row.extend_from_slice(sensor.value());
        }
    }
}

/// Pull a computed breakpoint onto `target` when it lands within float
/// noise of it, so no phantom sliver interval is integrated.
fn snap_to(t: f64, target: f64) -> f64 {
    if (t - target).abs() <= 1.0e-9 * target.abs().max(1.0) {
        target
    } else {
        t
    }
}

// ── Simulator ──────────────────────────────────────────────────────

/// The simulation engine: one model, one controller, one option tree.
#[derive(Debug)]
pub struct Simulator {
    model: Model,
    controller: ControllerFunctor,
    options: EngineOptions,
    forces: ExternalForces,
    log: Option<Log>,
}

impl Simulator {
    /// Take ownership of an initialized model and controller pair.
    ///
    /// The controller must have been initialized against a model with
    /// the same motor and velocity dimensions.
    pub fn new(model: Model, controller: ControllerFunctor) -> Result<Self, SimulatorError> {
        if !model.is_initialized() {
            return Err(SimulatorError::Model(ModelError::NotInitialized));
        }
        let Some(dims) = controller.dims() else {
            return Err(SimulatorError::ControllerNotInitialized);
        };
        let expected = (model.nu(), model.nv());
        if dims != expected {
            return Err(SimulatorError::ControllerMismatch {
                controller: dims,
                model: expected,
            });
        }
        Ok(Self {
            model,
            controller,
            options: EngineOptions::default(),
            forces: ExternalForces::default(),
            log: None,
        })
    }

    /// The owned model.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// The owned model, mutably (sensor and option changes).
    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    /// The owned controller.
    pub fn controller(&self) -> &ControllerFunctor {
        &self.controller
    }

    /// The owned controller, mutably.
    pub fn controller_mut(&mut self) -> &mut ControllerFunctor {
        &mut self.controller
    }

    /// Current engine options as a tree.
    pub fn engine_options(&self) -> ConfigNode {
        self.options.to_node()
    }

    /// Replace the engine options from a tree.
    pub fn set_engine_options(&mut self, node: &ConfigNode) -> Result<(), SimulatorError> {
        self.options = EngineOptions::from_node(node)?;
        Ok(())
    }

    // ── External forces ────────────────────────────────────────────

    /// Apply a constant world-frame force at a frame over `[t, t + dt)`.
    pub fn register_force_impulse(
        &mut self,
        frame_name: &str,
        t: f64,
        dt: f64,
        force: Vector3<f64>,
    ) -> Result<(), SimulatorError> {
        let frame = self.resolve_frame(frame_name)?;
        self.forces.impulses.push(ForceImpulse { frame, t, dt, force });
        Ok(())
    }

    /// Apply a state-dependent world-frame force at a frame.
    pub fn register_force_profile<F>(
        &mut self,
        frame_name: &str,
        profile: F,
    ) -> Result<(), SimulatorError>
    where
        F: Fn(f64, &DVector<f64>, &DVector<f64>) -> Vector3<f64> + 'static,
    {
        let frame = self.resolve_frame(frame_name)?;
        self.forces.profiles.push(ForceProfileEntry {
            frame,
            profile: Box::new(profile),
        });
        Ok(())
    }

    /// Drop every registered impulse and profile.
    pub fn clear_forces(&mut self) {
        self.forces.clear();
    }

    fn resolve_frame(&self, frame_name: &str) -> Result<usize, SimulatorError> {
        let inner = self.model.inner()?;
        inner
            .rigid
            .frame_index(frame_name)
            .ok_or_else(|| {
                SimulatorError::Model(ModelError::UnknownFrame {
                    name: frame_name.to_string(),
                })
            })
    }

    // ── Running ────────────────────────────────────────────────────

    /// Simulate `[0, tf]` from the flat initial state `x0 = [q; v]`.
    pub fn run(&mut self, x0: &DVector<f64>, tf: f64) -> Result<(), SimulatorError> {
        self.run_impl(x0, tf, None)
    }

    /// Like [`run`](Self::run), invoking `callback(t, x)` after every
    /// recorded row; returning `false` ends the run early with the log
    /// truncated at that point.
    pub fn run_with_callback<F>(
        &mut self,
        x0: &DVector<f64>,
        tf: f64,
        mut callback: F,
    ) -> Result<(), SimulatorError>
    where
        F: FnMut(f64, &DVector<f64>) -> bool,
    {
        self.run_impl(x0, tf, Some(&mut callback))
    }

    fn run_impl(
        &mut self,
        x0: &DVector<f64>,
        tf: f64,
        mut callback: Option<&mut dyn FnMut(f64, &DVector<f64>) -> bool>,
    ) -> Result<(), SimulatorError> {
        if !tf.is_finite() || tf <= 0.0 {
            return Err(SimulatorError::InvalidDuration { tf });
        }
        let nq = self.model.nq();
        let nv = self.model.nv();
        State::from_flat(x0, nq, nv)?;

        self.model
            .inner_mut()?
            .rigid
            .set_gravity(self.options.world.gravity);

        let options = &self.options;
        let model = &mut self.model;
        let inner = model.inner.as_ref().ok_or(ModelError::NotInitialized)?;
        let sensors = &mut model.sensors;
        let model_options = &model.options;
        let controller = &mut self.controller;
        let forces = &self.forces;

        let seed = options.stepper.random_seed as u64;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        // Telemetry layout. Registration order here and value order in
        // fill_row must stay in lockstep.
        let mut recorder = TelemetryRecorder::new();
        recorder.register_constant("Global.urdf_file", &inner.urdf_path)?;
        recorder.register_constant("Global.random_seed", &seed.to_string())?;
        recorder.register_constant("Global.solver", options.stepper.solver.name())?;

        let telemetry = &options.telemetry;
        if telemetry.enable_configuration {
            for name in &inner.position_fieldnames {
                recorder.register_column(&format!("{CONTROLLER_PREFIX}.{name}"))?;
            }
        }
        if telemetry.enable_velocity {
            for name in &inner.velocity_fieldnames {
                recorder.register_column(&format!("{CONTROLLER_PREFIX}.{name}"))?;
            }
        }
        if telemetry.enable_acceleration {
            for name in &inner.acceleration_fieldnames {
                recorder.register_column(&format!("{CONTROLLER_PREFIX}.{name}"))?;
            }
        }
        if telemetry.enable_command {
            for name in &inner.motor_torque_fieldnames {
                recorder.register_column(&format!("{CONTROLLER_PREFIX}.{name}"))?;
            }
        }
        if telemetry.enable_energy {
            recorder.register_column(&format!("{CONTROLLER_PREFIX}.energy"))?;
        }
        let log_entries = controller.options().telemetry_enable;
        if log_entries {
            for (name, _) in controller.entries() {
                recorder.register_column(&format!("{CONTROLLER_PREFIX}.{name}"))?;
            }
        }
        for sensor in sensors.iter() {
            if !sensor_type_enabled(&model_options.telemetry, sensor.sensor_type()) {
                continue;
            }
            for field in sensor.fieldnames() {
                recorder.register_column(&format!(
                    "{}.{}.{}",
                    sensor.sensor_type(),
                    sensor.name(),
                    field
                ))?;
            }
        }

        let mut dynamics = Dynamics {
            rigid: &inner.rigid,
            motor_indices: &inner.motor_joints,
            contact_frames: &inner.contact_frames,
            contact_options: &options.contacts,
            motor_options: &model_options.motors,
            position_limit: model_options.joints.enable_position_limit,
            limits: inner.rigid.position_limits(),
            controller,
            forces,
            data: RigidData::new(&inner.rigid),
            u_hold: DVector::zeros(inner.motor_joints.len()),
            q: DVector::zeros(nq),
            v: DVector::zeros(nv),
            tau: DVector::zeros(nv),
            fext: vec![SpatialVec::zeros(); inner.rigid.bodies().len()],
            contacts: Vec::new(),
            external: Vec::new(),
            nq,
            nv,
        };

        let mut stepper = Stepper::new(&options.stepper, nq + nv);
        let s_period = options.stepper.sensors_update_period;
        let c_period = options.stepper.controller_update_period;

        let mut x = x0.clone();
        let mut dx = DVector::zeros(nq + nv);
        let mut row: Vec<f64> = Vec::new();
        let mut t = 0.0;

        // Initial command, sensor sample, and row at t = 0.
        dynamics.update_command(t, &x);
        dynamics.eval(t, &x, &mut dx)?;
        {
            let ctx = SensorContext {
                q: &dynamics.q,
                v: &dynamics.v,
                model: dynamics.rigid,
                data: &dynamics.data,
                contact_forces: &dynamics.contacts,
            };
            sensors.refresh_all(&ctx, &mut rng);
        }
        fill_row(
            &mut row,
            &x,
            &dynamics,
            sensors,
            telemetry,
            &model_options.telemetry,
            log_entries,
            nq,
            nv,
        );
        recorder.record_row(t, &row)?;

        let mut stopped = match callback.as_mut() {
            Some(cb) => !cb(t, &x),
            None => false,
        };

        let mut k_sensor: u64 = 1;
        let mut k_control: u64 = 1;
        while !stopped && t < tf {
            let next_sensor = if s_period > 0.0 {
                snap_to(k_sensor as f64 * s_period, tf)
            } else {
                f64::INFINITY
            };
            let next_control = if c_period > 0.0 {
                snap_to(k_control as f64 * c_period, tf)
            } else {
                f64::INFINITY
            };
            let t_next = next_sensor.min(next_control).min(tf);

            stepper.advance(&mut dynamics, t, t_next, &mut x)?;
            t = t_next;

            if t >= next_control {
                dynamics.update_command(t, &x);
                k_control += 1;
            }
            let record = t >= next_sensor || t >= tf;
            if t >= next_sensor {
                k_sensor += 1;
            }
            if record {
                dynamics.eval(t, &x, &mut dx)?;
                {
                    let ctx = SensorContext {
                        q: &dynamics.q,
                        v: &dynamics.v,
                        model: dynamics.rigid,
                        data: &dynamics.data,
                        contact_forces: &dynamics.contacts,
                    };
                    sensors.refresh_all(&ctx, &mut rng);
                }
                fill_row(
                    &mut row,
                    &x,
                    &dynamics,
                    sensors,
                    telemetry,
                    &model_options.telemetry,
                    log_entries,
                    nq,
                    nv,
                );
                recorder.record_row(t, &row)?;
                if let Some(cb) = callback.as_mut() {
                    stopped = !cb(t, &x);
                }
            }
        }

        let log = recorder.into_log();
        log::debug!(
            "run finished at t = {t:.6}: {} rows, {} columns",
            log.nrows(),
            log.headers().len()
        );
        self.log = Some(log);
        Ok(())
    }

    // ── Log access ─────────────────────────────────────────────────

    /// The latest run's log, if any run has completed.
    pub fn log(&self) -> Option<&Log> {
        self.log.as_ref()
    }

    /// The latest run's log as `(info, data)` copies: the metadata
    /// lines (constants and column names between the sentinels) and
    /// the sample matrix.
    pub fn get_log(&self) -> Result<(Vec<String>, DMatrix<f64>), SimulatorError> {
        let log = self.log.as_ref().ok_or(SimulatorError::NoLogAvailable)?;
        Ok((log.info.clone(), log.data.clone()))
    }

    /// Export the latest run's log: commented CSV, or the compact
    /// binary format when `binary` is set.
    pub fn write_log(&self, path: impl AsRef<Path>, binary: bool) -> Result<(), SimulatorError> {
        let log = self.log.as_ref().ok_or(SimulatorError::NoLogAvailable)?;
        if binary {
            write_binary_file(path, log)?;
        } else {
            write_text_file(path, log)?;
        }
        Ok(())
    }

    /// Rebuild the state evolution of the latest run from its log.
    pub fn extract_trajectory(&self) -> Result<Trajectory, SimulatorError> {
        let log = self.log.as_ref().ok_or(SimulatorError::NoLogAvailable)?;
        let inner = self.model.inner()?;
        let position_fields: Vec<String> = inner
            .position_fieldnames
            .iter()
            .map(|n| format!("{CONTROLLER_PREFIX}.{n}"))
            .collect();
        let velocity_fields: Vec<String> = inner
            .velocity_fieldnames
            .iter()
            .map(|n| format!("{CONTROLLER_PREFIX}.{n}"))
            .collect();
        Ok(armature_telemetry::extract_trajectory(
            log,
            &position_fields,
            &velocity_fields,
            inner.urdf_path.clone(),
        )?)
    }
}

// ── Tests ──────────────────────────────────────────────────────────
