//! Device-level wrapper around the rigid-body model.
//!
//! A [`Model`] bundles the kinematic tree with everything the engine
//! needs to treat it as a device: resolved contact frames and motor
//! joints, the attached sensors, telemetry fieldname lists, and the
//! model option tree.

use armature_core::ConfigNode;
use armature_rigid::RigidModel;
use armature_sensor::{EncoderSensor, ForceSensor, ImuSensor, Sensor, SensorSet};
use armature_urdf::{load_urdf, load_urdf_str};

use crate::error::ModelError;
use crate::options::ModelOptions;

/// Everything that only exists once the URDF has been loaded.
#[derive(Debug)]
pub(crate) struct ModelInner {
    pub rigid: RigidModel,
    pub urdf_path: String,
    pub contact_frames: Vec<usize>,
    pub motor_joints: Vec<usize>,
    pub motor_names: Vec<String>,
    pub position_fieldnames: Vec<String>,
    pub velocity_fieldnames: Vec<String>,
    pub acceleration_fieldnames: Vec<String>,
    pub motor_torque_fieldnames: Vec<String>,
}

/// A robot device: rigid model, sensors, and model options.
#[derive(Debug, Default)]
pub struct Model {
    pub(crate) inner: Option<ModelInner>,
    pub(crate) sensors: SensorSet,
    pub(crate) options: ModelOptions,
}

impl Model {
    /// Fresh, uninitialized model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a URDF file and resolve contact frames and motor joints.
    ///
    /// `has_freeflyer` must be `false`; floating bases are refused.
    pub fn initialize(
        &mut self,
        urdf_path: &str,
        contact_frame_names: &[&str],
        motor_joint_names: &[&str],
        has_freeflyer: bool,
    ) -> Result<(), ModelError> {
        let description = load_urdf(urdf_path)?;
        self.initialize_description(
            &description,
            urdf_path,
            contact_frame_names,
            motor_joint_names,
            has_freeflyer,
        )
    }

    /// Like [`initialize`](Self::initialize) but from an in-memory URDF
    /// string; `path_label` is recorded as the log's `Global.urdf_file`.
    pub fn initialize_from_str(
        &mut self,
        urdf: &str,
        path_label: &str,
        contact_frame_names: &[&str],
        motor_joint_names: &[&str],
        has_freeflyer: bool,
    ) -> Result<(), ModelError> {
        let description = load_urdf_str(urdf)?;
        self.initialize_description(
            &description,
            path_label,
            contact_frame_names,
            motor_joint_names,
            has_freeflyer,
        )
    }

    fn initialize_description(
        &mut self,
        description: &armature_urdf::RobotDescription,
        urdf_path: &str,
        contact_frame_names: &[&str],
        motor_joint_names: &[&str],
        has_freeflyer: bool,
    ) -> Result<(), ModelError> {
        if self.inner.is_some() {
            return Err(ModelError::AlreadyInitialized);
        }
        if has_freeflyer {
            return Err(ModelError::FreeFlyerUnsupported);
        }

        let rigid = RigidModel::from_description(description)?;

        let mut contact_frames = Vec::with_capacity(contact_frame_names.len());
        for name in contact_frame_names {
            let index = rigid
                .frame_index(name)
                .ok_or_else(|| ModelError::UnknownFrame {
                    name: (*name).to_string(),
                })?;
            contact_frames.push(index);
        }

        let mut motor_joints = Vec::with_capacity(motor_joint_names.len());
        for name in motor_joint_names {
            let index = rigid
                .joint_index(name)
                .ok_or_else(|| ModelError::UnknownJoint {
                    name: (*name).to_string(),
                })?;
            motor_joints.push(index);
        }
        let motor_names: Vec<String> =
            motor_joint_names.iter().map(|n| (*n).to_string()).collect();

        let joint_names = rigid.joint_names();
        let position_fieldnames = joint_names
            .iter()
            .map(|n| format!("currentPosition{n}"))
            .collect();
        let velocity_fieldnames = joint_names
            .iter()
            .map(|n| format!("currentVelocity{n}"))
            .collect();
        let acceleration_fieldnames = joint_names
            .iter()
            .map(|n| format!("currentAcceleration{n}"))
            .collect();
        let motor_torque_fieldnames = motor_names
            .iter()
            .map(|n| format!("currentTorque{n}"))
            .collect();

        self.inner = Some(ModelInner {
            rigid,
            urdf_path: urdf_path.to_string(),
            contact_frames,
            motor_joints,
            motor_names,
            position_fieldnames,
            velocity_fieldnames,
            acceleration_fieldnames,
            motor_torque_fieldnames,
        });
        log::info!(
            "model initialized from '{urdf_path}': nq = {}, {} motor(s), {} contact frame(s)",
            self.nq(),
            motor_joint_names.len(),
            contact_frame_names.len()
        );
        Ok(())
    }

    pub(crate) fn inner(&self) -> Result<&ModelInner, ModelError> {
        self.inner.as_ref().ok_or(ModelError::NotInitialized)
    }

    pub(crate) fn inner_mut(&mut self) -> Result<&mut ModelInner, ModelError> {
        self.inner.as_mut().ok_or(ModelError::NotInitialized)
    }

    /// Whether [`initialize`](Self::initialize) has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.inner.is_some()
    }

    /// Path (or label) of the loaded URDF.
    pub fn urdf_path(&self) -> Option<&str> {
        self.inner.as_ref().map(|i| i.urdf_path.as_str())
    }

    /// Whether the model has a floating base. Always `false` once
    /// initialized; floating bases are refused at initialization.
    pub fn has_freeflyer(&self) -> bool {
        false
    }

    /// Configuration dimension. Zero before initialization.
    pub fn nq(&self) -> usize {
        self.inner.as_ref().map_or(0, |i| i.rigid.nq())
    }

    /// Velocity dimension. Zero before initialization.
    pub fn nv(&self) -> usize {
        self.inner.as_ref().map_or(0, |i| i.rigid.nv())
    }

    /// Flat state dimension `nq + nv`.
    pub fn nx(&self) -> usize {
        self.inner.as_ref().map_or(0, |i| i.rigid.nx())
    }

    /// Number of motors.
    pub fn nu(&self) -> usize {
        self.inner.as_ref().map_or(0, |i| i.motor_joints.len())
    }

    /// The underlying rigid-body model, once initialized.
    pub fn rigid_model(&self) -> Option<&RigidModel> {
        self.inner.as_ref().map(|i| &i.rigid)
    }

    /// Names of the actuated joints, in motor order.
    pub fn motor_names(&self) -> Vec<&str> {
        self.inner
            .as_ref()
            .map_or_else(Vec::new, |i| i.motor_names.iter().map(String::as_str).collect())
    }

    /// Names of all 1-dof joints, in tree order.
    pub fn joint_names(&self) -> Vec<&str> {
        self.inner.as_ref().map_or_else(Vec::new, |i| i.rigid.joint_names())
    }

    /// Names of all frames, in tree order.
    pub fn frame_names(&self) -> Vec<&str> {
        self.inner.as_ref().map_or_else(Vec::new, |i| {
            i.rigid.frames().iter().map(|f| f.name.as_str()).collect()
        })
    }

    /// Resolved indices of the contact frames.
    pub fn contact_frame_indices(&self) -> &[usize] {
        self.inner.as_ref().map_or(&[], |i| &i.contact_frames)
    }

    /// Velocity-vector indices driven by the motors, in motor order.
    ///
    /// Every joint is 1-dof, so these coincide with the joint indices.
    pub fn motor_velocity_indices(&self) -> &[usize] {
        self.inner.as_ref().map_or(&[], |i| &i.motor_joints)
    }

    /// Telemetry fieldnames of the configuration, one per joint.
    pub fn position_fieldnames(&self) -> &[String] {
        self.inner.as_ref().map_or(&[], |i| &i.position_fieldnames)
    }

    /// Telemetry fieldnames of the velocity, one per joint.
    pub fn velocity_fieldnames(&self) -> &[String] {
        self.inner.as_ref().map_or(&[], |i| &i.velocity_fieldnames)
    }

    /// Telemetry fieldnames of the acceleration, one per joint.
    pub fn acceleration_fieldnames(&self) -> &[String] {
        self.inner.as_ref().map_or(&[], |i| &i.acceleration_fieldnames)
    }

    /// Telemetry fieldnames of the motor torques, one per motor.
    pub fn motor_torque_fieldnames(&self) -> &[String] {
        self.inner.as_ref().map_or(&[], |i| &i.motor_torque_fieldnames)
    }

    // ── Sensors ────────────────────────────────────────────────────

    /// Attach an IMU to the frame called `frame_name`.
    pub fn add_imu_sensor(&mut self, name: &str, frame_name: &str) -> Result<(), ModelError> {
        let frame = self.resolve_frame(frame_name)?;
        self.sensors.add(Box::new(ImuSensor::new(name, frame)))?;
        Ok(())
    }

    /// Attach an encoder to the joint called `joint_name`.
    pub fn add_encoder_sensor(
        &mut self,
        name: &str,
        joint_name: &str,
    ) -> Result<(), ModelError> {
        let inner = self.inner()?;
        let joint =
            inner
                .rigid
                .joint_index(joint_name)
                .ok_or_else(|| ModelError::UnknownJoint {
                    name: joint_name.to_string(),
                })?;
        self.sensors.add(Box::new(EncoderSensor::new(name, joint)))?;
        Ok(())
    }

    /// Attach a force sensor to the frame called `frame_name`.
    pub fn add_force_sensor(&mut self, name: &str, frame_name: &str) -> Result<(), ModelError> {
        let frame = self.resolve_frame(frame_name)?;
        self.sensors.add(Box::new(ForceSensor::new(name, frame)))?;
        Ok(())
    }

    fn resolve_frame(&self, frame_name: &str) -> Result<usize, ModelError> {
        let inner = self.inner()?;
        inner
            .rigid
            .frame_index(frame_name)
            .ok_or_else(|| ModelError::UnknownFrame {
                name: frame_name.to_string(),
            })
    }

    /// Detach the sensor addressed by `(type, name)`.
    pub fn remove_sensor(&mut self, sensor_type: &str, name: &str) -> Result<(), ModelError> {
        self.sensors.remove(sensor_type, name)?;
        Ok(())
    }

    /// Detach every sensor of the given type.
    pub fn remove_sensors(&mut self, sensor_type: &str) -> Result<(), ModelError> {
        self.sensors.remove_type(sensor_type)?;
        Ok(())
    }

    /// Look up a sensor by `(type, name)`.
    pub fn sensor(&self, sensor_type: &str, name: &str) -> Option<&dyn Sensor> {
        self.sensors.get(sensor_type, name)
    }

    // ── Options ────────────────────────────────────────────────────

    /// Current model options as a tree.
    pub fn model_options(&self) -> ConfigNode {
        self.options.to_node()
    }

    /// Replace the model options from a tree.
    pub fn set_model_options(&mut self, node: &ConfigNode) -> Result<(), ModelError> {
        self.options = ModelOptions::from_node(node, self.nu())?;
        Ok(())
    }

    pub(crate) fn options(&self) -> &ModelOptions {
        &self.options
    }

    /// Options of every attached sensor, grouped type → name → options.
    pub fn sensors_options(&self) -> ConfigNode {
        self.sensors.options()
    }

    /// Replace the sensor options from a tree produced by
    /// [`sensors_options`](Self::sensors_options).
    pub fn set_sensors_options(&mut self, node: &ConfigNode) -> Result<(), ModelError> {
        self.sensors.set_options(node)?;
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────
