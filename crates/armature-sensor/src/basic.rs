//! The stock sensors: IMU, incremental encoder and contact force.

use armature_core::ConfigNode;
use armature_rigid::kinematics;
use rand_chacha::ChaCha8Rng;

use crate::sensor::{Sensor, SensorContext, SensorCore};
use crate::error::SensorError;

// ── IMU ──────────────────────────────────────────────────────────────

/// Inertial measurement unit attached to a frame.
///
/// Measures the frame's world orientation as quaternion coefficients
/// `(x, y, z, w)` followed by the angular velocity in the frame's own
/// axes, i.e. what a strapped-down gyroscope reads.
#[derive(Debug)]
pub struct ImuSensor {
    core: SensorCore,
    frame: usize,
}

impl ImuSensor {
    /// Type label shared by all IMU sensors.
    pub const TYPE: &'static str = "ImuSensor";

    /// Measurement field suffixes.
    pub const FIELDNAMES: [&'static str; 7] = [
        "Quatx", "Quaty", "Quatz", "Quatw", "Gyrox", "Gyroy", "Gyroz",
    ];

    /// New IMU reading from the model frame at `frame`.
    pub fn new(name: impl Into<String>, frame: usize) -> Self {
        Self {
            core: SensorCore::new(name, Self::FIELDNAMES.len()),
            frame,
        }
    }

    /// Index of the frame this IMU is mounted on.
    pub fn frame(&self) -> usize {
        self.frame
    }
}

impl Sensor for ImuSensor {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn sensor_type(&self) -> &'static str {
        Self::TYPE
    }

    fn fieldnames(&self) -> &'static [&'static str] {
        &Self::FIELDNAMES
    }

    fn options(&self) -> ConfigNode {
        self.core.options_node()
    }

    fn set_options(&mut self, options: &ConfigNode) -> Result<(), SensorError> {
        self.core.set_options_node(Self::TYPE, options)
    }

    fn refresh(&mut self, ctx: &SensorContext<'_>, rng: &mut ChaCha8Rng) {
        let quat = kinematics::frame_orientation(ctx.data, self.frame);
        let (gyro, _) = kinematics::frame_velocity(ctx.model, ctx.data, self.frame);
        let out = self.core.value_mut();
        out[0] = quat.coords.x;
        out[1] = quat.coords.y;
        out[2] = quat.coords.z;
        out[3] = quat.coords.w;
        out[4] = gyro.x;
        out[5] = gyro.y;
        out[6] = gyro.z;
        self.core.skew(rng);
    }

    fn value(&self) -> &[f64] {
        self.core.value()
    }
}

// ── Encoder ──────────────────────────────────────────────────────────

/// Incremental encoder reading one joint's position and velocity.
#[derive(Debug)]
pub struct EncoderSensor {
    core: SensorCore,
    joint: usize,
}

impl EncoderSensor {
    /// Type label shared by all encoder sensors.
    pub const TYPE: &'static str = "EncoderSensor";

    /// Measurement field suffixes.
    pub const FIELDNAMES: [&'static str; 2] = ["Q", "V"];

    /// New encoder on the joint at index `joint`.
    pub fn new(name: impl Into<String>, joint: usize) -> Self {
        Self {
            core: SensorCore::new(name, Self::FIELDNAMES.len()),
            joint,
        }
    }

    /// Index of the joint this encoder reads.
    pub fn joint(&self) -> usize {
        self.joint
    }
}

impl Sensor for EncoderSensor {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn sensor_type(&self) -> &'static str {
        Self::TYPE
    }

    fn fieldnames(&self) -> &'static [&'static str] {
        &Self::FIELDNAMES
    }

    fn options(&self) -> ConfigNode {
        self.core.options_node()
    }

    fn set_options(&mut self, options: &ConfigNode) -> Result<(), SensorError> {
        self.core.set_options_node(Self::TYPE, options)
    }

    fn refresh(&mut self, ctx: &SensorContext<'_>, rng: &mut ChaCha8Rng) {
        let out = self.core.value_mut();
        out[0] = ctx.q[self.joint];
        out[1] = ctx.v[self.joint];
        self.core.skew(rng);
    }

    fn value(&self) -> &[f64] {
        self.core.value()
    }
}

// ── Force ────────────────────────────────────────────────────────────

/// Three-axis force sensor at a contact frame.
///
/// Reports the contact force currently applied at its frame, rotated
/// into the frame's axes. Reads zero while the frame carries no
/// contact force.
#[derive(Debug)]
pub struct ForceSensor {
    core: SensorCore,
    frame: usize,
}

impl ForceSensor {
    /// Type label shared by all force sensors.
    pub const TYPE: &'static str = "ForceSensor";

    /// Measurement field suffixes.
    pub const FIELDNAMES: [&'static str; 3] = ["Fx", "Fy", "Fz"];

    /// New force sensor at the model frame at `frame`.
    pub fn new(name: impl Into<String>, frame: usize) -> Self {
        Self {
            core: SensorCore::new(name, Self::FIELDNAMES.len()),
            frame,
        }
    }

    /// Index of the frame this sensor measures at.
    pub fn frame(&self) -> usize {
        self.frame
    }
}

impl Sensor for ForceSensor {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn sensor_type(&self) -> &'static str {
        Self::TYPE
    }

    fn fieldnames(&self) -> &'static [&'static str] {
        &Self::FIELDNAMES
    }

    fn options(&self) -> ConfigNode {
        self.core.options_node()
    }

    fn set_options(&mut self, options: &ConfigNode) -> Result<(), SensorError> {
        self.core.set_options_node(Self::TYPE, options)
    }

    fn refresh(&mut self, ctx: &SensorContext<'_>, rng: &mut ChaCha8Rng) {
        let world = ctx
            .contact_forces
            .iter()
            .find(|(frame, _)| *frame == self.frame)
            .map(|(_, force)| *force)
            .unwrap_or_default();
        let local = kinematics::frame_orientation(ctx.data, self.frame).inverse() * world;
        let out = self.core.value_mut();
        out[0] = local.x;
        out[1] = local.y;
        out[2] = local.z;
        self.core.skew(rng);
    }

    fn value(&self) -> &[f64] {
        self.core.value()
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use armature_rigid::{kinematics::forward_kinematics, RigidData, RigidModel};
    use armature_urdf::load_urdf_str;
    use nalgebra::{DVector, Vector3};
    use rand::SeedableRng;

    const PENDULUM: &str = r#"<?xml version="1.0"?>
<robot name="pendulum">
  <link name="base"/>
  <link name="arm">
    <inertial>
      <origin xyz="0 0 -1"/>
      <mass value="1.0"/>
      <inertia ixx="0.0" iyy="0.0" izz="0.0"/>
    </inertial>
  </link>
  <link name="bob"/>
  <joint name="pivot" type="continuous">
    <parent link="base"/>
    <child link="arm"/>
    <origin xyz="0 0 2"/>
    <axis xyz="0 1 0"/>
  </joint>
  <joint name="bob_weld" type="fixed">
    <parent link="arm"/>
    <child link="bob"/>
    <origin xyz="0 0 -1"/>
  </joint>
</robot>
"#;

    struct Rig {
        model: RigidModel,
        data: RigidData,
        q: DVector<f64>,
        v: DVector<f64>,
    }

    fn rig(q0: f64, v0: f64) -> Rig {
        let model = RigidModel::from_description(&load_urdf_str(PENDULUM).unwrap()).unwrap();
        let mut data = RigidData::new(&model);
        let q = DVector::from_vec(vec![q0]);
        let v = DVector::from_vec(vec![v0]);
        forward_kinematics(&model, &mut data, &q, &v).unwrap();
        Rig { model, data, q, v }
    }

    fn ctx<'a>(rig: &'a Rig, forces: &'a [(usize, Vector3<f64>)]) -> SensorContext<'a> {
        SensorContext {
            q: &rig.q,
            v: &rig.v,
            model: &rig.model,
            data: &rig.data,
            contact_forces: forces,
        }
    }

    #[test]
    fn imu_at_rest_reads_identity_quaternion() {
        let rig = rig(0.0, 0.0);
        let frame = rig.model.frame_index("bob").unwrap();
        let mut imu = ImuSensor::new("tip", frame);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        imu.refresh(&ctx(&rig, &[]), &mut rng);
        assert_eq!(imu.value(), &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn imu_gyro_reads_joint_rate_about_the_axis() {
        let rig = rig(0.0, 0.7);
        let frame = rig.model.frame_index("bob").unwrap();
        let mut imu = ImuSensor::new("tip", frame);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        imu.refresh(&ctx(&rig, &[]), &mut rng);
        // Pivot axis is +y and the bob frame is aligned with the body.
        assert_relative_eq!(imu.value()[4], 0.0, epsilon = 1.0e-12);
        assert_relative_eq!(imu.value()[5], 0.7, epsilon = 1.0e-12);
        assert_relative_eq!(imu.value()[6], 0.0, epsilon = 1.0e-12);
    }

    #[test]
    fn imu_quaternion_tracks_joint_angle() {
        let angle = 0.3;
        let rig = rig(angle, 0.0);
        let frame = rig.model.frame_index("bob").unwrap();
        let mut imu = ImuSensor::new("tip", frame);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        imu.refresh(&ctx(&rig, &[]), &mut rng);
        // Rotation of `angle` about +y.
        assert_relative_eq!(imu.value()[1], (angle / 2.0).sin(), epsilon = 1.0e-12);
        assert_relative_eq!(imu.value()[3], (angle / 2.0).cos(), epsilon = 1.0e-12);
    }

    #[test]
    fn encoder_reads_joint_position_and_velocity() {
        let rig = rig(0.25, -1.5);
        let joint = rig.model.joint_index("pivot").unwrap();
        let mut encoder = EncoderSensor::new("pivot", joint);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        encoder.refresh(&ctx(&rig, &[]), &mut rng);
        assert_eq!(encoder.value(), &[0.25, -1.5]);
    }

    #[test]
    fn force_sensor_reads_zero_without_contact() {
        let rig = rig(0.1, 0.0);
        let frame = rig.model.frame_index("bob").unwrap();
        let mut sensor = ForceSensor::new("tip", frame);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        sensor.refresh(&ctx(&rig, &[]), &mut rng);
        assert_eq!(sensor.value(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn force_sensor_rotates_world_force_into_its_frame() {
        use std::f64::consts::FRAC_PI_2;
        let rig = rig(FRAC_PI_2, 0.0);
        let frame = rig.model.frame_index("bob").unwrap();
        let forces = [(frame, Vector3::new(0.0, 0.0, 3.0))];
        let mut sensor = ForceSensor::new("tip", frame);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        sensor.refresh(&ctx(&rig, &forces), &mut rng);
        // After a quarter turn about +y the frame's x axis points down,
        // so a world +z force reads as -x.
        assert_relative_eq!(sensor.value()[0], -3.0, epsilon = 1.0e-12);
        assert_relative_eq!(sensor.value()[1], 0.0, epsilon = 1.0e-12);
        assert_relative_eq!(sensor.value()[2], 0.0, epsilon = 1.0e-12);
    }

    #[test]
    fn noise_options_distort_the_measurement() {
        let rig = rig(0.25, 0.0);
        let joint = rig.model.joint_index("pivot").unwrap();
        let mut encoder = EncoderSensor::new("pivot", joint);
        let mut options = ConfigNode::new();
        options.set("noiseStd", Vec::<f64>::new());
        options.set("bias", vec![0.1, 0.0]);
        encoder.set_options(&options).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        encoder.refresh(&ctx(&rig, &[]), &mut rng);
        assert_relative_eq!(encoder.value()[0], 0.35, epsilon = 1.0e-12);
    }
}
