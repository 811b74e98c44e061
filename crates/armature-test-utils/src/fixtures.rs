//! Canonical URDF fixtures.

/// A planar double pendulum hanging from a fixed base.
///
/// Two unit-mass 1 m links swinging about the world y axis, the pivot
/// 2 m above the ground, and a massless tip frame welded to the end of
/// the second link. Joint order is first then second, so `q = [q1, q2]`
/// and the straight-down configuration is `q = 0`.
pub const DOUBLE_PENDULUM_URDF: &str = r#"<?xml version="1.0"?>
<robot name="double_pendulum">
  <link name="base"/>
  <link name="FirstPendulumLink">
    <inertial>
      <origin xyz="0 0 -0.5"/>
      <mass value="1.0"/>
      <inertia ixx="0.084" iyy="0.084" izz="0.002"/>
    </inertial>
  </link>
  <link name="SecondPendulumLink">
    <inertial>
      <origin xyz="0 0 -0.5"/>
      <mass value="1.0"/>
      <inertia ixx="0.084" iyy="0.084" izz="0.002"/>
    </inertial>
  </link>
  <link name="SecondPendulumTip"/>
  <joint name="FirstPendulumJoint" type="continuous">
    <parent link="base"/>
    <child link="FirstPendulumLink"/>
    <origin xyz="0 0 2"/>
    <axis xyz="0 1 0"/>
  </joint>
  <joint name="SecondPendulumJoint" type="continuous">
    <parent link="FirstPendulumLink"/>
    <child link="SecondPendulumLink"/>
    <origin xyz="0 0 -1"/>
    <axis xyz="0 1 0"/>
  </joint>
  <joint name="SecondPendulumTipJoint" type="fixed">
    <parent link="SecondPendulumLink"/>
    <child link="SecondPendulumTip"/>
    <origin xyz="0 0 -1"/>
  </joint>
</robot>
"#;

/// A single point-mass pendulum with the pivot `pivot_height` metres
/// above the ground and a tip frame at the end of the 1 m arm.
pub fn single_pendulum_urdf(pivot_height: f64) -> String {
    format!(
        r#"<?xml version="1.0"?>
<robot name="single_pendulum">
  <link name="base"/>
  <link name="PendulumLink">
    <inertial>
      <origin xyz="0 0 -1"/>
      <mass value="1.0"/>
      <inertia ixx="0.0" iyy="0.0" izz="0.0"/>
    </inertial>
  </link>
  <link name="PendulumTip"/>
  <joint name="PendulumJoint" type="continuous">
    <parent link="base"/>
    <child link="PendulumLink"/>
    <origin xyz="0 0 {pivot_height}"/>
    <axis xyz="0 1 0"/>
  </joint>
  <joint name="PendulumTipJoint" type="fixed">
    <parent link="PendulumLink"/>
    <child link="PendulumTip"/>
    <origin xyz="0 0 -1"/>
  </joint>
</robot>
"#
    )
}
