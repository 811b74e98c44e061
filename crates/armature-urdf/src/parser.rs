//! Event-driven URDF reader.
//!
//! Walks the document with a streaming XML reader, building links and
//! joints as their elements close. Elements outside the modelled subset
//! (`visual`, `collision`, `material`, `transmission`, `gazebo`, ...)
//! are skipped wholesale.

use std::fs;
use std::path::Path;

use nalgebra::{Isometry3, Matrix3, Translation3, Unit, UnitQuaternion, Vector3};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::description::{
    Inertial, JointLimit, JointType, RobotDescription, UrdfJoint, UrdfLink,
};
use crate::error::UrdfError;

/// Parse a URDF file into a validated [`RobotDescription`].
pub fn load_urdf(path: impl AsRef<Path>) -> Result<RobotDescription, UrdfError> {
    let path = path.as_ref();
    let xml = fs::read_to_string(path).map_err(|e| UrdfError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    load_urdf_str(&xml)
}

/// Parse an in-memory URDF document into a validated [`RobotDescription`].
pub fn load_urdf_str(xml: &str) -> Result<RobotDescription, UrdfError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut robot: Option<RobotDescription> = None;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"robot" => {
                robot = Some(read_robot(&mut reader, e)?);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(xml_error(&e)),
        }
        buf.clear();
    }

    let robot = robot.ok_or(UrdfError::MissingElement {
        element: "robot",
        context: "document".to_string(),
    })?;
    robot.validate()?;
    Ok(robot)
}

fn xml_error(e: &quick_xml::Error) -> UrdfError {
    UrdfError::Xml {
        message: e.to_string(),
    }
}

// ── Element readers ────────────────────────────────────────────────

fn read_robot<R: std::io::BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart<'_>,
) -> Result<RobotDescription, UrdfError> {
    let name = attr_string(start, "name")?;
    let mut links = Vec::new();
    let mut joints = Vec::new();

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let element = e.name().as_ref().to_vec();
                match element.as_slice() {
                    b"link" => links.push(read_link(reader, e)?),
                    b"joint" => joints.push(read_joint(reader, e)?),
                    _ => skip_subtree(reader, &element)?,
                }
            }
            // Self-closing <link name="..."/> declares a pure frame link.
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"link" => {
                links.push(UrdfLink {
                    name: attr_string(e, "name")?,
                    inertial: None,
                });
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"robot" => break,
            Ok(Event::Eof) => {
                return Err(UrdfError::Xml {
                    message: "unexpected end of document inside <robot>".to_string(),
                })
            }
            Ok(_) => {}
            Err(e) => return Err(xml_error(&e)),
        }
        buf.clear();
    }

    Ok(RobotDescription {
        name,
        links,
        joints,
    })
}

fn read_link<R: std::io::BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart<'_>,
) -> Result<UrdfLink, UrdfError> {
    let name = attr_string(start, "name")?;
    let mut inertial = None;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let element = e.name().as_ref().to_vec();
                match element.as_slice() {
                    b"inertial" => inertial = Some(read_inertial(reader)?),
                    _ => skip_subtree(reader, &element)?,
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"link" => break,
            Ok(Event::Eof) => {
                return Err(UrdfError::Xml {
                    message: format!("unexpected end of document inside link '{name}'"),
                })
            }
            Ok(_) => {}
            Err(e) => return Err(xml_error(&e)),
        }
        buf.clear();
    }

    Ok(UrdfLink { name, inertial })
}

fn read_inertial<R: std::io::BufRead>(reader: &mut Reader<R>) -> Result<Inertial, UrdfError> {
    let mut mass = None;
    let mut origin = Isometry3::identity();
    let mut inertia = Matrix3::zeros();

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"origin" => origin = read_origin(e)?,
                b"mass" => mass = Some(attr_float(e, "value")?),
                b"inertia" => inertia = read_inertia_matrix(e)?,
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"inertial" => break,
            Ok(Event::Eof) => {
                return Err(UrdfError::Xml {
                    message: "unexpected end of document inside <inertial>".to_string(),
                })
            }
            Ok(_) => {}
            Err(e) => return Err(xml_error(&e)),
        }
        buf.clear();
    }

    let mass = mass.ok_or(UrdfError::MissingElement {
        element: "mass",
        context: "<inertial>".to_string(),
    })?;
    // The document states the tensor in the inertial frame; rotate it
    // into link axes so downstream code never sees the inertial frame.
    let rotation = origin.rotation.to_rotation_matrix();
    let inertia = rotation.matrix() * inertia * rotation.matrix().transpose();
    Ok(Inertial {
        mass,
        com: origin.translation.vector,
        inertia,
    })
}

fn read_inertia_matrix(e: &BytesStart<'_>) -> Result<Matrix3<f64>, UrdfError> {
    let ixx = attr_float_or(e, "ixx", 0.0)?;
    let ixy = attr_float_or(e, "ixy", 0.0)?;
    let ixz = attr_float_or(e, "ixz", 0.0)?;
    let iyy = attr_float_or(e, "iyy", 0.0)?;
    let iyz = attr_float_or(e, "iyz", 0.0)?;
    let izz = attr_float_or(e, "izz", 0.0)?;
    Ok(Matrix3::new(
        ixx, ixy, ixz, //
        ixy, iyy, iyz, //
        ixz, iyz, izz,
    ))
}

fn read_joint<R: std::io::BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart<'_>,
) -> Result<UrdfJoint, UrdfError> {
    let name = attr_string(start, "name")?;
    let type_text = attr_string(start, "type")?;
    let joint_type = match type_text.as_str() {
        "revolute" => JointType::Revolute,
        "continuous" => JointType::Continuous,
        "prismatic" => JointType::Prismatic,
        "fixed" => JointType::Fixed,
        _ => {
            return Err(UrdfError::UnknownJointType {
                joint: name,
                value: type_text,
            })
        }
    };

    let mut parent = None;
    let mut child = None;
    let mut origin = Isometry3::identity();
    let mut axis = Vector3::x_axis();
    let mut limit = None;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"parent" => parent = Some(attr_string(e, "link")?),
                b"child" => child = Some(attr_string(e, "link")?),
                b"origin" => origin = read_origin(e)?,
                b"axis" => axis = read_axis(e)?,
                b"limit" => {
                    limit = Some(JointLimit {
                        lower: attr_float_or(e, "lower", 0.0)?,
                        upper: attr_float_or(e, "upper", 0.0)?,
                        effort: attr_float_or(e, "effort", 0.0)?,
                        velocity: attr_float_or(e, "velocity", 0.0)?,
                    })
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"joint" => break,
            Ok(Event::Eof) => {
                return Err(UrdfError::Xml {
                    message: format!("unexpected end of document inside joint '{name}'"),
                })
            }
            Ok(_) => {}
            Err(e) => return Err(xml_error(&e)),
        }
        buf.clear();
    }

    let parent = parent.ok_or_else(|| UrdfError::MissingElement {
        element: "parent",
        context: format!("joint '{name}'"),
    })?;
    let child = child.ok_or_else(|| UrdfError::MissingElement {
        element: "child",
        context: format!("joint '{name}'"),
    })?;

    Ok(UrdfJoint {
        name,
        joint_type,
        parent,
        child,
        origin,
        axis,
        limit,
    })
}

// ── Attribute helpers ──────────────────────────────────────────────

fn read_origin(e: &BytesStart<'_>) -> Result<Isometry3<f64>, UrdfError> {
    let xyz = attr_vec3_or(e, "xyz", Vector3::zeros())?;
    let rpy = attr_vec3_or(e, "rpy", Vector3::zeros())?;
    // URDF rpy is fixed-axis roll/pitch/yaw.
    let rotation = UnitQuaternion::from_euler_angles(rpy.x, rpy.y, rpy.z);
    Ok(Isometry3::from_parts(Translation3::from(xyz), rotation))
}

fn read_axis(e: &BytesStart<'_>) -> Result<Unit<Vector3<f64>>, UrdfError> {
    let xyz = attr_vec3_or(e, "xyz", Vector3::x())?;
    Unit::try_new(xyz, 1.0e-9).ok_or_else(|| UrdfError::InvalidNumber {
        attribute: "xyz",
        element: "axis".to_string(),
        text: format!("{} {} {}", xyz.x, xyz.y, xyz.z),
    })
}

fn attr_raw(e: &BytesStart<'_>, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name.as_bytes() {
            return String::from_utf8(attr.value.to_vec()).ok();
        }
    }
    None
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

fn attr_string(e: &BytesStart<'_>, name: &'static str) -> Result<String, UrdfError> {
    attr_raw(e, name).ok_or_else(|| UrdfError::MissingAttribute {
        attribute: name,
        element: element_name(e),
    })
}

fn attr_float(e: &BytesStart<'_>, name: &'static str) -> Result<f64, UrdfError> {
    let text = attr_string(e, name)?;
    text.parse().map_err(|_| UrdfError::InvalidNumber {
        attribute: name,
        element: element_name(e),
        text,
    })
}

fn attr_float_or(e: &BytesStart<'_>, name: &'static str, default: f64) -> Result<f64, UrdfError> {
    match attr_raw(e, name) {
        Some(text) => text.parse().map_err(|_| UrdfError::InvalidNumber {
            attribute: name,
            element: element_name(e),
            text,
        }),
        None => Ok(default),
    }
}

fn attr_vec3_or(
    e: &BytesStart<'_>,
    name: &'static str,
    default: Vector3<f64>,
) -> Result<Vector3<f64>, UrdfError> {
    let Some(text) = attr_raw(e, name) else {
        return Ok(default);
    };
    let parts: Vec<f64> = text
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|_| UrdfError::InvalidNumber {
            attribute: name,
            element: element_name(e),
            text: text.clone(),
        })?;
    if parts.len() != 3 {
        return Err(UrdfError::InvalidNumber {
            attribute: name,
            element: element_name(e),
            text,
        });
    }
    Ok(Vector3::new(parts[0], parts[1], parts[2]))
}

/// Consume events until the matching end tag of `name`, tracking
/// nesting of same-named descendants.
fn skip_subtree<R: std::io::BufRead>(reader: &mut Reader<R>, name: &[u8]) -> Result<(), UrdfError> {
    let mut buf = Vec::new();
    let mut depth = 1_usize;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == name => depth += 1,
            Ok(Event::End(ref e)) if e.name().as_ref() == name => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(xml_error(&e)),
        }
        buf.clear();
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1.0e-12, "{a} != {b}");
    }

    const PENDULUM: &str = r#"<?xml version="1.0"?>
<robot name="pendulum">
  <link name="world"/>
  <link name="arm">
    <inertial>
      <origin xyz="0 0 -0.5" rpy="0 0 0"/>
      <mass value="1.2"/>
      <inertia ixx="0.1" ixy="0" ixz="0" iyy="0.1" iyz="0" izz="0.01"/>
    </inertial>
    <visual>
      <geometry><cylinder length="1.0" radius="0.02"/></geometry>
    </visual>
  </link>
  <joint name="pivot" type="revolute">
    <parent link="world"/>
    <child link="arm"/>
    <origin xyz="0 0 1" rpy="0 0 0"/>
    <axis xyz="0 1 0"/>
    <limit lower="-3.14" upper="3.14" effort="20" velocity="10"/>
  </joint>
</robot>
"#;

    #[test]
    fn parses_links_and_joints() {
        let robot = load_urdf_str(PENDULUM).unwrap();
        assert_eq!(robot.name, "pendulum");
        assert_eq!(robot.links.len(), 2);
        assert_eq!(robot.joints.len(), 1);

        let arm = &robot.links[robot.link_index("arm").unwrap()];
        let inertial = arm.inertial.as_ref().unwrap();
        assert_close(inertial.mass, 1.2);
        assert_close(inertial.com.z, -0.5);
        assert_close(inertial.inertia[(0, 0)], 0.1);

        let pivot = &robot.joints[0];
        assert_eq!(pivot.joint_type, JointType::Revolute);
        assert_eq!(pivot.parent, "world");
        assert_eq!(pivot.child, "arm");
        assert_close(pivot.origin.translation.z, 1.0);
        assert_close(pivot.axis.y, 1.0);
        let limit = pivot.limit.unwrap();
        assert_close(limit.upper, 3.14);
        assert_close(limit.effort, 20.0);
    }

    #[test]
    fn visual_and_unknown_elements_are_skipped() {
        // The cylinder geometry above must not disturb parsing.
        let robot = load_urdf_str(PENDULUM).unwrap();
        assert!(robot.link_index("arm").is_some());
    }

    #[test]
    fn missing_robot_element_fails() {
        match load_urdf_str("<?xml version=\"1.0\"?><not_a_robot/>") {
            Err(UrdfError::MissingElement { element: "robot", .. }) => {}
            other => panic!("expected MissingElement(robot), got {other:?}"),
        }
    }

    #[test]
    fn unknown_joint_type_fails() {
        let xml = PENDULUM.replace("type=\"revolute\"", "type=\"planar\"");
        match load_urdf_str(&xml) {
            Err(UrdfError::UnknownJointType { joint, value }) => {
                assert_eq!(joint, "pivot");
                assert_eq!(value, "planar");
            }
            other => panic!("expected UnknownJointType, got {other:?}"),
        }
    }

    #[test]
    fn missing_mass_value_fails() {
        let xml = PENDULUM.replace("<mass value=\"1.2\"/>", "<mass/>");
        match load_urdf_str(&xml) {
            Err(UrdfError::MissingAttribute {
                attribute: "value", ..
            }) => {}
            other => panic!("expected MissingAttribute(value), got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_attribute_fails() {
        let xml = PENDULUM.replace("value=\"1.2\"", "value=\"heavy\"");
        match load_urdf_str(&xml) {
            Err(UrdfError::InvalidNumber {
                attribute: "value",
                text,
                ..
            }) => assert_eq!(text, "heavy"),
            other => panic!("expected InvalidNumber, got {other:?}"),
        }
    }

    #[test]
    fn zero_axis_fails() {
        let xml = PENDULUM.replace("<axis xyz=\"0 1 0\"/>", "<axis xyz=\"0 0 0\"/>");
        match load_urdf_str(&xml) {
            Err(UrdfError::InvalidNumber { .. }) => {}
            other => panic!("expected InvalidNumber for zero axis, got {other:?}"),
        }
    }

    #[test]
    fn default_axis_is_x() {
        let xml = PENDULUM.replace("<axis xyz=\"0 1 0\"/>", "");
        let robot = load_urdf_str(&xml).unwrap();
        assert_close(robot.joints[0].axis.x, 1.0);
    }

    #[test]
    fn rotated_inertial_origin_rotates_the_tensor() {
        // Quarter turn about x maps izz into the yy slot.
        let xml = PENDULUM.replace(
            "<origin xyz=\"0 0 -0.5\" rpy=\"0 0 0\"/>",
            "<origin xyz=\"0 0 -0.5\" rpy=\"1.5707963267948966 0 0\"/>",
        );
        let robot = load_urdf_str(&xml).unwrap();
        let inertial = robot.links[robot.link_index("arm").unwrap()]
            .inertial
            .as_ref()
            .unwrap();
        assert_close(inertial.inertia[(1, 1)], 0.01);
        assert_close(inertial.inertia[(2, 2)], 0.1);
    }

    #[test]
    fn validation_runs_on_load() {
        let xml = PENDULUM.replace("<child link=\"arm\"/>", "<child link=\"phantom\"/>");
        match load_urdf_str(&xml) {
            Err(UrdfError::DanglingLink { link, .. }) => assert_eq!(link, "phantom"),
            other => panic!("expected DanglingLink, got {other:?}"),
        }
    }
}
