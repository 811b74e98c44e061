//! Registry of the sensors attached to a model, grouped by type.

use armature_core::{ConfigNode, ConfigValue};
use indexmap::IndexMap;
use rand_chacha::ChaCha8Rng;

use crate::sensor::{Sensor, SensorContext};
use crate::error::SensorError;

// ── Sensor set ───────────────────────────────────────────────────────

/// All sensors attached to a model, grouped by type label.
///
/// Groups and sensors keep their registration order, which fixes the
/// order of telemetry columns and of noise draws across runs.
#[derive(Debug, Default)]
pub struct SensorSet {
    groups: IndexMap<String, Vec<Box<dyn Sensor>>>,
}

impl SensorSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of sensors across all types.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Whether the set holds no sensors.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Registered type labels, in registration order.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Register a sensor under its type group.
    ///
    /// Fails if a sensor with the same type and name already exists.
    pub fn add(&mut self, sensor: Box<dyn Sensor>) -> Result<(), SensorError> {
        if self.get(sensor.sensor_type(), sensor.name()).is_some() {
            return Err(SensorError::DuplicateSensor {
                sensor_type: sensor.sensor_type().to_string(),
                name: sensor.name().to_string(),
            });
        }
        self.groups
            .entry(sensor.sensor_type().to_string())
            .or_default()
            .push(sensor);
        Ok(())
    }

    /// Remove one sensor. Dropping the last sensor of a type also
    /// drops the type group.
    pub fn remove(&mut self, sensor_type: &str, name: &str) -> Result<(), SensorError> {
        let group = self
            .groups
            .get_mut(sensor_type)
            .ok_or_else(|| SensorError::UnknownSensorType {
                sensor_type: sensor_type.to_string(),
            })?;
        let index = group
            .iter()
            .position(|sensor| sensor.name() == name)
            .ok_or_else(|| SensorError::UnknownSensor {
                sensor_type: sensor_type.to_string(),
                name: name.to_string(),
            })?;
        group.remove(index);
        if group.is_empty() {
            self.groups.shift_remove(sensor_type);
        }
        Ok(())
    }

    /// Remove every sensor of one type.
    pub fn remove_type(&mut self, sensor_type: &str) -> Result<(), SensorError> {
        self.groups
            .shift_remove(sensor_type)
            .map(|_| ())
            .ok_or_else(|| SensorError::UnknownSensorType {
                sensor_type: sensor_type.to_string(),
            })
    }

    /// Look up a sensor by type and name.
    pub fn get(&self, sensor_type: &str, name: &str) -> Option<&dyn Sensor> {
        self.groups
            .get(sensor_type)?
            .iter()
            .find(|sensor| sensor.name() == name)
            .map(Box::as_ref)
    }

    /// All sensors in group order, then registration order within a group.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Sensor> {
        self.groups.values().flatten().map(Box::as_ref)
    }

    /// Refresh every sensor against the given state snapshot.
    ///
    /// Noise draws happen in iteration order, so a fixed seed yields
    /// identical measurements run after run.
    pub fn refresh_all(&mut self, ctx: &SensorContext<'_>, rng: &mut ChaCha8Rng) {
        for group in self.groups.values_mut() {
            for sensor in group {
                sensor.refresh(ctx, rng);
            }
        }
    }

    /// Options of every sensor as a `type -> name -> options` tree.
    pub fn options(&self) -> ConfigNode {
        let mut root = ConfigNode::new();
        for (sensor_type, group) in &self.groups {
            let mut by_name = ConfigNode::new();
            for sensor in group {
                by_name.set(sensor.name(), sensor.options());
            }
            root.set(sensor_type.as_str(), by_name);
        }
        root
    }

    /// Apply a `type -> name -> options` tree produced by
    /// [`options`](SensorSet::options), possibly modified.
    ///
    /// Every key must name a registered type or sensor.
    pub fn set_options(&mut self, options: &ConfigNode) -> Result<(), SensorError> {
        for (sensor_type, value) in options.iter() {
            let by_name = match value {
                ConfigValue::Node(node) => node,
                other => {
                    return Err(SensorError::Config(
                        armature_core::ConfigError::TypeMismatch {
                            key: sensor_type.to_string(),
                            expected: "node",
                            found: other.type_name(),
                        },
                    ))
                }
            };
            let group = self.groups.get_mut(sensor_type).ok_or_else(|| {
                SensorError::UnknownSensorType {
                    sensor_type: sensor_type.to_string(),
                }
            })?;
            for (name, sensor_options) in by_name.iter() {
                let node = sensor_options.as_node().ok_or_else(|| {
                    SensorError::Config(armature_core::ConfigError::TypeMismatch {
                        key: name.to_string(),
                        expected: "node",
                        found: sensor_options.type_name(),
                    })
                })?;
                let sensor = group
                    .iter_mut()
                    .find(|sensor| sensor.name() == name)
                    .ok_or_else(|| SensorError::UnknownSensor {
                        sensor_type: sensor_type.to_string(),
                        name: name.to_string(),
                    })?;
                sensor.set_options(node)?;
            }
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{EncoderSensor, ImuSensor};

    fn two_sensor_set() -> SensorSet {
        let mut set = SensorSet::new();
        set.add(Box::new(ImuSensor::new("tip", 2))).unwrap();
        set.add(Box::new(EncoderSensor::new("pivot", 0))).unwrap();
        set
    }

    #[test]
    fn add_and_lookup_by_type_and_name() {
        let set = two_sensor_set();
        assert_eq!(set.len(), 2);
        assert!(set.get(ImuSensor::TYPE, "tip").is_some());
        assert!(set.get(ImuSensor::TYPE, "pivot").is_none());
        assert!(set.get(EncoderSensor::TYPE, "pivot").is_some());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut set = two_sensor_set();
        match set.add(Box::new(ImuSensor::new("tip", 5))) {
            Err(SensorError::DuplicateSensor { sensor_type, name }) => {
                assert_eq!(sensor_type, ImuSensor::TYPE);
                assert_eq!(name, "tip");
            }
            other => panic!("expected DuplicateSensor, got {other:?}"),
        }
    }

    #[test]
    fn same_name_under_another_type_is_fine() {
        let mut set = two_sensor_set();
        set.add(Box::new(EncoderSensor::new("tip", 0))).unwrap();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn removing_the_last_sensor_drops_the_group() {
        let mut set = two_sensor_set();
        set.remove(ImuSensor::TYPE, "tip").unwrap();
        assert_eq!(set.types().collect::<Vec<_>>(), vec![EncoderSensor::TYPE]);
        match set.remove(ImuSensor::TYPE, "tip") {
            Err(SensorError::UnknownSensorType { sensor_type }) => {
                assert_eq!(sensor_type, ImuSensor::TYPE);
            }
            other => panic!("expected UnknownSensorType, got {other:?}"),
        }
    }

    #[test]
    fn remove_unknown_name_reports_the_sensor() {
        let mut set = two_sensor_set();
        match set.remove(ImuSensor::TYPE, "waist") {
            Err(SensorError::UnknownSensor { name, .. }) => assert_eq!(name, "waist"),
            other => panic!("expected UnknownSensor, got {other:?}"),
        }
    }

    #[test]
    fn iteration_follows_registration_order() {
        let mut set = two_sensor_set();
        set.add(Box::new(ImuSensor::new("waist", 1))).unwrap();
        let names: Vec<_> = set.iter().map(|s| s.name().to_string()).collect();
        // Imu group first (registered first), encoder group after.
        assert_eq!(names, vec!["tip", "waist", "pivot"]);
    }

    #[test]
    fn options_tree_mirrors_the_groups() {
        let set = two_sensor_set();
        let options = set.options();
        let imu = options
            .get_node(ImuSensor::TYPE)
            .unwrap()
            .get_node("tip")
            .unwrap();
        assert_eq!(imu.get_floats("noiseStd").unwrap(), &[] as &[f64]);
        assert_eq!(imu.get_floats("bias").unwrap(), &[] as &[f64]);
    }

    #[test]
    fn set_options_round_trips_through_the_tree() {
        let mut set = two_sensor_set();
        let mut options = set.options();
        options
            .node_mut(EncoderSensor::TYPE)
            .unwrap()
            .node_mut("pivot")
            .unwrap()
            .set("bias", vec![0.01, 0.0]);
        set.set_options(&options).unwrap();
        assert_eq!(set.options(), options);
    }

    #[test]
    fn set_options_rejects_unknown_sensor() {
        let mut set = two_sensor_set();
        let mut options = set.options();
        let mut stray = ConfigNode::new();
        stray.set("noiseStd", Vec::<f64>::new());
        stray.set("bias", Vec::<f64>::new());
        options
            .node_mut(ImuSensor::TYPE)
            .unwrap()
            .set("waist", stray);
        match set.set_options(&options) {
            Err(SensorError::UnknownSensor { name, .. }) => assert_eq!(name, "waist"),
            other => panic!("expected UnknownSensor, got {other:?}"),
        }
    }
}
