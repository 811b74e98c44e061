//! Error type for sensor construction, configuration and refresh.

use armature_core::ConfigError;

// ── Error type ───────────────────────────────────────────────────────

/// Errors produced by sensors and [`SensorSet`](crate::SensorSet).
#[derive(Debug, PartialEq)]
pub enum SensorError {
    /// A sensor with the same type and name is already registered.
    DuplicateSensor {
        /// Sensor type label, e.g. `"ImuSensor"`.
        sensor_type: String,
        /// Sensor name within its type group.
        name: String,
    },
    /// No sensor with this type and name is registered.
    UnknownSensor {
        /// Sensor type label that was looked up.
        sensor_type: String,
        /// Sensor name that was looked up.
        name: String,
    },
    /// No sensor of this type is registered.
    UnknownSensorType {
        /// Sensor type label that was looked up.
        sensor_type: String,
    },
    /// A per-field option vector does not match the sensor's field count.
    OptionLengthMismatch {
        /// Sensor the options were meant for.
        sensor: String,
        /// Offending option key, e.g. `"noiseStd"`.
        key: String,
        /// Number of fields the sensor measures.
        expected: usize,
        /// Number of entries supplied.
        found: usize,
    },
    /// An option tree was structurally invalid.
    Config(ConfigError),
}

impl std::fmt::Display for SensorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateSensor { sensor_type, name } => {
                write!(f, "sensor '{sensor_type}.{name}' is already registered")
            }
            Self::UnknownSensor { sensor_type, name } => {
                write!(f, "no sensor '{sensor_type}.{name}' is registered")
            }
            Self::UnknownSensorType { sensor_type } => {
                write!(f, "no sensor of type '{sensor_type}' is registered")
            }
            Self::OptionLengthMismatch {
                sensor,
                key,
                expected,
                found,
            } => {
                write!(
                    f,
                    "option '{key}' for sensor '{sensor}' must hold {expected} \
                     values, got {found}"
                )
            }
            Self::Config(err) => write!(f, "invalid sensor options: {err}"),
        }
    }
}

impl std::error::Error for SensorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for SensorError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}
