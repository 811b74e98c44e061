//! Engine-layer errors.

use std::error::Error;
use std::fmt;

use armature_core::{ConfigError, StateError};
use armature_rigid::RigidError;
use armature_sensor::SensorError;
use armature_telemetry::TelemetryError;
use armature_urdf::UrdfError;

// ── ModelError ─────────────────────────────────────────────────────

/// Errors from building or configuring a [`Model`](crate::Model).
#[derive(Debug)]
pub enum ModelError {
    /// The model has not been initialized yet.
    NotInitialized,
    /// `initialize` was called on an already initialized model.
    AlreadyInitialized,
    /// Floating-base models are not supported by this engine.
    FreeFlyerUnsupported,
    /// A frame name did not resolve against the robot description.
    UnknownFrame {
        /// The name that failed to resolve.
        name: String,
    },
    /// A joint name did not resolve against the robot description.
    UnknownJoint {
        /// The name that failed to resolve.
        name: String,
    },
    /// The URDF file could not be parsed.
    Urdf(UrdfError),
    /// The rigid-body model could not be built.
    Rigid(RigidError),
    /// A sensor operation failed.
    Sensor(SensorError),
    /// An option tree was structurally invalid.
    Config(ConfigError),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "model is not initialized"),
            Self::AlreadyInitialized => write!(f, "model is already initialized"),
            Self::FreeFlyerUnsupported => {
                write!(f, "floating-base models are not supported")
            }
            Self::UnknownFrame { name } => write!(f, "no frame named '{name}'"),
            Self::UnknownJoint { name } => write!(f, "no joint named '{name}'"),
            Self::Urdf(e) => write!(f, "urdf: {e}"),
            Self::Rigid(e) => write!(f, "rigid model: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Config(e) => write!(f, "model options: {e}"),
        }
    }
}

impl Error for ModelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Urdf(e) => Some(e),
            Self::Rigid(e) => Some(e),
            Self::Sensor(e) => Some(e),
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<UrdfError> for ModelError {
    fn from(e: UrdfError) -> Self {
        Self::Urdf(e)
    }
}

impl From<RigidError> for ModelError {
    fn from(e: RigidError) -> Self {
        Self::Rigid(e)
    }
}

impl From<SensorError> for ModelError {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

impl From<ConfigError> for ModelError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ── SimulatorError ─────────────────────────────────────────────────

/// Errors from constructing or running a [`Simulator`](crate::Simulator).
#[derive(Debug)]
pub enum SimulatorError {
    /// A model-level operation failed.
    Model(ModelError),
    /// A dynamics algorithm failed mid-run.
    Rigid(RigidError),
    /// The initial state vector is unusable.
    State(StateError),
    /// A sensor refused its configuration.
    Sensor(SensorError),
    /// Telemetry registration, recording, or log I/O failed.
    Telemetry(TelemetryError),
    /// An engine option tree was structurally invalid.
    Config(ConfigError),
    /// The controller passed to the simulator is not initialized.
    ControllerNotInitialized,
    /// The controller was initialized against a different model.
    ControllerMismatch {
        /// Buffer sizes the controller was bound to, `(nu, nv)`.
        controller: (usize, usize),
        /// Buffer sizes the model requires, `(nu, nv)`.
        model: (usize, usize),
    },
    /// A telemetry entry with this name is already registered.
    DuplicateEntry {
        /// The colliding entry name.
        name: String,
    },
    /// `run` was called with a non-positive duration.
    InvalidDuration {
        /// The offending final time.
        tf: f64,
    },
    /// The stepper exhausted its iteration budget.
    IterationLimit {
        /// The configured `iterMax`.
        limit: i64,
    },
    /// The adaptive stepper underflowed its step size.
    StepFailure {
        /// Simulation time at which integration stalled.
        time: f64,
        /// Step size that was refused.
        step: f64,
    },
    /// `get_log` was called before any completed run.
    NoLogAvailable,
}

impl fmt::Display for SimulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model(e) => write!(f, "model: {e}"),
            Self::Rigid(e) => write!(f, "dynamics: {e}"),
            Self::State(e) => write!(f, "state: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Telemetry(e) => write!(f, "telemetry: {e}"),
            Self::Config(e) => write!(f, "engine options: {e}"),
            Self::ControllerNotInitialized => {
                write!(f, "controller is not initialized")
            }
            Self::ControllerMismatch { controller, model } => write!(
                f,
                "controller is bound to (nu, nv) = {controller:?}, model requires {model:?}"
            ),
            Self::DuplicateEntry { name } => {
                write!(f, "telemetry entry '{name}' is already registered")
            }
            Self::InvalidDuration { tf } => {
                write!(f, "simulation duration must be positive, got {tf}")
            }
            Self::IterationLimit { limit } => {
                write!(f, "stepper exceeded iterMax = {limit} iterations")
            }
            Self::StepFailure { time, step } => {
                write!(f, "step size underflow at t = {time} (dt = {step:e})")
            }
            Self::NoLogAvailable => write!(f, "no log available: run a simulation first"),
        }
    }
}

impl Error for SimulatorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Model(e) => Some(e),
            Self::Rigid(e) => Some(e),
            Self::State(e) => Some(e),
            Self::Sensor(e) => Some(e),
            Self::Telemetry(e) => Some(e),
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ModelError> for SimulatorError {
    fn from(e: ModelError) -> Self {
        Self::Model(e)
    }
}

impl From<RigidError> for SimulatorError {
    fn from(e: RigidError) -> Self {
        Self::Rigid(e)
    }
}

impl From<StateError> for SimulatorError {
    fn from(e: StateError) -> Self {
        Self::State(e)
    }
}

impl From<SensorError> for SimulatorError {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

impl From<TelemetryError> for SimulatorError {
    fn from(e: TelemetryError) -> Self {
        Self::Telemetry(e)
    }
}

impl From<ConfigError> for SimulatorError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
