//! Sensor framework for the Armature simulation stack.
//!
//! Sensors sample the mechanical state at the engine's sensor update
//! period and expose distorted measurements (bias plus seeded white
//! noise) both to controllers and to the telemetry log. The stock
//! sensors cover the usual robot instrumentation: IMU, incremental
//! encoder and contact force.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod basic;
pub mod error;
pub mod sensor;
pub mod set;

pub use basic::{EncoderSensor, ForceSensor, ImuSensor};
pub use sensor::{Sensor, SensorContext, SensorCore, SensorOptions};
pub use error::SensorError;
pub use set::SensorSet;
