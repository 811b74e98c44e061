//! Sensor abstraction shared by every concrete sensor.
//!
//! A sensor owns a fixed-width measurement buffer. On refresh it reads
//! the mechanical state snapshot ([`SensorContext`]), writes the ideal
//! measurement into the buffer, then skews it with the configured bias
//! and white noise so downstream consumers only ever see the distorted
//! signal, the way hardware would deliver it.

use armature_core::ConfigNode;
use armature_rigid::{RigidData, RigidModel};
use nalgebra::{DVector, Vector3};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::error::SensorError;

// ── Measurement context ──────────────────────────────────────────────

/// Read-only snapshot of the mechanical state handed to sensors.
///
/// Built by the engine once per sensor update, after forward kinematics
/// has populated `data` for the current `(q, v)`.
pub struct SensorContext<'a> {
    /// Generalized position at the sampling instant.
    pub q: &'a DVector<f64>,
    /// Generalized velocity at the sampling instant.
    pub v: &'a DVector<f64>,
    /// Model the state refers to.
    pub model: &'a RigidModel,
    /// Kinematic quantities for `(q, v)`, already computed.
    pub data: &'a RigidData,
    /// Active contact forces as `(frame index, world-frame force)` pairs.
    pub contact_forces: &'a [(usize, Vector3<f64>)],
}

// ── Sensor trait ─────────────────────────────────────────────────────

/// Common interface of every sensor attached to a model.
///
/// Sensors are grouped by [`sensor_type`](Sensor::sensor_type) and
/// addressed by `(type, name)`. The attachment point (frame or joint)
/// is fixed at construction, so a constructed sensor is always ready
/// to refresh.
pub trait Sensor: std::fmt::Debug {
    /// Name of this sensor within its type group.
    fn name(&self) -> &str;

    /// Type label, e.g. `"ImuSensor"`.
    fn sensor_type(&self) -> &'static str;

    /// Per-field suffixes of the measurement, e.g. `"Gyrox"`.
    ///
    /// The length of this slice is the sensor's measurement width.
    fn fieldnames(&self) -> &'static [&'static str];

    /// Current options as a tree with `noiseStd` and `bias` keys.
    fn options(&self) -> ConfigNode;

    /// Replace the options from a tree produced by [`options`](Sensor::options).
    ///
    /// Non-empty `noiseStd` or `bias` vectors must match the field
    /// count; empty vectors disable the corresponding distortion.
    fn set_options(&mut self, options: &ConfigNode) -> Result<(), SensorError>;

    /// Sample the mechanical state and update the measurement buffer.
    fn refresh(&mut self, ctx: &SensorContext<'_>, rng: &mut ChaCha8Rng);

    /// Latest measurement, bias and noise included.
    fn value(&self) -> &[f64];
}

// ── Shared plumbing ──────────────────────────────────────────────────

/// Distortion options common to all sensors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorOptions {
    /// Additive white-noise standard deviation per field. Empty = none.
    pub noise_std: Vec<f64>,
    /// Constant additive bias per field. Empty = none.
    pub bias: Vec<f64>,
}

/// Name, options and measurement buffer shared by concrete sensors.
///
/// Concrete sensors embed one of these and delegate the bookkeeping
/// half of the [`Sensor`] trait to it.
#[derive(Debug)]
pub struct SensorCore {
    name: String,
    options: SensorOptions,
    value: Vec<f64>,
}

impl SensorCore {
    /// New core with the given name and measurement width.
    pub fn new(name: impl Into<String>, fields: usize) -> Self {
        Self {
            name: name.into(),
            options: SensorOptions::default(),
            value: vec![0.0; fields],
        }
    }

    /// Sensor name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Latest measurement.
    pub fn value(&self) -> &[f64] {
        &self.value
    }

    /// Measurement buffer for the owning sensor to write into.
    pub fn value_mut(&mut self) -> &mut [f64] {
        &mut self.value
    }

    /// Options as a `{noiseStd, bias}` tree.
    pub fn options_node(&self) -> ConfigNode {
        let mut node = ConfigNode::new();
        node.set("noiseStd", self.options.noise_std.clone());
        node.set("bias", self.options.bias.clone());
        node
    }

    /// Replace the options, validating keys and vector lengths.
    ///
    /// `sensor_type` is only used to label errors.
    pub fn set_options_node(
        &mut self,
        sensor_type: &str,
        node: &ConfigNode,
    ) -> Result<(), SensorError> {
        node.reject_unknown(&["noiseStd", "bias"])?;
        let noise_std = node.get_floats("noiseStd")?.to_vec();
        let bias = node.get_floats("bias")?.to_vec();
        for (key, values) in [("noiseStd", &noise_std), ("bias", &bias)] {
            if !values.is_empty() && values.len() != self.value.len() {
                return Err(SensorError::OptionLengthMismatch {
                    sensor: format!("{sensor_type}.{}", self.name),
                    key: key.to_string(),
                    expected: self.value.len(),
                    found: values.len(),
                });
            }
        }
        self.options = SensorOptions { noise_std, bias };
        Ok(())
    }

    /// Apply bias and white noise to the measurement buffer in place.
    pub fn skew(&mut self, rng: &mut ChaCha8Rng) {
        if !self.options.bias.is_empty() {
            for (value, bias) in self.value.iter_mut().zip(&self.options.bias) {
                *value += bias;
            }
        }
        if !self.options.noise_std.is_empty() {
            for i in 0..self.value.len() {
                self.value[i] += self.options.noise_std[i] * standard_normal(rng);
            }
        }
    }
}

/// Standard normal draw via the Box-Muller transform.
pub(crate) fn standard_normal(rng: &mut ChaCha8Rng) -> f64 {
    let u1 = rng.random::<f64>().max(1.0e-300);
    let u2 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

// ── Tests ────────────────────────────────────────────────────────────
