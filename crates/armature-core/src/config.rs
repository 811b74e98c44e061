//! Dynamic option trees.
//!
//! Every configurable device (model, controller, simulator, sensors)
//! exposes its options as a [`ConfigNode`]: an insertion-ordered map of
//! string keys to [`ConfigValue`]s, where a value may itself be a nested
//! node. Callers fetch the tree, mutate entries in place, and push the
//! tree back through the owning device's `set_*_options`, which parses
//! it into typed settings and rejects anything malformed.

use std::error::Error;
use std::fmt;

use indexmap::IndexMap;

// ── ConfigValue ────────────────────────────────────────────────────

/// A single entry in an option tree.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer (counts, seeds).
    Int(i64),
    /// Floating-point scalar.
    Float(f64),
    /// String (solver names, file paths).
    Str(String),
    /// Flat list of floats (gravity vectors, per-field noise levels).
    FloatVec(Vec<f64>),
    /// Nested option group.
    Node(ConfigNode),
}

impl ConfigValue {
    /// Name of the contained type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::FloatVec(_) => "float list",
            Self::Node(_) => "node",
        }
    }

    /// Extract a bool, if this value is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract an integer, if this value is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract a float, if this value is one.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Extract a string slice, if this value is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Extract a float list, if this value is one.
    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            Self::FloatVec(v) => Some(v),
            _ => None,
        }
    }

    /// Extract a nested node, if this value is one.
    pub fn as_node(&self) -> Option<&ConfigNode> {
        match self {
            Self::Node(n) => Some(n),
            _ => None,
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for ConfigValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<f64>> for ConfigValue {
    fn from(v: Vec<f64>) -> Self {
        Self::FloatVec(v)
    }
}

impl From<&[f64]> for ConfigValue {
    fn from(v: &[f64]) -> Self {
        Self::FloatVec(v.to_vec())
    }
}

impl From<ConfigNode> for ConfigValue {
    fn from(n: ConfigNode) -> Self {
        Self::Node(n)
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors raised while reading or applying an option tree.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A required key is absent.
    MissingKey {
        /// The key that was looked up.
        key: String,
    },
    /// A key holds a value of the wrong type.
    TypeMismatch {
        /// The key that was looked up.
        key: String,
        /// The type the caller asked for.
        expected: &'static str,
        /// The type actually stored.
        found: &'static str,
    },
    /// A key the receiving device does not define.
    UnknownKey {
        /// The offending key.
        key: String,
    },
    /// A value parsed with the right type but an unusable content.
    InvalidValue {
        /// The key holding the value.
        key: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKey { key } => write!(f, "missing option '{key}'"),
            Self::TypeMismatch {
                key,
                expected,
                found,
            } => {
                write!(f, "option '{key}' has type {found}, expected {expected}")
            }
            Self::UnknownKey { key } => write!(f, "unknown option '{key}'"),
            Self::InvalidValue { key, reason } => {
                write!(f, "option '{key}' is invalid: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

// ── ConfigNode ─────────────────────────────────────────────────────

/// An insertion-ordered option tree node.
///
/// Iteration and listing order is the order keys were first inserted,
/// so a tree fetched from a device, mutated, and pushed back preserves
/// the device's canonical ordering.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigNode {
    entries: IndexMap<String, ConfigValue>,
}

impl ConfigNode {
    /// Create an empty node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in this node (not counting nested contents).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this node has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `key` exists in this node.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Insert or replace an entry.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Raw lookup.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    fn require(&self, key: &str) -> Result<&ConfigValue, ConfigError> {
        self.entries.get(key).ok_or_else(|| ConfigError::MissingKey {
            key: key.to_string(),
        })
    }

    fn mismatch(key: &str, expected: &'static str, found: &ConfigValue) -> ConfigError {
        ConfigError::TypeMismatch {
            key: key.to_string(),
            expected,
            found: found.type_name(),
        }
    }

    /// Fetch a bool entry.
    pub fn get_bool(&self, key: &str) -> Result<bool, ConfigError> {
        let value = self.require(key)?;
        value.as_bool().ok_or_else(|| Self::mismatch(key, "bool", value))
    }

    /// Fetch an integer entry.
    pub fn get_int(&self, key: &str) -> Result<i64, ConfigError> {
        let value = self.require(key)?;
        value.as_int().ok_or_else(|| Self::mismatch(key, "int", value))
    }

    /// Fetch a float entry.
    pub fn get_float(&self, key: &str) -> Result<f64, ConfigError> {
        let value = self.require(key)?;
        value.as_float().ok_or_else(|| Self::mismatch(key, "float", value))
    }

    /// Fetch a string entry.
    pub fn get_str(&self, key: &str) -> Result<&str, ConfigError> {
        let value = self.require(key)?;
        value.as_str().ok_or_else(|| Self::mismatch(key, "str", value))
    }

    /// Fetch a float-list entry.
    pub fn get_floats(&self, key: &str) -> Result<&[f64], ConfigError> {
        let value = self.require(key)?;
        value
            .as_floats()
            .ok_or_else(|| Self::mismatch(key, "float list", value))
    }

    /// Fetch a nested node.
    pub fn get_node(&self, key: &str) -> Result<&ConfigNode, ConfigError> {
        let value = self.require(key)?;
        value.as_node().ok_or_else(|| Self::mismatch(key, "node", value))
    }

    /// Fetch a nested node mutably.
    pub fn node_mut(&mut self, key: &str) -> Result<&mut ConfigNode, ConfigError> {
        match self.entries.get_mut(key) {
            Some(ConfigValue::Node(node)) => Ok(node),
            Some(other) => Err(ConfigError::TypeMismatch {
                key: key.to_string(),
                expected: "node",
                found: other.type_name(),
            }),
            None => Err(ConfigError::MissingKey {
                key: key.to_string(),
            }),
        }
    }

    /// Check that every key of `self` is listed in `allowed`.
    ///
    /// Devices call this when applying a pushed-back tree so that a
    /// misspelled option fails loudly instead of being ignored.
    pub fn reject_unknown(&self, allowed: &[&str]) -> Result<(), ConfigError> {
        for key in self.keys() {
            if !allowed.contains(&key) {
                return Err(ConfigError::UnknownKey {
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ConfigNode {
    type Item = (&'a String, &'a ConfigValue);
    type IntoIter = indexmap::map::Iter<'a, String, ConfigValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ── Tests ──────────────────────────────────────────────────────────
