//! Core types for the Armature rigid-body simulation stack.
//!
//! Provides the dynamic option tree ([`ConfigNode`]) shared by every
//! configurable device, and the generalized state types consumed by the
//! dynamics and integration layers.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod state;

pub use config::{ConfigError, ConfigNode, ConfigValue};
pub use state::{State, StateError};
