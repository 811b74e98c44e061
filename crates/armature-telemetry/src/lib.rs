//! Telemetry recording and log formats for the Armature simulation stack.
//!
//! The engine registers constants and columns during setup, records one
//! row per sensor update while integrating, and hands the capture out
//! as a self-describing [`Log`]. Logs can be exported as commented CSV
//! ([`write_text`]) or as a compact binary file ([`write_binary`]), and
//! the state evolution can be pulled back out with
//! [`extract_trajectory`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod binary;
pub mod error;
pub mod log;
pub mod recorder;
pub mod text;

pub use binary::{read_binary, read_binary_file, write_binary, write_binary_file};
pub use error::TelemetryError;
pub use log::{
    extract_trajectory, Log, Trajectory, GLOBAL_TIME, START_COLUMNS, START_CONSTANTS,
    START_DATA,
};
pub use recorder::TelemetryRecorder;
pub use text::{write_text, write_text_file};
