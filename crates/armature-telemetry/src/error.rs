//! Error type for telemetry registration, recording and log I/O.

use std::io;

// ── Error type ───────────────────────────────────────────────────────

/// Errors raised by the telemetry recorder and the log writers.
#[derive(Debug)]
pub enum TelemetryError {
    /// An I/O error occurred while writing or reading a log file.
    Io(io::Error),
    /// The CSV layer reported an error in text mode.
    Csv(csv::Error),
    /// A registration arrived after the first recorded row.
    RegistrationClosed {
        /// Name that was being registered.
        name: String,
    },
    /// A constant or column with this name is already registered.
    DuplicateEntry {
        /// The colliding name.
        name: String,
    },
    /// The name is reserved for the log's own layout markers.
    ReservedName {
        /// The rejected name.
        name: String,
    },
    /// A recorded row does not match the registered column count.
    RowLengthMismatch {
        /// Number of registered columns (time excluded).
        expected: usize,
        /// Number of values supplied.
        found: usize,
    },
    /// A column name was looked up that the log does not contain.
    UnknownColumn {
        /// The missing column name.
        name: String,
    },
    /// The file does not start with the expected magic bytes.
    InvalidMagic,
    /// The binary format version is not supported by this build.
    UnsupportedVersion {
        /// The version found in the file.
        found: u8,
    },
    /// The binary log could not be decoded (truncated or corrupt data).
    Malformed {
        /// Human-readable description of what went wrong.
        detail: String,
    },
}

impl std::fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Csv(e) => write!(f, "CSV error: {e}"),
            Self::RegistrationClosed { name } => {
                write!(f, "cannot register '{name}': recording has started")
            }
            Self::DuplicateEntry { name } => {
                write!(f, "telemetry entry '{name}' is already registered")
            }
            Self::ReservedName { name } => {
                write!(f, "telemetry name '{name}' is reserved")
            }
            Self::RowLengthMismatch { expected, found } => {
                write!(f, "row holds {found} values, expected {expected}")
            }
            Self::UnknownColumn { name } => {
                write!(f, "log has no column '{name}'")
            }
            Self::InvalidMagic => write!(f, "invalid magic bytes (expected b\"ATLG\")"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported log format version {found}")
            }
            Self::Malformed { detail } => write!(f, "malformed log: {detail}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TelemetryError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<csv::Error> for TelemetryError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e)
    }
}
