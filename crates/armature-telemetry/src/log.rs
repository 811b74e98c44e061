//! In-memory simulation log and trajectory extraction.

use std::path::PathBuf;

use armature_core::State;
use nalgebra::{DMatrix, DVector, DVectorView};

use crate::error::TelemetryError;

// ── Layout markers ───────────────────────────────────────────────────

/// Marker opening the constants section of [`Log::info`].
pub const START_CONSTANTS: &str = "StartConstants";

/// Marker separating constants from column names in [`Log::info`].
pub const START_COLUMNS: &str = "StartColumns";

/// Marker closing [`Log::info`]; the data matrix follows.
pub const START_DATA: &str = "StartData";

/// Name of the implicit first column holding the timestamp.
pub const GLOBAL_TIME: &str = "Global.Time";

// ── Log ──────────────────────────────────────────────────────────────

/// A recorded simulation log: self-describing metadata plus one data
/// matrix with a row per telemetry sample.
///
/// `info` is laid out as
///
/// ```text
/// StartConstants, <name=value>…, StartColumns, Global.Time, <column>…, StartData
/// ```
///
/// with exactly one `StartColumns` marker and `Global.Time` always the
/// first column, matching the data matrix column for column.
#[derive(Debug, Clone, PartialEq)]
pub struct Log {
    /// Metadata section: constants and column names between markers.
    pub info: Vec<String>,
    /// Sample matrix, one row per record, one column per header.
    pub data: DMatrix<f64>,
}

impl Log {
    /// Constant entries (`name=value` strings), markers excluded.
    pub fn constants(&self) -> &[String] {
        match self.info.iter().position(|s| s == START_COLUMNS) {
            Some(end) if end >= 1 => &self.info[1..end],
            _ => &[],
        }
    }

    /// Column names in data order, markers excluded.
    pub fn headers(&self) -> &[String] {
        match self.info.iter().position(|s| s == START_COLUMNS) {
            Some(start) if start + 1 < self.info.len() => {
                &self.info[start + 1..self.info.len() - 1]
            }
            _ => &[],
        }
    }

    /// Number of recorded rows.
    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    /// View of the column registered under `name`.
    pub fn column(&self, name: &str) -> Option<DVectorView<'_, f64>> {
        let index = self.headers().iter().position(|h| h == name)?;
        Some(self.data.column(index))
    }

    /// Like [`column`](Log::column) but with a named error.
    fn require_column(&self, name: &str) -> Result<DVectorView<'_, f64>, TelemetryError> {
        self.column(name).ok_or_else(|| TelemetryError::UnknownColumn {
            name: name.to_string(),
        })
    }
}

// ── Trajectory ───────────────────────────────────────────────────────

/// A time-stamped sequence of mechanical states pulled out of a log.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    /// Robot description the states refer to.
    pub urdf_path: PathBuf,
    /// Sample times, one per state.
    pub times: Vec<f64>,
    /// Mechanical state at each sample time.
    pub states: Vec<State>,
}

/// Rebuild the state evolution from the given log columns.
///
/// `position_fields` and `velocity_fields` name the log columns holding
/// `q` and `v` coordinate by coordinate; timestamps come from the
/// `Global.Time` column. Fails if any named column is missing.
pub fn extract_trajectory(
    log: &Log,
    position_fields: &[String],
    velocity_fields: &[String],
    urdf_path: impl Into<PathBuf>,
) -> Result<Trajectory, TelemetryError> {
    let times: Vec<f64> = log.require_column(GLOBAL_TIME)?.iter().copied().collect();

    let position_columns = position_fields
        .iter()
        .map(|name| log.require_column(name))
        .collect::<Result<Vec<_>, _>>()?;
    let velocity_columns = velocity_fields
        .iter()
        .map(|name| log.require_column(name))
        .collect::<Result<Vec<_>, _>>()?;

    let states = (0..log.nrows())
        .map(|row| State {
            q: DVector::from_iterator(
                position_columns.len(),
                position_columns.iter().map(|col| col[row]),
            ),
            v: DVector::from_iterator(
                velocity_columns.len(),
                velocity_columns.iter().map(|col| col[row]),
            ),
        })
        .collect();

    Ok(Trajectory {
        urdf_path: urdf_path.into(),
        times,
        states,
    })
}

// ── Tests ────────────────────────────────────────────────────────────
