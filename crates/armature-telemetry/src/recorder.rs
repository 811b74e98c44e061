//! Registration-then-record telemetry capture.

use indexmap::IndexSet;
use nalgebra::DMatrix;

use crate::error::TelemetryError;
use crate::log::{Log, GLOBAL_TIME, START_COLUMNS, START_CONSTANTS, START_DATA};

// ── Recorder ─────────────────────────────────────────────────────────

/// Collects constants, column registrations and sample rows for one run.
///
/// Lives in two phases. During registration, constants and columns may
/// be added in any order; the first recorded row seals the layout, and
/// later registrations are refused. [`into_log`](TelemetryRecorder::into_log)
/// turns the capture into a self-describing [`Log`].
#[derive(Debug, Default)]
pub struct TelemetryRecorder {
    constants: Vec<String>,
    constant_names: IndexSet<String>,
    columns: IndexSet<String>,
    values: Vec<f64>,
    nrows: usize,
    sealed: bool,
}

impl TelemetryRecorder {
    /// Empty recorder in the registration phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the first row has been recorded.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Number of registered columns, the implicit time column excluded.
    pub fn ncolumns(&self) -> usize {
        self.columns.len()
    }

    /// Number of recorded rows.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Record a run-wide constant, stored as `name=value`.
    pub fn register_constant(
        &mut self,
        name: &str,
        value: &str,
    ) -> Result<(), TelemetryError> {
        self.check_name(name)?;
        if !self.constant_names.insert(name.to_string()) {
            return Err(TelemetryError::DuplicateEntry {
                name: name.to_string(),
            });
        }
        self.constants.push(format!("{name}={value}"));
        Ok(())
    }

    /// Register one data column.
    pub fn register_column(&mut self, name: &str) -> Result<(), TelemetryError> {
        self.check_name(name)?;
        if !self.columns.insert(name.to_string()) {
            return Err(TelemetryError::DuplicateEntry {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Register several data columns, left to right.
    pub fn register_columns<I, S>(&mut self, names: I) -> Result<(), TelemetryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.register_column(name.as_ref())?;
        }
        Ok(())
    }

    /// Append one sample row and seal the layout.
    ///
    /// `values` must match the registered column count; `time` fills
    /// the implicit `Global.Time` column.
    pub fn record_row(&mut self, time: f64, values: &[f64]) -> Result<(), TelemetryError> {
        if values.len() != self.columns.len() {
            return Err(TelemetryError::RowLengthMismatch {
                expected: self.columns.len(),
                found: values.len(),
            });
        }
        self.sealed = true;
        self.values.push(time);
        self.values.extend_from_slice(values);
        self.nrows += 1;
        Ok(())
    }

    /// Finish the capture and build the log.
    pub fn into_log(self) -> Log {
        let mut info =
            Vec::with_capacity(self.constants.len() + self.columns.len() + 4);
        info.push(START_CONSTANTS.to_string());
        info.extend(self.constants);
        info.push(START_COLUMNS.to_string());
        info.push(GLOBAL_TIME.to_string());
        let ncols = 1 + self.columns.len();
        info.extend(self.columns);
        info.push(START_DATA.to_string());

        let data = DMatrix::from_row_iterator(self.nrows, ncols, self.values);
        Log { info, data }
    }

    fn check_name(&self, name: &str) -> Result<(), TelemetryError> {
        if self.sealed {
            return Err(TelemetryError::RegistrationClosed {
                name: name.to_string(),
            });
        }
        if name == START_CONSTANTS
            || name == START_COLUMNS
            || name == START_DATA
            || name == GLOBAL_TIME
        {
            return Err(TelemetryError::ReservedName {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder_with_two_columns() -> TelemetryRecorder {
        let mut recorder = TelemetryRecorder::new();
        recorder
            .register_constant("Global.urdf_file", "pendulum.urdf")
            .unwrap();
        recorder
            .register_columns(["controller.position", "controller.velocity"])
            .unwrap();
        recorder
    }

    #[test]
    fn info_layout_has_markers_in_order() {
        let mut recorder = recorder_with_two_columns();
        recorder.record_row(0.0, &[0.1, 0.0]).unwrap();
        let log = recorder.into_log();
        assert_eq!(
            log.info,
            vec![
                "StartConstants",
                "Global.urdf_file=pendulum.urdf",
                "StartColumns",
                "Global.Time",
                "controller.position",
                "controller.velocity",
                "StartData",
            ]
        );
        assert_eq!(log.data.shape(), (1, 3));
    }

    #[test]
    fn time_lands_in_the_first_column() {
        let mut recorder = recorder_with_two_columns();
        recorder.record_row(0.0, &[1.0, 2.0]).unwrap();
        recorder.record_row(0.001, &[3.0, 4.0]).unwrap();
        let log = recorder.into_log();
        assert_eq!(log.data[(0, 0)], 0.0);
        assert_eq!(log.data[(1, 0)], 0.001);
        assert_eq!(log.data[(1, 2)], 4.0);
    }

    #[test]
    fn first_row_seals_registration() {
        let mut recorder = recorder_with_two_columns();
        assert!(!recorder.is_sealed());
        recorder.record_row(0.0, &[0.0, 0.0]).unwrap();
        assert!(recorder.is_sealed());
        match recorder.register_column("controller.torque") {
            Err(TelemetryError::RegistrationClosed { name }) => {
                assert_eq!(name, "controller.torque");
            }
            other => panic!("expected RegistrationClosed, got {other:?}"),
        }
        match recorder.register_constant("Global.seed", "0") {
            Err(TelemetryError::RegistrationClosed { .. }) => {}
            other => panic!("expected RegistrationClosed, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_column_is_rejected() {
        let mut recorder = recorder_with_two_columns();
        match recorder.register_column("controller.position") {
            Err(TelemetryError::DuplicateEntry { name }) => {
                assert_eq!(name, "controller.position");
            }
            other => panic!("expected DuplicateEntry, got {other:?}"),
        }
    }

    #[test]
    fn marker_names_are_reserved() {
        let mut recorder = TelemetryRecorder::new();
        for reserved in ["StartConstants", "StartColumns", "StartData", "Global.Time"] {
            match recorder.register_column(reserved) {
                Err(TelemetryError::ReservedName { name }) => assert_eq!(name, reserved),
                other => panic!("expected ReservedName for {reserved}, got {other:?}"),
            }
        }
    }

    #[test]
    fn wrong_row_width_is_rejected() {
        let mut recorder = recorder_with_two_columns();
        match recorder.record_row(0.0, &[1.0]) {
            Err(TelemetryError::RowLengthMismatch { expected, found }) => {
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            other => panic!("expected RowLengthMismatch, got {other:?}"),
        }
        // A refused row must not seal the layout.
        assert!(!recorder.is_sealed());
    }

    #[test]
    fn empty_capture_builds_an_empty_log() {
        let recorder = TelemetryRecorder::new();
        let log = recorder.into_log();
        assert_eq!(log.nrows(), 0);
        assert_eq!(log.headers(), &["Global.Time".to_string()]);
    }
}
