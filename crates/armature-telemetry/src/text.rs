//! Human-readable log export: `#` comment lines plus CSV.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::TelemetryError;
use crate::log::Log;

// ── Text writer ──────────────────────────────────────────────────────

/// Write `log` as text: one `# name=value` comment line per constant,
/// then a CSV header row and one CSV row per sample.
///
/// Generic over `W: Write` so tests can target `Vec<u8>` while callers
/// hand in a buffered file.
pub fn write_text<W: Write>(mut writer: W, log: &Log) -> Result<(), TelemetryError> {
    for constant in log.constants() {
        writeln!(writer, "# {constant}")?;
    }
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(log.headers())?;
    let mut record: Vec<String> = Vec::with_capacity(log.data.ncols());
    for row in 0..log.data.nrows() {
        record.clear();
        record.extend(log.data.row(row).iter().map(|value| value.to_string()));
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// [`write_text`] into a freshly created file at `path`.
pub fn write_text_file(path: impl AsRef<Path>, log: &Log) -> Result<(), TelemetryError> {
    let file = BufWriter::new(File::create(path)?);
    write_text(file, log)
}

// ── Tests ────────────────────────────────────────────────────────────
