//! Compact binary log format.
//!
//! All integers are little-endian. Strings are length-prefixed with a
//! `u32` length. The layout is intentionally simple — no compression,
//! no alignment padding:
//!
//! ```text
//! [MAGIC "ATLG"] [VERSION u8]
//! [u32 info count] [info string]…
//! [u64 rows] [u32 cols]
//! [f64 samples, row-major]
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use nalgebra::DMatrix;

use crate::error::TelemetryError;
use crate::log::{Log, START_COLUMNS};

/// Magic bytes at the start of every binary log file.
pub const MAGIC: [u8; 4] = *b"ATLG";

/// Current binary format version.
pub const FORMAT_VERSION: u8 = 1;

// ── Primitive writers ────────────────────────────────────────────────

fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), TelemetryError> {
    w.write_all(&[v])?;
    Ok(())
}

fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), TelemetryError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), TelemetryError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_f64_le(w: &mut dyn Write, v: f64) -> Result<(), TelemetryError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_length_prefixed_str(w: &mut dyn Write, s: &str) -> Result<(), TelemetryError> {
    write_u32_le(w, s.len() as u32)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

// ── Primitive readers ────────────────────────────────────────────────

fn read_u8(r: &mut dyn Read) -> Result<u8, TelemetryError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u32_le(r: &mut dyn Read) -> Result<u32, TelemetryError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64_le(r: &mut dyn Read) -> Result<u64, TelemetryError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_f64_le(r: &mut dyn Read) -> Result<f64, TelemetryError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

fn read_length_prefixed_str(r: &mut dyn Read) -> Result<String, TelemetryError> {
    let len = read_u32_le(r)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| TelemetryError::Malformed {
        detail: format!("invalid UTF-8 string: {e}"),
    })
}

// ── Log encode/decode ────────────────────────────────────────────────

/// Write `log` in the binary format.
pub fn write_binary<W: Write>(mut writer: W, log: &Log) -> Result<(), TelemetryError> {
    writer.write_all(&MAGIC)?;
    write_u8(&mut writer, FORMAT_VERSION)?;

    write_u32_le(&mut writer, log.info.len() as u32)?;
    for entry in &log.info {
        write_length_prefixed_str(&mut writer, entry)?;
    }

    write_u64_le(&mut writer, log.data.nrows() as u64)?;
    write_u32_le(&mut writer, log.data.ncols() as u32)?;
    for row in 0..log.data.nrows() {
        for col in 0..log.data.ncols() {
            write_f64_le(&mut writer, log.data[(row, col)])?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// [`write_binary`] into a freshly created file at `path`.
pub fn write_binary_file(path: impl AsRef<Path>, log: &Log) -> Result<(), TelemetryError> {
    let file = BufWriter::new(File::create(path)?);
    write_binary(file, log)
}

/// Decode a binary log, validating magic, version and layout.
pub fn read_binary<R: Read>(mut reader: R) -> Result<Log, TelemetryError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(TelemetryError::InvalidMagic);
    }
    let version = read_u8(&mut reader)?;
    if version != FORMAT_VERSION {
        return Err(TelemetryError::UnsupportedVersion { found: version });
    }

    let info_count = read_u32_le(&mut reader)? as usize;
    let mut info = Vec::with_capacity(info_count);
    for _ in 0..info_count {
        info.push(read_length_prefixed_str(&mut reader)?);
    }
    if info.iter().filter(|s| *s == START_COLUMNS).count() != 1 {
        return Err(TelemetryError::Malformed {
            detail: "info must hold exactly one StartColumns marker".to_string(),
        });
    }

    let nrows = read_u64_le(&mut reader)? as usize;
    let ncols = read_u32_le(&mut reader)? as usize;
    let mut values = Vec::with_capacity(nrows * ncols);
    for _ in 0..nrows * ncols {
        values.push(read_f64_le(&mut reader)?);
    }
    let log = Log {
        info,
        data: DMatrix::from_row_iterator(nrows, ncols, values),
    };
    if log.headers().len() != ncols {
        return Err(TelemetryError::Malformed {
            detail: format!(
                "info lists {} columns but the data holds {ncols}",
                log.headers().len()
            ),
        });
    }
    Ok(log)
}

/// [`read_binary`] from the file at `path`.
pub fn read_binary_file(path: impl AsRef<Path>) -> Result<Log, TelemetryError> {
    let file = BufReader::new(File::open(path)?);
    read_binary(file)
}

// ── Tests ────────────────────────────────────────────────────────────
