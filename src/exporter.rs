//! # CSV Export Module
//!
//! Writes the session's samples to a comma separated file.
//!
//! ## File Layout
//! ```text
//! sensor_data_YYYYMMDD_HHMMSS.csv
//! C,R,IR,G,X,Y,Z
//! 12.0,51234.5,48872.0,3011.0,127.0,127.0,127.0
//! ...
//! ```
//! One row per sample in index order, columns always in the order above.
//!
//! ## Atomic Writes
//! Rows go to a temporary file next to the destination, which is renamed over
//! the destination only once everything has been written and flushed. A
//! failed export leaves no partial file behind and does not touch an existing
//! file at the destination.

use crate::channel::Channel;
use crate::error::ExportError;
use crate::session_store::SessionStore;
use chrono::{DateTime, Local};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Default export filename for a given moment
pub fn default_file_name(now: DateTime<Local>) -> String {
    format!("sensor_data_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Default export path inside `dir`, stamped with the current local time
pub fn default_export_path(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join(default_file_name(Local::now()))
}

fn format_value(value: f64) -> String {
    // Debug keeps the fractional part on whole numbers ("12.0", not "12").
    format!("{:?}", value)
}

/// Encode the store as CSV into any writer
pub fn write_csv<W: Write>(store: &SessionStore, writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer.write_record(Channel::ALL.iter().map(|c| c.name()))?;
    for record in store.iter() {
        csv_writer.write_record(record.values().as_array().iter().map(|v| format_value(*v)))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Export every stored sample to `path`.
///
/// Returns the number of data rows written.
pub fn export_csv(store: &SessionStore, path: impl AsRef<Path>) -> Result<usize, ExportError> {
    if store.is_empty() {
        return Err(ExportError::NoSamples);
    }

    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }

    log::info!("Exporting {} samples to: {}", store.len(), path.display());

    let mut staging = NamedTempFile::new_in(&dir)?;
    write_csv(store, staging.as_file_mut())?;
    staging.as_file().sync_all()?;
    staging.persist(path).map_err(|e| ExportError::Io(e.error))?;

    Ok(store.len())
}
