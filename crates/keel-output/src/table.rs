//! Materialized output tables.
//!
//! Tables are never appended to in place: each write renders the full table
//! into a temporary sibling file and renames it over the target.

use crate::{
    error::{ExportError, Result},
    export::{ExportFormat, Exporter},
};
use keel_data::{MetricsRecord, ValuationObservation};
use keel_engine::DistributionSummary;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Write `bytes` to `path` via a temporary file in the same directory.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| ExportError::InvalidFormat(format!("{} has no file name", path.display())))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let written = File::create(&tmp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(e) = written.and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// Named tables under one output directory.
#[derive(Debug, Clone)]
pub struct TableWriter {
    dir: PathBuf,
    format: ExportFormat,
}

impl TableWriter {
    /// Writer rooted at `dir`, created if missing.
    pub fn new(dir: impl Into<PathBuf>, format: ExportFormat) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, format })
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a table by name.
    pub fn path_for(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.{}", self.format.extension()))
    }

    fn write<T: Exporter + ?Sized>(&self, table: &str, rows: &T, count: usize) -> Result<PathBuf> {
        let path = self.path_for(table);
        rows.export_to_file(&path, self.format)?;
        info!(table, rows = count, path = %path.display(), "wrote table");
        Ok(path)
    }

    /// Replace the `metrics` table.
    pub fn write_metrics(&self, records: &[MetricsRecord]) -> Result<PathBuf> {
        self.write("metrics", records, records.len())
    }

    /// Replace the `valuations` table.
    pub fn write_valuations(&self, observations: &[ValuationObservation]) -> Result<PathBuf> {
        self.write("valuations", observations, observations.len())
    }

    /// Replace the `distributions` table.
    pub fn write_summaries(&self, summaries: &[DistributionSummary]) -> Result<PathBuf> {
        self.write("distributions", summaries, summaries.len())
    }
}
