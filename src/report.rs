//! JSON-lines conversion report.
//!
//! One object per processed file followed by a final summary object, so a run
//! can be compared or post-processed without scraping log text.

use crate::models::ConversionOutcome;
use crate::progress::BatchSummary;
use crate::services::{CleanupResult, DiscoveredFile, MirroredTargets};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::time::Duration;

/// Report line for a single file
#[derive(Debug, Serialize)]
pub struct FileRecord<'a> {
    pub relative_path: &'a Utf8Path,
    pub source: &'a Utf8Path,
    pub temp_dir: &'a Utf8Path,
    pub output_file: &'a Utf8Path,
    pub outcome: &'a ConversionOutcome,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<&'a CleanupResult>,
}

impl<'a> FileRecord<'a> {
    pub fn new(
        file: &'a DiscoveredFile,
        targets: &'a MirroredTargets,
        outcome: &'a ConversionOutcome,
        duration: Duration,
        cleanup: Option<&'a CleanupResult>,
    ) -> Self {
        Self {
            relative_path: file.relative(),
            source: file.absolute(),
            temp_dir: &targets.temp_dir,
            output_file: &targets.output_file,
            outcome,
            duration_ms: duration.as_millis().try_into().unwrap_or(u64::MAX),
            cleanup,
        }
    }
}

#[derive(Serialize)]
struct SummaryRecord<'a> {
    summary: &'a BatchSummary,
}

/// Appends records to a `.jsonl` file
pub struct ReportWriter {
    path: Utf8PathBuf,
    writer: BufWriter<File>,
}

impl ReportWriter {
    /// Create (or truncate) the report file and its parent directory
    pub fn create(path: &Utf8Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create report directory: {}", parent))?;
        }

        let file = File::create(path)
            .with_context(|| format!("Failed to create report file: {}", path))?;

        tracing::info!("Writing conversion report to {}", path);

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn write_record(&mut self, record: &FileRecord<'_>) -> Result<()> {
        self.write_line(record)
    }

    /// Write the summary line and flush
    pub fn write_summary(&mut self, summary: &BatchSummary) -> Result<()> {
        self.write_line(&SummaryRecord { summary })?;
        self.writer
            .flush()
            .with_context(|| format!("Failed to flush report: {}", self.path))
    }

    fn write_line<T: Serialize>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer(&mut self.writer, value).context("Failed to serialize report record")?;
        self.writer
            .write_all(b"\n")
            .with_context(|| format!("Failed to write report: {}", self.path))
    }
}
