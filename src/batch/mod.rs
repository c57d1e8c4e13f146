//! Batch orchestration.
//!
//! [`BatchOrchestrator`] drives discovery, conversion, progress tracking and
//! cleanup over every report under the input root, one file at a time:
//!
//! ```text
//! Idle -> Discovering -> Iterating -> Done
//!                         |  for each file:
//!                         |  resolve paths -> convert -> record progress -> maybe cleanup
//! ```
//!
//! A file's failure or skip never stops the batch. Only configuration errors
//! (missing input root, missing executables, colliding targets) abort, and they
//! are detected in `Discovering`, before any file is processed.
//!
//! Targets collide when two reports would write the same output file, or when
//! one report's temp directory contains another's (`a.pbix` beside
//! `a/b.pbix`). Converting such a tree would mix extractions and let one
//! file's cleanup delete the other's kept diagnostics, so the batch refuses it.
//!
//! # Cancellation
//!
//! [`BatchOrchestrator::run_until_cancelled`] takes a `watch` receiver. When it
//! flips to `true` the running tool is killed, the current file is left
//! unrecorded, and a summary marked `interrupted` is returned. Temp and output
//! trees are left as they are.

use crate::error::ConfigurationError;
use crate::models::{ConversionRoots, ConverterSettings};
use crate::progress::{BatchSummary, ProgressTracker, format_duration};
use crate::report::{FileRecord, ReportWriter};
use crate::services::mirror::find_overlaps;
use crate::services::{
    CleanupManager, CleanupResult, ConversionPipeline, DiscoveredFile, FileDiscovery,
    MirroredTargets, ToolRunner,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Lifecycle of a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Idle,
    Discovering,
    Iterating,
    Done,
}

/// Sequential driver of a whole conversion batch
pub struct BatchOrchestrator {
    roots: ConversionRoots,
    settings: ConverterSettings,
    pipeline: ConversionPipeline,
    cleanup: CleanupManager,
    report: Option<ReportWriter>,
    phase: BatchPhase,
}

impl BatchOrchestrator {
    /// Cleanup is taken from `settings.clean_temp`
    pub fn new(roots: ConversionRoots, settings: ConverterSettings, runner: Arc<dyn ToolRunner>) -> Self {
        let pipeline = ConversionPipeline::new(runner, &roots, &settings);
        let cleanup = CleanupManager::new(settings.clean_temp);

        Self {
            roots,
            settings,
            pipeline,
            cleanup,
            report: None,
            phase: BatchPhase::Idle,
        }
    }

    /// Also write a JSON-lines record per file
    pub fn with_report(mut self, report: ReportWriter) -> Self {
        self.report = Some(report);
        self
    }

    pub fn phase(&self) -> BatchPhase {
        self.phase
    }

    pub fn roots(&self) -> &ConversionRoots {
        &self.roots
    }

    /// Run every discovered file to completion
    pub async fn run(&mut self) -> Result<BatchSummary, ConfigurationError> {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.run_until_cancelled(cancel_rx).await
    }

    /// Run until done or until `cancel` becomes `true`
    pub async fn run_until_cancelled(
        &mut self,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<BatchSummary, ConfigurationError> {
        self.phase = BatchPhase::Discovering;

        let files = match self.discover() {
            Ok(files) => files,
            Err(e) => {
                tracing::error!("{}", e);
                self.phase = BatchPhase::Done;
                return Err(e);
            }
        };

        if files.is_empty() {
            tracing::warn!(
                "No .{} files found in {}",
                self.settings.source_extension,
                self.roots.input_root()
            );
        }

        self.phase = BatchPhase::Iterating;
        let total = files.len();
        let mut tracker = ProgressTracker::new(total);
        let mut interrupted = false;

        for (index, (file, targets)) in files.iter().enumerate() {
            if *cancel.borrow() {
                interrupted = true;
                break;
            }

            tracing::info!("{}", "-".repeat(70));
            tracing::info!("Processing [{}/{}]: {}", index + 1, total, file.absolute());

            let started = Instant::now();

            let outcome = tokio::select! {
                outcome = self.pipeline.convert(file, targets) => outcome,
                _ = cancelled(&mut cancel) => {
                    tracing::warn!("Interrupted while converting {}", file.relative());
                    interrupted = true;
                    break;
                }
            };

            tracker.record(file.relative(), &outcome);

            let cleanup = self.cleanup.after_outcome(&outcome, &targets.temp_dir);
            if matches!(cleanup, Some(CleanupResult::Warning(_))) {
                tracker.record_cleanup_warning();
            }

            let duration = started.elapsed();
            if let Some(report) = self.report.as_mut() {
                let record = FileRecord::new(file, targets, &outcome, duration, cleanup.as_ref());
                if let Err(e) = report.write_record(&record) {
                    tracing::warn!("Failed to write report record: {:#}", e);
                }
            }

            tracing::info!(
                "Completed {} ({}) in {}",
                file.name(),
                outcome.label(),
                format_duration(duration)
            );
            tracker.log_progress();
        }

        self.phase = BatchPhase::Done;
        let summary = tracker.into_summary(interrupted);
        summary.log();

        if let Some(report) = self.report.as_mut() {
            if let Err(e) = report.write_summary(&summary) {
                tracing::warn!("Failed to write report summary: {:#}", e);
            }
        }

        Ok(summary)
    }

    /// Check tools and input root, list the files and derive their targets
    fn discover(&self) -> Result<Vec<(DiscoveredFile, MirroredTargets)>, ConfigurationError> {
        self.roots.verify_tools()?;
        let discovery =
            FileDiscovery::new(self.roots.input_root(), &self.settings.source_extension)?;

        let files = discovery.discover();
        let targets: Vec<MirroredTargets> = files
            .iter()
            .map(|file| MirroredTargets::for_file(file, &self.roots, &self.settings.target_extension))
            .collect();

        let overlaps = find_overlaps(&targets);
        for overlap in &overlaps {
            tracing::error!(
                "{} and {} both map to {}",
                files[overlap.first].relative(),
                files[overlap.second].relative(),
                overlap.path
            );
        }
        if let Some(overlap) = overlaps.into_iter().next() {
            return Err(ConfigurationError::OverlappingTargets {
                first: files[overlap.first].relative().to_path_buf(),
                second: files[overlap.second].relative().to_path_buf(),
                path: overlap.path,
            });
        }

        Ok(files.into_iter().zip(targets).collect())
    }
}

/// Resolves once the flag is `true`; never if the sender is gone
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
