//! pbitconv - batch-convert Power BI reports into templates
//!
//! Main entry point for the command line application.
//!
//! # Execution Flow
//!
//! 1. Parse flags, load `pbitconv.yaml` + `PBITCONV_*` overrides
//! 2. Initialize logging (console, optional rotating file)
//! 3. Resolve and validate roots and pbi-tools locations
//! 4. Run the batch on a tokio runtime, racing Ctrl+C
//! 5. Exit 0 on completion, 1 on configuration errors, 130 when interrupted

use anyhow::{Context, Result};
use camino::Utf8Path;
use clap::Parser;
use pbitconv::cli::Cli;
use pbitconv::report::ReportWriter;
use pbitconv::services::ProcessRunner;
use pbitconv::{
    APP_NAME, BatchOrchestrator, BatchSummary, ConfigManager, ConversionRoots, ConverterSettings,
    VERSION,
};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

const EXIT_CONFIGURATION: u8 = 1;
const EXIT_INTERRUPTED: u8 = 130;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config_manager = ConfigManager::new(&cli.config);

    // Logging depends on settings, so this runs before any subscriber exists
    let settings = match load_settings(&cli, &config_manager) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(EXIT_CONFIGURATION);
        }
    };

    // Held until exit so buffered file logs are flushed
    let _log_guard = match pbitconv::logging::setup_logging(
        settings.debug_mode,
        settings.log_dir.as_deref().map(Utf8Path::new),
        APP_NAME,
    ) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(EXIT_CONFIGURATION);
        }
    };

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    tracing::debug!("{}", config_manager.source_description());

    match run(&cli, settings) {
        Ok(summary) if summary.interrupted => ExitCode::from(EXIT_INTERRUPTED),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(EXIT_CONFIGURATION)
        }
    }
}

fn load_settings(cli: &Cli, config_manager: &ConfigManager) -> Result<ConverterSettings> {
    let mut settings = config_manager.load_settings()?;
    cli.apply_to(&mut settings);
    settings.validate().context("Invalid command line settings")
}

fn run(cli: &Cli, settings: ConverterSettings) -> Result<BatchSummary> {
    let roots = ConversionRoots::resolve(
        &cli.report_folder,
        &cli.pbit_output,
        &cli.temp_folder,
        &cli.cli_path,
        &cli.core_path,
        &settings.extract_tool_name,
        &settings.compile_tool_name,
    )?;

    tracing::info!("Extraction tool: {}", roots.extract_tool());
    tracing::info!("Compilation tool: {}", roots.compile_tool());
    if settings.clean_temp {
        tracing::info!("Extract folders will be removed after successful conversions");
    }

    let runner = ProcessRunner::new().with_timeout(settings.tool_timeout_secs.map(Duration::from_secs));
    let mut orchestrator = BatchOrchestrator::new(roots, settings, Arc::new(runner));
    if let Some(path) = &cli.report {
        orchestrator = orchestrator.with_report(ReportWriter::create(path)?);
    }

    // Conversions run one at a time; a single-threaded runtime is enough
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    runtime.block_on(async move {
        let (cancel_tx, cancel_rx) = watch::channel(false);

        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received - stopping after killing the running tool");
                let _ = cancel_tx.send(true);
            }
        });

        let summary = orchestrator.run_until_cancelled(cancel_rx).await?;
        Ok(summary)
    })
}
