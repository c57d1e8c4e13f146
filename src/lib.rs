// pbitconv - batch conversion of Power BI reports into templates
//
// This is the library crate containing discovery, the two-stage pbi-tools
// pipeline, progress tracking and cleanup. The binary crate (main.rs) provides
// the command line entry point.

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod progress;
pub mod report;
pub mod services;

// Re-export commonly used types for convenience
pub use batch::{BatchOrchestrator, BatchPhase};
pub use config::ConfigManager;
pub use error::{ConfigurationError, ConversionError, ToolRole};
pub use models::{ConversionOutcome, ConversionRoots, ConverterSettings, FailureKind, FailureReason};
pub use progress::{BatchStats, BatchSummary, ProgressTracker};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
