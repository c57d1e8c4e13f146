//! Services module - the per-file conversion machinery.
//!
//! These services are independent of the command line and of logging setup,
//! so they can be driven from tests with a fake tool runner.
//!
//! # Components
//!
//! - [`FileDiscovery`]: recursive, sorted search for reports under the input root
//! - [`mirror`]: mapping of a relative path to its temp directory and output file
//! - [`ToolRunner`]: the external-process seam; [`ProcessRunner`] spawns real tools
//!   with an optional timeout
//! - [`ConversionPipeline`]: extraction then compilation for one report, with
//!   outcome classification by [`CompileOutputClassifier`]
//! - [`CleanupManager`]: best-effort removal of temp directories after success
//!
//! # pbi-tools Integration
//!
//! Each report goes through two invocations:
//! 1. `pbi-tools extract <report.pbix> -extractFolder <temp/report>`
//! 2. `pbi-tools.core compile <temp/report> <out/report.pbit> PBIT True`
//!
//! Reports saved before the V3 model format make step 2 fail with a known
//! message; those are skipped rather than failed.
//!
//! See the [pbi-tools documentation](https://pbi.tools/cli/) for the CLI contract.

pub mod cleanup;
pub mod conversion;
pub mod discovery;
pub mod mirror;
pub mod tool;

pub use cleanup::{CleanupManager, CleanupResult};
pub use conversion::{CompileOutputClassifier, ConversionPipeline};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use mirror::{MirroredTargets, TargetOverlap};
pub use tool::{ProcessRunner, ToolError, ToolInvocation, ToolOutput, ToolRunner};
