//! Data models for the converter.
//!
//! - [`ConverterSettings`]: tunables loaded from `pbitconv.yaml` / `PBITCONV_*` variables
//! - [`ConversionRoots`]: validated input/output/temp roots and tool locations for one batch
//! - [`ConversionOutcome`]: the classified result of converting one report
//!
//! Roots and settings are built once before a batch starts and only read afterwards.

pub mod config;
pub mod outcome;
pub mod roots;

pub use config::ConverterSettings;
pub use outcome::{ConversionOutcome, FailureKind, FailureReason};
pub use roots::ConversionRoots;
