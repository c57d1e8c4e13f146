//! Error types for the converter.
//!
//! Only [`ConfigurationError`] is fatal to a batch. [`ConversionError`] is raised
//! inside a single file's conversion and is folded into that file's
//! [`ConversionOutcome`](crate::models::ConversionOutcome) at the per-file boundary.

use camino::Utf8PathBuf;
use std::fmt;
use thiserror::Error;

/// Which of the two external executables an error or invocation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolRole {
    Extract,
    Compile,
}

impl ToolRole {
    /// Human-readable stage name used in log lines ("extraction", "compilation")
    pub fn stage(&self) -> &'static str {
        match self {
            ToolRole::Extract => "extraction",
            ToolRole::Compile => "compilation",
        }
    }
}

impl fmt::Display for ToolRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolRole::Extract => write!(f, "Extraction tool"),
            ToolRole::Compile => write!(f, "Compilation tool"),
        }
    }
}

/// Fatal, batch-aborting errors detected before any file is processed
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Input root not found: {0}")]
    InputRootMissing(Utf8PathBuf),

    #[error("Input root is not a directory: {0}")]
    InputRootNotDirectory(Utf8PathBuf),

    #[error("{role} executable not found: {path}")]
    ToolNotFound { role: ToolRole, path: Utf8PathBuf },

    #[error("{role} is not an executable file: {path}")]
    ToolNotExecutable { role: ToolRole, path: Utf8PathBuf },

    #[error("Path is not valid UTF-8: {0}")]
    NonUtf8Path(String),

    #[error("Failed to resolve absolute path for {path}")]
    Unresolvable {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("{first} and {second} both map to {path}; rename or move one of them")]
    OverlappingTargets {
        first: Utf8PathBuf,
        second: Utf8PathBuf,
        path: Utf8PathBuf,
    },
}

/// Per-file errors raised while preparing mirrored paths
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Path too long for the filesystem: {path} (enable long path support)")]
    PathLength {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Filesystem error at {path}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConversionError {
    /// Path the failing filesystem operation was applied to
    pub fn path(&self) -> &Utf8PathBuf {
        match self {
            ConversionError::PathLength { path, .. } | ConversionError::Io { path, .. } => path,
        }
    }
}
