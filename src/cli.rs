//! Command line definition.
//!
//! Flags that also exist as settings override the values loaded from the
//! settings file and environment.

use crate::config::ConfigManager;
use crate::models::ConverterSettings;
use camino::Utf8PathBuf;
use clap::Parser;

/// Batch-convert Power BI reports (.pbix) into templates (.pbit) with pbi-tools
#[derive(Parser, Debug)]
#[command(name = "pbitconv", version, about)]
pub struct Cli {
    /// Folder searched recursively for .pbix reports
    #[arg(short = 'r', long)]
    pub report_folder: Utf8PathBuf,

    /// Folder receiving the compiled .pbit files (mirrors the report folder)
    #[arg(short = 'o', long)]
    pub pbit_output: Utf8PathBuf,

    /// Folder for intermediate extracted report trees
    #[arg(short = 't', long)]
    pub temp_folder: Utf8PathBuf,

    /// pbi-tools executable (or its folder), used for extraction
    #[arg(long)]
    pub cli_path: Utf8PathBuf,

    /// pbi-tools.core executable (or its folder), used for compilation
    #[arg(long)]
    pub core_path: Utf8PathBuf,

    /// Remove each extract folder after a successful conversion
    #[arg(long, default_value_t = false)]
    pub clean: bool,

    /// Settings file (YAML); missing file means defaults
    #[arg(short, long, default_value = ConfigManager::DEFAULT_FILE_NAME)]
    pub config: Utf8PathBuf,

    /// Kill a pbi-tools invocation after this many seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Write a JSON-lines record per file to this path
    #[arg(long, value_name = "FILE")]
    pub report: Option<Utf8PathBuf>,

    /// Also write daily rotating log files into this folder
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<Utf8PathBuf>,

    /// Verbose logging
    #[arg(short, long, default_value_t = false)]
    pub debug: bool,
}

impl Cli {
    /// Apply command line overrides on top of loaded settings.
    ///
    /// Boolean flags only ever switch a setting on.
    pub fn apply_to(&self, settings: &mut ConverterSettings) {
        if self.clean {
            settings.clean_temp = true;
        }
        if self.debug {
            settings.debug_mode = true;
        }
        if let Some(timeout) = self.timeout {
            settings.tool_timeout_secs = Some(timeout);
        }
        if let Some(dir) = &self.log_dir {
            settings.log_dir = Some(dir.to_string());
        }
    }
}
