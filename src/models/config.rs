use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Converter settings loaded from `pbitconv.yaml` and `PBITCONV_*` environment variables.
///
/// Every field has a default, so an absent file yields a usable configuration.
/// Command-line flags are applied on top by [`crate::cli::Cli::apply_to`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterSettings {
    /// Extension of the reports to discover (without the dot)
    pub source_extension: String,

    /// Extension given to compiled output files (without the dot)
    pub target_extension: String,

    /// Substrings in the compilation tool's output that mark an unsupported model.
    ///
    /// Matching is exact and case-sensitive. If the tool rewords its message the
    /// file is reported as a generic compilation failure instead of a skip.
    pub unsupported_model_signatures: Vec<String>,

    /// Upper bound on each external tool invocation, in seconds. `None` waits forever.
    pub tool_timeout_secs: Option<u64>,

    /// Remove the temp extraction directory after a successful conversion
    pub clean_temp: bool,

    /// Binary name appended when the extraction tool location is a directory
    pub extract_tool_name: String,

    /// Binary name appended when the compilation tool location is a directory
    pub compile_tool_name: String,

    pub debug_mode: bool,

    /// Directory for rotating log files; console only when unset
    pub log_dir: Option<String>,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            source_extension: "pbix".to_string(),
            target_extension: "pbit".to_string(),
            unsupported_model_signatures: default_unsupported_model_signatures(),
            tool_timeout_secs: None,
            clean_temp: false,
            extract_tool_name: default_tool_name("pbi-tools"),
            compile_tool_name: default_tool_name("pbi-tools.core"),
            debug_mode: false,
            log_dir: None,
        }
    }
}

impl ConverterSettings {
    /// Check invariants and strip leading dots from the extensions.
    pub fn validate(mut self) -> Result<Self, ConfigurationError> {
        self.source_extension = self.source_extension.trim().trim_start_matches('.').to_string();
        self.target_extension = self.target_extension.trim().trim_start_matches('.').to_string();

        if self.source_extension.is_empty() || self.target_extension.is_empty() {
            return Err(ConfigurationError::InvalidSetting(
                "source and target extensions must not be empty".to_string(),
            ));
        }

        if self
            .source_extension
            .eq_ignore_ascii_case(&self.target_extension)
        {
            return Err(ConfigurationError::InvalidSetting(format!(
                "target extension must differ from source extension ({})",
                self.source_extension
            )));
        }

        self.unsupported_model_signatures
            .retain(|signature| !signature.is_empty());
        if self.unsupported_model_signatures.is_empty() {
            return Err(ConfigurationError::InvalidSetting(
                "at least one unsupported model signature is required".to_string(),
            ));
        }

        if self.tool_timeout_secs == Some(0) {
            return Err(ConfigurationError::InvalidSetting(
                "tool timeout must be at least one second".to_string(),
            ));
        }

        Ok(self)
    }

    /// Format name passed to the compilation tool, e.g. `PBIT`
    pub fn compile_format(&self) -> String {
        self.target_extension.to_uppercase()
    }
}

/// Messages pbi-tools prints for reports that predate the V3 model format
fn default_unsupported_model_signatures() -> Vec<String> {
    vec![
        "could not be deserialized".to_string(),
        "does not contain a V3 model".to_string(),
        "Model required: V3".to_string(),
    ]
}

fn default_tool_name(stem: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", stem)
    } else {
        stem.to_string()
    }
}
