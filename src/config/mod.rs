use crate::models::ConverterSettings;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat};
use std::fs;

/// Prefix of environment variables that override file settings,
/// e.g. `PBITCONV_TOOL_TIMEOUT_SECS=600`
pub const ENV_PREFIX: &str = "PBITCONV";

/// Configuration manager for loading and saving the converter settings file.
///
/// Settings are layered: built-in defaults, then the YAML file (optional),
/// then `PBITCONV_*` environment variables.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Default settings file name, looked up in the working directory
    pub const DEFAULT_FILE_NAME: &'static str = "pbitconv.yaml";

    /// Create a new ConfigManager for the given settings file.
    ///
    /// The file does not need to exist.
    pub fn new<P: AsRef<Utf8Path>>(config_path: P) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
        }
    }

    /// Load and validate the settings.
    ///
    /// # Returns
    /// The layered settings, or defaults (plus environment overrides) if the file doesn't exist
    pub fn load_settings(&self) -> Result<ConverterSettings> {
        let layered = Config::builder()
            .add_source(
                File::new(self.config_path.as_str(), FileFormat::Yaml).required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read settings: {}", self.config_path))?;

        let settings: ConverterSettings = layered
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", self.config_path))?;

        let settings = settings
            .validate()
            .with_context(|| format!("Invalid settings in {}", self.config_path))?;

        Ok(settings)
    }

    /// Whether the settings file is present, i.e. contributes to [`Self::load_settings`]
    pub fn has_file(&self) -> bool {
        self.config_path.is_file()
    }

    /// One-line description of where settings came from, for logging once
    /// the subscriber is installed
    pub fn source_description(&self) -> String {
        if self.has_file() {
            format!("Loaded settings from {}", self.config_path)
        } else {
            format!("Settings file {} not found, using defaults", self.config_path)
        }
    }

    /// Save the settings file.
    ///
    /// # Arguments
    /// * `settings` - The settings to save
    pub fn save_settings(&self, settings: &ConverterSettings) -> Result<()> {
        if let Some(parent) = self.config_path.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent))?;
        }

        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.config_path))?;

        tracing::info!("Saved settings to {}", self.config_path);
        Ok(())
    }

    /// Get the settings file path.
    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(config_dir.join("pbitconv.yaml"));
        (manager, temp_dir)
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let (manager, _temp_dir) = create_test_config_manager();
        assert!(!manager.has_file());
        assert!(manager.source_description().contains("not found"));

        let settings = manager.load_settings().unwrap();
        assert_eq!(settings.source_extension, "pbix");
        assert_eq!(settings.target_extension, "pbit");
    }

    #[test]
    fn test_load_save_settings() {
        let (manager, _temp_dir) = create_test_config_manager();

        let settings = ConverterSettings {
            tool_timeout_secs: Some(900),
            clean_temp: true,
            ..Default::default()
        };
        manager.save_settings(&settings).unwrap();
        assert!(manager.has_file());
        assert!(manager.source_description().starts_with("Loaded settings from"));

        let loaded = manager.load_settings().unwrap();
        assert_eq!(loaded.tool_timeout_secs, Some(900));
        assert!(loaded.clean_temp);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(manager.config_path(), "clean_temp: true\n").unwrap();

        let loaded = manager.load_settings().unwrap();
        assert!(loaded.clean_temp);
        assert_eq!(loaded.unsupported_model_signatures.len(), 3);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(manager.config_path(), "target_extension: pbix\n").unwrap();

        assert!(manager.load_settings().is_err());
    }
}
