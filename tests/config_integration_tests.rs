//! Integration tests for ConfigManager and settings file handling
//!
//! These tests verify:
//! - Defaults when no settings file exists
//! - Loading and saving the YAML file
//! - Validation of loaded settings
//! - Command line overrides on top of the file

use camino::Utf8PathBuf;
use clap::Parser;
use pbitconv::cli::Cli;
use pbitconv::{ConfigManager, ConverterSettings};
use std::fs;
use tempfile::TempDir;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_dir)
}

#[test]
fn test_config_path() {
    let (_temp_dir, config_dir) = create_test_config_dir();
    let manager = ConfigManager::new(config_dir.join("pbitconv.yaml"));

    assert_eq!(manager.config_path(), config_dir.join("pbitconv.yaml"));
}

#[test]
fn test_load_defaults_without_file() {
    let (_temp_dir, config_dir) = create_test_config_dir();
    let manager = ConfigManager::new(config_dir.join("missing.yaml"));

    let settings = manager.load_settings().unwrap();

    assert_eq!(settings, ConverterSettings::default().validate().unwrap());
}

#[test]
fn test_save_creates_parent_directories() {
    let (_temp_dir, config_dir) = create_test_config_dir();
    let manager = ConfigManager::new(config_dir.join("nested/dir/pbitconv.yaml"));

    manager.save_settings(&ConverterSettings::default()).unwrap();

    assert!(manager.config_path().is_file());
    let content = fs::read_to_string(manager.config_path()).unwrap();
    assert!(content.contains("target_extension: pbit"));
    assert!(content.contains("Model required: V3"));
}

#[test]
fn test_custom_signatures_and_extensions() {
    let (_temp_dir, config_dir) = create_test_config_dir();
    let manager = ConfigManager::new(config_dir.join("pbitconv.yaml"));

    let yaml = r#"
source_extension: ".PBIX"
target_extension: pbit
unsupported_model_signatures:
  - "Unsupported model version"
tool_timeout_secs: 120
"#;
    fs::write(manager.config_path(), yaml).unwrap();

    let settings = manager.load_settings().unwrap();

    assert_eq!(settings.source_extension, "PBIX");
    assert_eq!(
        settings.unsupported_model_signatures,
        vec!["Unsupported model version".to_string()]
    );
    assert_eq!(settings.tool_timeout_secs, Some(120));
}

#[test]
fn test_malformed_yaml_rejected() {
    let (_temp_dir, config_dir) = create_test_config_dir();
    let manager = ConfigManager::new(config_dir.join("pbitconv.yaml"));
    fs::write(manager.config_path(), "clean_temp: [unclosed\n").unwrap();

    assert!(manager.load_settings().is_err());
}

#[test]
fn test_zero_timeout_rejected() {
    let (_temp_dir, config_dir) = create_test_config_dir();
    let manager = ConfigManager::new(config_dir.join("pbitconv.yaml"));
    fs::write(manager.config_path(), "tool_timeout_secs: 0\n").unwrap();

    assert!(manager.load_settings().is_err());
}

#[test]
fn test_cli_overrides_file() {
    let (_temp_dir, config_dir) = create_test_config_dir();
    let config_path = config_dir.join("pbitconv.yaml");
    fs::write(&config_path, "tool_timeout_secs: 60\nclean_temp: false\n").unwrap();

    let cli = Cli::try_parse_from([
        "pbitconv",
        "-r",
        "in",
        "-o",
        "out",
        "-t",
        "temp",
        "--cli-path",
        "pbi-tools",
        "--core-path",
        "pbi-tools.core",
        "--clean",
        "--timeout",
        "300",
        "-c",
        config_path.as_str(),
    ])
    .unwrap();

    let mut settings = ConfigManager::new(&cli.config).load_settings().unwrap();
    cli.apply_to(&mut settings);

    assert!(settings.clean_temp);
    assert_eq!(settings.tool_timeout_secs, Some(300));
}
