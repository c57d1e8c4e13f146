use crate::models::ConversionOutcome;
use crate::services::mirror::fs_path;
use camino::Utf8Path;
use serde::Serialize;
use std::fs;
use std::io;

/// What happened to a temp extraction directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "cleanup", content = "detail", rename_all = "snake_case")]
pub enum CleanupResult {
    Removed,
    AlreadyAbsent,
    /// Removal failed; the conversion outcome is unaffected
    Warning(String),
}

/// Best-effort removal of temp extraction directories after success
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupManager {
    enabled: bool,
}

impl CleanupManager {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Clean up only when enabled and the file converted successfully.
    ///
    /// Failed and skipped files keep their extracted content for diagnosis.
    pub fn after_outcome(&self, outcome: &ConversionOutcome, temp_dir: &Utf8Path) -> Option<CleanupResult> {
        if self.enabled && outcome.is_success() {
            Some(self.cleanup(temp_dir))
        } else {
            None
        }
    }

    /// Recursively remove `temp_dir`. Errors are downgraded to a warning.
    pub fn cleanup(&self, temp_dir: &Utf8Path) -> CleanupResult {
        match fs::remove_dir_all(fs_path(temp_dir)) {
            Ok(()) => {
                tracing::info!("Extract folder cleaned: {}", temp_dir);
                CleanupResult::Removed
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("Extract folder already absent: {}", temp_dir);
                CleanupResult::AlreadyAbsent
            }
            Err(e) => {
                tracing::warn!("Failed to clean extract folder {}: {}", temp_dir, e);
                CleanupResult::Warning(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FailureKind;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn extracted_dir() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(temp.path().join("sub/Report")).unwrap();
        fs::create_dir_all(dir.join("Model")).unwrap();
        fs::write(dir.join("Model/database.json"), "{}").unwrap();
        (temp, dir)
    }

    #[test]
    fn test_cleanup_removes_tree() {
        let (_temp, dir) = extracted_dir();
        let manager = CleanupManager::new(true);

        assert_eq!(manager.cleanup(&dir), CleanupResult::Removed);
        assert!(!dir.exists());
        assert_eq!(manager.cleanup(&dir), CleanupResult::AlreadyAbsent);
    }

    #[test]
    fn test_only_successful_outcomes_are_cleaned() {
        let (_temp, dir) = extracted_dir();
        let manager = CleanupManager::new(true);

        assert_eq!(
            manager.after_outcome(&ConversionOutcome::SkippedUnsupportedModel, &dir),
            None
        );
        assert_eq!(
            manager.after_outcome(
                &ConversionOutcome::failed(FailureKind::Compilation, "x"),
                &dir
            ),
            None
        );
        assert!(dir.exists());

        assert_eq!(
            manager.after_outcome(&ConversionOutcome::Succeeded, &dir),
            Some(CleanupResult::Removed)
        );
    }

    #[test]
    fn test_disabled_manager_keeps_directory() {
        let (_temp, dir) = extracted_dir();
        let manager = CleanupManager::default();

        assert!(!manager.is_enabled());
        assert_eq!(manager.after_outcome(&ConversionOutcome::Succeeded, &dir), None);
        assert!(dir.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_removal_failure_is_warning() {
        use std::os::unix::fs::PermissionsExt;

        let (_temp, dir) = extracted_dir();
        let parent = dir.parent().unwrap().to_path_buf();
        fs::set_permissions(&parent, fs::Permissions::from_mode(0o555)).unwrap();

        let result = CleanupManager::new(true).cleanup(&dir);
        fs::set_permissions(&parent, fs::Permissions::from_mode(0o755)).unwrap();

        // root ignores directory permissions, so removal may still succeed there
        assert!(matches!(
            result,
            CleanupResult::Warning(_) | CleanupResult::Removed
        ));
    }
}
