use crate::error::ConfigurationError;
use crate::models::roots::check_input_root;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use walkdir::WalkDir;

/// A source report found under the input root.
///
/// The relative path is computed once here and is the mirroring key for the
/// file's whole lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DiscoveredFile {
    relative: Utf8PathBuf,
    absolute: Utf8PathBuf,
}

impl DiscoveredFile {
    /// Build from an absolute path below `root`; `None` if it is not below it
    pub fn new(root: &Utf8Path, absolute: Utf8PathBuf) -> Option<Self> {
        let relative = absolute.strip_prefix(root).ok()?.to_path_buf();
        if relative.as_str().is_empty() {
            return None;
        }
        Some(Self { relative, absolute })
    }

    pub fn absolute(&self) -> &Utf8Path {
        &self.absolute
    }

    pub fn relative(&self) -> &Utf8Path {
        &self.relative
    }

    /// File name for short log lines
    pub fn name(&self) -> &str {
        self.absolute.file_name().unwrap_or(self.absolute.as_str())
    }
}

/// Recursive, deterministic search for reports with one extension
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    root: Utf8PathBuf,
    extension: String,
}

impl FileDiscovery {
    /// Fails before yielding anything if `root` is missing or not a directory
    pub fn new(root: impl Into<Utf8PathBuf>, extension: &str) -> Result<Self, ConfigurationError> {
        let root = root.into();
        check_input_root(&root)?;

        Ok(Self {
            root,
            extension: extension.trim_start_matches('.').to_string(),
        })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Lazy walk of the root in lexicographic relative-path order.
    ///
    /// Each call starts a fresh walk. Siblings are sorted by name, so the
    /// order matches sorting the relative paths component by component.
    pub fn iter(&self) -> impl Iterator<Item = DiscoveredFile> + '_ {
        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry during discovery: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| match Utf8PathBuf::try_from(entry.into_path()) {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!(
                        "Skipping path that is not valid UTF-8: {}",
                        e.as_path().display()
                    );
                    None
                }
            })
            .filter(|path| self.matches(path))
            .filter_map(|path| DiscoveredFile::new(&self.root, path))
    }

    /// Collect the whole walk
    pub fn discover(&self) -> Vec<DiscoveredFile> {
        tracing::info!("Searching for .{} files in {}...", self.extension, self.root);
        let files: Vec<DiscoveredFile> = self.iter().collect();
        tracing::info!("Found {} files.", files.len());
        files
    }

    fn matches(&self, path: &Utf8Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree(files: &[&str]) -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        for file in files {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, b"PK").unwrap();
        }
        (temp, root)
    }

    #[test]
    fn test_discover_sorted_relative_paths() {
        let (_temp, root) = tree(&["b.pbix", "a/z.pbix", "a/b/c.pbix", "A b.pbix", "notes.txt"]);
        let discovery = FileDiscovery::new(&root, "pbix").unwrap();

        let relative: Vec<String> = discovery
            .discover()
            .iter()
            .map(|f| f.relative().as_str().replace('\\', "/"))
            .collect();

        assert_eq!(relative, vec!["A b.pbix", "a/b/c.pbix", "a/z.pbix", "b.pbix"]);
    }

    #[test]
    fn test_extension_match_ignores_case() {
        let (_temp, root) = tree(&["upper.PBIX", "lower.pbix", "other.pbit"]);
        let discovery = FileDiscovery::new(&root, ".pbix").unwrap();
        assert_eq!(discovery.discover().len(), 2);
    }

    #[test]
    fn test_iter_is_restartable() {
        let (_temp, root) = tree(&["one.pbix", "sub/two.pbix"]);
        let discovery = FileDiscovery::new(&root, "pbix").unwrap();

        let first: Vec<_> = discovery.iter().collect();
        let second: Vec<_> = discovery.iter().collect();
        assert_eq!(first, second);
        assert_eq!(first[1].absolute(), root.join("sub/two.pbix"));
        assert_eq!(first[1].name(), "two.pbix");
    }

    #[test]
    fn test_missing_root_is_configuration_error() {
        let (_temp, root) = tree(&[]);
        let result = FileDiscovery::new(root.join("nope"), "pbix");
        assert!(matches!(result, Err(ConfigurationError::InputRootMissing(_))));
    }

    #[test]
    fn test_discovered_file_outside_root() {
        assert!(DiscoveredFile::new(Utf8Path::new("/a"), Utf8PathBuf::from("/b/c.pbix")).is_none());
    }
}
