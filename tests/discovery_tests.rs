//! Integration tests for report discovery and path mirroring
//!
//! These tests verify:
//! - Recursive discovery with deterministic order
//! - Extension filtering
//! - Mirrored temp and output locations

use camino::{Utf8Path, Utf8PathBuf};
use pbitconv::services::mirror;
use pbitconv::services::{FileDiscovery, MirroredTargets};
use pbitconv::{ConfigurationError, ConversionRoots};
use std::fs;
use tempfile::TempDir;

fn create_tree(files: &[&str]) -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    for file in files {
        let path = root.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"PK").unwrap();
    }
    (temp_dir, root)
}

#[test]
fn test_discovery_order_is_lexicographic() {
    let (_temp_dir, root) = create_tree(&[
        "zeta.pbix",
        "b/2.pbix",
        "a/z.pbix",
        "a/b/c.pbix",
        "Alpha.pbix",
    ]);

    let discovery = FileDiscovery::new(root.clone(), "pbix").unwrap();
    let relative: Vec<String> = discovery
        .discover()
        .iter()
        .map(|file| file.relative().to_string())
        .collect();

    assert_eq!(
        relative,
        vec!["Alpha.pbix", "a/b/c.pbix", "a/z.pbix", "b/2.pbix", "zeta.pbix"]
    );
}

#[test]
fn test_discovery_is_repeatable() {
    let (_temp_dir, root) = create_tree(&["x/1.pbix", "x/2.pbix", "y.pbix"]);
    let discovery = FileDiscovery::new(root, "pbix").unwrap();

    assert_eq!(discovery.discover(), discovery.discover());
}

#[test]
fn test_discovery_filters_extension() {
    let (_temp_dir, root) = create_tree(&[
        "keep.pbix",
        "upper.PBIX",
        "template.pbit",
        "notes.txt",
        "pbix",
        "archive.pbix.zip",
    ]);

    let discovery = FileDiscovery::new(root, ".pbix").unwrap();
    let names: Vec<String> = discovery.iter().map(|file| file.name().to_string()).collect();

    assert_eq!(names, vec!["keep.pbix", "upper.PBIX"]);
}

#[test]
fn test_discovery_ignores_directories_named_like_reports() {
    let (_temp_dir, root) = create_tree(&["folder.pbix/inner.pbix"]);

    let files = FileDiscovery::new(root, "pbix").unwrap().discover();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].relative(), Utf8Path::new("folder.pbix/inner.pbix"));
}

#[test]
fn test_discovery_missing_root() {
    let (_temp_dir, root) = create_tree(&[]);

    let result = FileDiscovery::new(root.join("nope"), "pbix");
    assert!(matches!(result, Err(ConfigurationError::InputRootMissing(_))));
}

#[test]
fn test_targets_for_discovered_files() {
    let (_temp_dir, root) = create_tree(&["reports/A.pbix", "reports/sub/B.pbix"]);
    fs::write(root.join("tool"), b"").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(root.join("tool"), fs::Permissions::from_mode(0o755)).unwrap();
    }

    let roots = ConversionRoots::resolve(
        &root.join("reports"),
        &root.join("out"),
        &root.join("temp"),
        &root.join("tool"),
        &root.join("tool"),
        "tool",
        "tool",
    )
    .unwrap();

    let files = FileDiscovery::new(roots.input_root(), "pbix").unwrap().discover();
    let targets: Vec<MirroredTargets> = files
        .iter()
        .map(|file| MirroredTargets::for_file(file, &roots, "pbit"))
        .collect();

    assert_eq!(targets[0].output_file, root.join("out/A.pbit"));
    assert_eq!(targets[0].temp_dir, root.join("temp/A"));
    assert_eq!(targets[1].output_file, root.join("out/sub/B.pbit"));
    assert_eq!(targets[1].temp_dir, root.join("temp/sub/B"));

    // Nothing is created until conversion runs
    assert!(!root.join("out").exists());
    assert!(!root.join("temp").exists());
}

#[test]
fn test_mirror_helpers_create_directories() {
    let (_temp_dir, root) = create_tree(&[]);
    let output = mirror::output_file_for(Utf8Path::new("a/b/c/d/R.pbix"), &root, "pbit");

    mirror::ensure_parent(&output).unwrap();

    assert!(root.join("a/b/c/d").is_dir());
    assert!(!output.exists());
}
