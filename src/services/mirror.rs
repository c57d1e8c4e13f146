//! Mirroring of a report's relative path under the temp and output roots.
//!
//! `reports/sub/B.pbix` discovered under `reports/` maps to `<temp>/sub/B/` for
//! extraction and `<output>/sub/B.pbit` for the compiled template. Paths are pure
//! functions of the relative path; only [`ensure_dir`] and [`ensure_parent`]
//! touch the filesystem.

use crate::error::ConversionError;
use crate::models::ConversionRoots;
use crate::services::discovery::DiscoveredFile;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::PathBuf;

/// Derived target locations of one discovered file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirroredTargets {
    /// Directory the extraction stage writes into
    pub temp_dir: Utf8PathBuf,
    /// File the compilation stage produces
    pub output_file: Utf8PathBuf,
}

impl MirroredTargets {
    pub fn for_file(file: &DiscoveredFile, roots: &ConversionRoots, target_extension: &str) -> Self {
        Self {
            temp_dir: temp_dir_for(file.relative(), roots.temp_root()),
            output_file: output_file_for(file.relative(), roots.output_root(), target_extension),
        }
    }
}

/// Two files of one batch whose targets collide.
///
/// `first` and `second` index the slice passed to [`find_overlaps`], `first < second`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOverlap {
    pub first: usize,
    pub second: usize,
    /// Output file both would write, or the temp directory one would extract
    /// into and the other would remove on cleanup
    pub path: Utf8PathBuf,
}

/// Pairs of targets sharing an output file, or where one temp directory is
/// the same as or an ancestor of another.
///
/// `a.pbix` next to `a/b.pbix` gives `temp/a` and `temp/a/b`; `A.pbix` next to
/// `A.PBIX` on a case-sensitive filesystem gives identical targets.
pub fn find_overlaps(targets: &[MirroredTargets]) -> Vec<TargetOverlap> {
    let mut outputs: HashMap<&Utf8Path, usize> = HashMap::new();
    let mut temps: HashMap<&Utf8Path, usize> = HashMap::new();
    let mut pairs: BTreeMap<(usize, usize), Utf8PathBuf> = BTreeMap::new();

    for (index, target) in targets.iter().enumerate() {
        if let Some(&first) = outputs.get(target.output_file.as_path()) {
            pairs
                .entry((first, index))
                .or_insert_with(|| target.output_file.clone());
        } else {
            outputs.insert(&target.output_file, index);
        }

        if let Some(&first) = temps.get(target.temp_dir.as_path()) {
            pairs
                .entry((first, index))
                .or_insert_with(|| target.temp_dir.clone());
        } else {
            temps.insert(&target.temp_dir, index);
        }
    }

    for (index, target) in targets.iter().enumerate() {
        for ancestor in target.temp_dir.ancestors().skip(1) {
            if let Some(&owner) = temps.get(ancestor) {
                let key = (owner.min(index), owner.max(index));
                pairs.entry(key).or_insert_with(|| ancestor.to_path_buf());
            }
        }
    }

    pairs
        .into_iter()
        .map(|((first, second), path)| TargetOverlap {
            first,
            second,
            path,
        })
        .collect()
}

/// Join `root` and `relative`, keeping every intermediate directory
pub fn mirror(relative: &Utf8Path, root: &Utf8Path) -> Utf8PathBuf {
    root.join(relative)
}

/// Temp extraction directory: relative path with its extension stripped
pub fn temp_dir_for(relative: &Utf8Path, temp_root: &Utf8Path) -> Utf8PathBuf {
    mirror(&relative.with_extension(""), temp_root)
}

/// Output file: relative path with its extension replaced
pub fn output_file_for(relative: &Utf8Path, output_root: &Utf8Path, extension: &str) -> Utf8PathBuf {
    mirror(&relative.with_extension(extension), output_root)
}

/// Create `dir` and all missing parents; succeeds if it already exists
pub fn ensure_dir(dir: &Utf8Path) -> Result<(), ConversionError> {
    std::fs::create_dir_all(fs_path(dir)).map_err(|source| classify_io(dir, source))
}

/// Create the parent directory of `file`
pub fn ensure_parent(file: &Utf8Path) -> Result<(), ConversionError> {
    match file.parent() {
        Some(parent) if !parent.as_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Empty `dir` for a fresh extraction: drop whatever a previous run left, then recreate it
pub fn reset_dir(dir: &Utf8Path) -> Result<(), ConversionError> {
    match std::fs::remove_dir_all(fs_path(dir)) {
        Ok(()) => tracing::debug!("Removed previous extraction at {}", dir),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(classify_io(dir, e)),
    }
    ensure_dir(dir)
}

/// Delete an output `file` left by a previous run; absent is fine
pub fn remove_stale_file(file: &Utf8Path) -> Result<(), ConversionError> {
    match std::fs::remove_file(fs_path(file)) {
        Ok(()) => {
            tracing::debug!("Removed previous output {}", file);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(classify_io(file, e)),
    }
}

/// Map an I/O error to a path-length failure when the OS rejected the length
pub fn classify_io(path: &Utf8Path, source: io::Error) -> ConversionError {
    if is_path_length_error(&source) {
        ConversionError::PathLength {
            path: path.to_path_buf(),
            source,
        }
    } else {
        ConversionError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// True for ENAMETOOLONG / ERROR_FILENAME_EXCED_RANGE
pub fn is_path_length_error(err: &io::Error) -> bool {
    #[cfg(windows)]
    const CODES: &[i32] = &[206];
    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd"
    ))]
    const CODES: &[i32] = &[63];
    #[cfg(not(any(
        windows,
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd"
    )))]
    const CODES: &[i32] = &[36];

    err.raw_os_error().is_some_and(|code| CODES.contains(&code))
}

/// Path handed to filesystem calls.
///
/// Windows rejects absolute paths past MAX_PATH unless they use the
/// extended-length `\\?\` form.
#[cfg(windows)]
pub(crate) fn fs_path(path: &Utf8Path) -> PathBuf {
    const MAX_PATH_MARGIN: usize = 248;
    let raw = path.as_str();

    if raw.len() < MAX_PATH_MARGIN || raw.starts_with(r"\\?\") || !path.is_absolute() {
        return path.as_std_path().to_path_buf();
    }

    let raw = raw.replace('/', "\\");
    match raw.strip_prefix(r"\\") {
        Some(unc) => PathBuf::from(format!(r"\\?\UNC\{}", unc)),
        None => PathBuf::from(format!(r"\\?\{}", raw)),
    }
}

#[cfg(not(windows))]
pub(crate) fn fs_path(path: &Utf8Path) -> PathBuf {
    path.as_std_path().to_path_buf()
}
