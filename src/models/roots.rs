use crate::error::{ConfigurationError, ToolRole};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// The validated directory roots and executable locations of one batch.
///
/// Built once by [`ConversionRoots::resolve`] and read-only afterwards. All
/// paths are absolute. The output and temp roots may not exist yet; they are
/// created on demand while mirroring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRoots {
    input_root: Utf8PathBuf,
    output_root: Utf8PathBuf,
    temp_root: Utf8PathBuf,
    extract_tool: Utf8PathBuf,
    compile_tool: Utf8PathBuf,
}

impl ConversionRoots {
    /// Validate raw locations and turn them into absolute roots.
    ///
    /// Tool locations may point at the executable itself or at the directory
    /// holding it, in which case `extract_tool_name` / `compile_tool_name` is
    /// appended.
    ///
    /// # Errors
    ///
    /// - the input root is missing or not a directory
    /// - either executable is missing or not executable
    /// - a path cannot be made absolute or is not valid UTF-8
    pub fn resolve(
        input_root: &Utf8Path,
        output_root: &Utf8Path,
        temp_root: &Utf8Path,
        extract_tool: &Utf8Path,
        compile_tool: &Utf8Path,
        extract_tool_name: &str,
        compile_tool_name: &str,
    ) -> Result<Self, ConfigurationError> {
        let input_root = absolute(input_root)?;
        check_input_root(&input_root)?;

        let extract_tool = locate_tool(ToolRole::Extract, &absolute(extract_tool)?, extract_tool_name);
        let compile_tool = locate_tool(ToolRole::Compile, &absolute(compile_tool)?, compile_tool_name);

        let roots = Self {
            input_root,
            output_root: absolute(output_root)?,
            temp_root: absolute(temp_root)?,
            extract_tool,
            compile_tool,
        };
        roots.verify_tools()?;

        tracing::debug!(
            "Resolved roots - input: {}, output: {}, temp: {}",
            roots.input_root,
            roots.output_root,
            roots.temp_root
        );

        Ok(roots)
    }

    /// Re-check that both executables are still present and executable
    pub fn verify_tools(&self) -> Result<(), ConfigurationError> {
        check_tool(ToolRole::Extract, &self.extract_tool)?;
        check_tool(ToolRole::Compile, &self.compile_tool)
    }

    pub fn input_root(&self) -> &Utf8Path {
        &self.input_root
    }

    pub fn output_root(&self) -> &Utf8Path {
        &self.output_root
    }

    pub fn temp_root(&self) -> &Utf8Path {
        &self.temp_root
    }

    pub fn extract_tool(&self) -> &Utf8Path {
        &self.extract_tool
    }

    pub fn compile_tool(&self) -> &Utf8Path {
        &self.compile_tool
    }

    /// Executable path for the given stage
    pub fn tool(&self, role: ToolRole) -> &Utf8Path {
        match role {
            ToolRole::Extract => &self.extract_tool,
            ToolRole::Compile => &self.compile_tool,
        }
    }
}

/// Fail unless `path` exists and is a directory
pub(crate) fn check_input_root(path: &Utf8Path) -> Result<(), ConfigurationError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ConfigurationError::InputRootNotDirectory(path.to_path_buf())),
        Err(_) => Err(ConfigurationError::InputRootMissing(path.to_path_buf())),
    }
}

fn absolute(path: &Utf8Path) -> Result<Utf8PathBuf, ConfigurationError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    let resolved =
        std::path::absolute(path).map_err(|source| ConfigurationError::Unresolvable {
            path: path.to_path_buf(),
            source,
        })?;

    Utf8PathBuf::try_from(resolved)
        .map_err(|e| ConfigurationError::NonUtf8Path(e.into_path_buf().display().to_string()))
}

fn locate_tool(role: ToolRole, location: &Utf8Path, default_name: &str) -> Utf8PathBuf {
    if location.is_dir() {
        let candidate = location.join(default_name);
        tracing::debug!("{} location is a directory, using {}", role, candidate);
        candidate
    } else {
        location.to_path_buf()
    }
}

fn check_tool(role: ToolRole, path: &Utf8Path) -> Result<(), ConfigurationError> {
    let meta = fs::metadata(path).map_err(|_| ConfigurationError::ToolNotFound {
        role,
        path: path.to_path_buf(),
    })?;

    if !meta.is_file() || !is_executable(&meta) {
        return Err(ConfigurationError::ToolNotExecutable {
            role,
            path: path.to_path_buf(),
        });
    }

    Ok(())
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &fs::Metadata) -> bool {
    true
}
