use crate::error::{ConversionError, ToolRole};
use crate::models::{ConversionOutcome, ConversionRoots, ConverterSettings, FailureKind};
use crate::services::discovery::DiscoveredFile;
use crate::services::mirror::{self, MirroredTargets};
use crate::services::tool::{ToolError, ToolInvocation, ToolOutput, ToolRunner};
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::sync::Arc;

/// Number of trailing output lines kept in a failure reason
const EXCERPT_LINES: usize = 40;

/// Marker .NET tools print when a path exceeds the platform limit
const PATH_TOO_LONG_MARKER: &str = "PathTooLongException";

/// Text classification of the compilation tool's output.
///
/// Kept apart from the pipeline so the matching rules can change without
/// touching orchestration.
///
/// # Fields
///
/// - `signatures`: exact, case-sensitive substrings that mark an unsupported model
///   - Example match: "Model could not be deserialized" (pre-V3 report)
/// - `written_pattern`: pulls the output path out of the tool's success line
///   - Pattern: `(?i)PBIT file written to: (.*)`
///   - Example match: "PBIT file written to: C:\out\Sales.pbit"
#[derive(Debug, Clone)]
pub struct CompileOutputClassifier {
    signatures: Vec<String>,
    written_pattern: Regex,
}

impl CompileOutputClassifier {
    pub fn new(signatures: Vec<String>) -> Self {
        Self {
            signatures,
            written_pattern: Regex::new(r"(?i)PBIT file written to:\s*(.*)")
                .expect("Invalid written-path regex"),
        }
    }

    /// True if any configured signature occurs verbatim in `text`
    pub fn is_unsupported_model(&self, text: &str) -> bool {
        self.signatures
            .iter()
            .any(|signature| text.contains(signature.as_str()))
    }

    /// Output path the tool reports having written, if it printed one
    pub fn written_path(&self, stdout: &str) -> Option<String> {
        self.written_pattern
            .captures(stdout)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|path| !path.is_empty())
    }

    /// True if the tool reports a .NET path-length exception
    pub fn is_path_too_long(&self, text: &str) -> bool {
        text.contains(PATH_TOO_LONG_MARKER)
    }
}

/// Converts one report: extraction into the temp mirror, then compilation
/// into the output mirror.
///
/// Invocation shapes follow pbi-tools' CLI:
/// - `<extract-tool> extract <source> -extractFolder <tempDir>`
/// - `<compile-tool> compile <tempDir> <outputFile> <FORMAT> True`
pub struct ConversionPipeline {
    runner: Arc<dyn ToolRunner>,
    extract_tool: Utf8PathBuf,
    compile_tool: Utf8PathBuf,
    compile_format: String,
    classifier: CompileOutputClassifier,
}

impl ConversionPipeline {
    pub fn new(
        runner: Arc<dyn ToolRunner>,
        roots: &ConversionRoots,
        settings: &ConverterSettings,
    ) -> Self {
        Self {
            runner,
            extract_tool: roots.extract_tool().to_path_buf(),
            compile_tool: roots.compile_tool().to_path_buf(),
            compile_format: settings.compile_format(),
            classifier: CompileOutputClassifier::new(
                settings.unsupported_model_signatures.clone(),
            ),
        }
    }

    pub fn classifier(&self) -> &CompileOutputClassifier {
        &self.classifier
    }

    pub fn extract_invocation(&self, source: &Utf8Path, temp_dir: &Utf8Path) -> ToolInvocation {
        ToolInvocation::new(
            self.extract_tool.clone(),
            ["extract", source.as_str(), "-extractFolder", temp_dir.as_str()],
        )
    }

    pub fn compile_invocation(&self, temp_dir: &Utf8Path, output_file: &Utf8Path) -> ToolInvocation {
        ToolInvocation::new(
            self.compile_tool.clone(),
            [
                "compile",
                temp_dir.as_str(),
                output_file.as_str(),
                self.compile_format.as_str(),
                "True",
            ],
        )
    }

    /// Run both stages for `file` and classify the result.
    ///
    /// Never returns an error: every failure becomes a [`ConversionOutcome`].
    /// Extracted files are left in `targets.temp_dir` whatever the outcome.
    /// Leftovers of an earlier run at either target are removed first, so a
    /// success always refers to files written by this call.
    pub async fn convert(&self, file: &DiscoveredFile, targets: &MirroredTargets) -> ConversionOutcome {
        if let Err(e) = mirror::reset_dir(&targets.temp_dir) {
            return mirror_failure(file, e);
        }

        if let Some(outcome) = self.extract(file, &targets.temp_dir).await {
            return outcome;
        }

        if let Err(e) = mirror::ensure_parent(&targets.output_file) {
            return mirror_failure(file, e);
        }

        if let Err(e) = mirror::remove_stale_file(&targets.output_file) {
            return mirror_failure(file, e);
        }

        self.compile(file, targets).await
    }

    /// Stage 1. `None` means extraction succeeded
    async fn extract(&self, file: &DiscoveredFile, temp_dir: &Utf8Path) -> Option<ConversionOutcome> {
        let invocation = self.extract_invocation(file.absolute(), temp_dir);
        tracing::info!("Extracting {} -> {}", file.relative(), temp_dir);

        match self.runner.run(&invocation).await {
            Ok(output) if output.success() => {
                tracing::debug!("Extraction output for {}:\n{}", file.name(), output.combined());
                None
            }
            Ok(output) => {
                let kind = if self.classifier.is_path_too_long(&output.combined()) {
                    FailureKind::PathLength
                } else {
                    FailureKind::Extraction
                };
                Some(self.tool_failure(file, ToolRole::Extract, kind, &invocation, &output))
            }
            Err(e) => Some(launch_failure(file, ToolRole::Extract, &invocation, e)),
        }
    }

    /// Stage 2
    async fn compile(&self, file: &DiscoveredFile, targets: &MirroredTargets) -> ConversionOutcome {
        let invocation = self.compile_invocation(&targets.temp_dir, &targets.output_file);
        tracing::info!("Compiling {} -> {}", targets.temp_dir, targets.output_file);

        let output = match self.runner.run(&invocation).await {
            Ok(output) => output,
            Err(e) => return launch_failure(file, ToolRole::Compile, &invocation, e),
        };

        let combined = output.combined();

        if output.success() && output_exists(&targets.output_file) {
            match self.classifier.written_path(&output.stdout) {
                Some(reported) => tracing::info!("Output: {}", reported),
                None => tracing::info!("Output: {}", targets.output_file),
            }
            return ConversionOutcome::Succeeded;
        }

        if self.classifier.is_unsupported_model(&combined) {
            tracing::warn!(
                "Skipping {}: file model is not supported. Model required: V3",
                file.relative()
            );
            tracing::debug!("Compilation output for {}:\n{}", file.name(), combined);
            return ConversionOutcome::SkippedUnsupportedModel;
        }

        if output.success() {
            tracing::error!(
                "No {} file generated for {} (expected {})",
                self.compile_format,
                file.relative(),
                targets.output_file
            );
            return ConversionOutcome::failed(
                FailureKind::Compilation,
                format!(
                    "tool reported success but {} was not written\n{}",
                    targets.output_file,
                    excerpt(&combined, EXCERPT_LINES)
                ),
            );
        }

        let kind = if self.classifier.is_path_too_long(&combined) {
            FailureKind::PathLength
        } else {
            FailureKind::Compilation
        };
        self.tool_failure(file, ToolRole::Compile, kind, &invocation, &output)
    }

    fn tool_failure(
        &self,
        file: &DiscoveredFile,
        role: ToolRole,
        kind: FailureKind,
        invocation: &ToolInvocation,
        output: &ToolOutput,
    ) -> ConversionOutcome {
        let captured = excerpt(&output.combined(), EXCERPT_LINES);

        tracing::error!(
            "{} of {} failed with {}",
            role.stage(),
            file.relative(),
            output.exit_description()
        );
        if kind == FailureKind::PathLength {
            tracing::error!("Path too long for {}; enable long path support and retry", file.relative());
        }
        tracing::error!("Command: {}\n{}", invocation.command_line(), captured);

        ConversionOutcome::failed(
            kind,
            format!("{} exited with {}\n{}", role.stage(), output.exit_description(), captured),
        )
    }
}

fn launch_failure(
    file: &DiscoveredFile,
    role: ToolRole,
    invocation: &ToolInvocation,
    error: ToolError,
) -> ConversionOutcome {
    tracing::error!(
        "{} of {} could not complete: {}\nCommand: {}",
        role.stage(),
        file.relative(),
        error,
        invocation.command_line()
    );

    let kind = match role {
        ToolRole::Extract => FailureKind::Extraction,
        ToolRole::Compile => FailureKind::Compilation,
    };
    ConversionOutcome::failed(kind, error.to_string())
}

fn mirror_failure(file: &DiscoveredFile, error: ConversionError) -> ConversionOutcome {
    tracing::error!("Cannot prepare paths for {}: {}", file.relative(), error);

    match error {
        ConversionError::PathLength { path, .. } => {
            ConversionOutcome::failed(FailureKind::PathLength, path.to_string())
        }
        ConversionError::Io { path, source } => {
            ConversionOutcome::failed(FailureKind::Filesystem, format!("{}: {}", path, source))
        }
    }
}

/// A regular, non-empty file
fn output_exists(path: &Utf8Path) -> bool {
    std::fs::metadata(mirror::fs_path(path)).is_ok_and(|meta| meta.is_file() && meta.len() > 0)
}

/// Last `max_lines` lines of `text`
pub fn excerpt(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= max_lines {
        return text.to_string();
    }
    let omitted = lines.len() - max_lines;
    format!(
        "... ({} lines omitted)\n{}",
        omitted,
        lines[omitted..].join("\n")
    )
}
