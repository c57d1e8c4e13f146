use serde::Serialize;
use std::fmt;

/// Result of converting one discovered report.
///
/// Produced exactly once per file by the conversion pipeline and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionOutcome {
    /// Both stages succeeded and the output file exists
    Succeeded,
    /// The compilation tool declined the report's model version
    SkippedUnsupportedModel,
    /// Any other failure, with enough captured output to diagnose it
    Failed(FailureReason),
}

impl ConversionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ConversionOutcome::Succeeded)
    }

    /// Short label for logs and reports
    pub fn label(&self) -> &'static str {
        match self {
            ConversionOutcome::Succeeded => "succeeded",
            ConversionOutcome::SkippedUnsupportedModel => "skipped",
            ConversionOutcome::Failed(_) => "failed",
        }
    }

    /// Failure helper used by the pipeline
    pub fn failed(kind: FailureKind, detail: impl Into<String>) -> Self {
        ConversionOutcome::Failed(FailureReason {
            kind,
            detail: detail.into(),
        })
    }
}

/// Where a failed conversion went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Stage 1 exited non-zero, could not be launched, or timed out
    Extraction,
    /// Stage 2 failed without the unsupported-model signature
    Compilation,
    /// The OS rejected a path as too long
    PathLength,
    /// Any other filesystem error while preparing mirrored paths
    Filesystem,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FailureKind::Extraction => "extraction",
            FailureKind::Compilation => "compilation",
            FailureKind::PathLength => "path length",
            FailureKind::Filesystem => "filesystem",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReason {
    pub kind: FailureKind,
    pub detail: String,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.kind, self.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(ConversionOutcome::Succeeded.label(), "succeeded");
        assert_eq!(ConversionOutcome::SkippedUnsupportedModel.label(), "skipped");
        assert_eq!(
            ConversionOutcome::failed(FailureKind::Extraction, "exit code 1").label(),
            "failed"
        );
        assert!(ConversionOutcome::Succeeded.is_success());
        assert!(!ConversionOutcome::SkippedUnsupportedModel.is_success());
    }

    #[test]
    fn test_failure_reason_display() {
        let reason = FailureReason {
            kind: FailureKind::PathLength,
            detail: "C:/deep/path".to_string(),
        };
        assert_eq!(reason.to_string(), "path length failed: C:/deep/path");
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(ConversionOutcome::failed(
            FailureKind::Compilation,
            "boom",
        ))
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "compilation");
        assert_eq!(json["detail"], "boom");

        let json = serde_json::to_value(ConversionOutcome::SkippedUnsupportedModel).unwrap();
        assert_eq!(json["status"], "skipped_unsupported_model");
    }
}
