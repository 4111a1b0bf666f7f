//! Non-fatal diagnostics raised while aggregating a run
//!
//! A dangling requirement reference or a failure record without stimuli must
//! not hide otherwise valid coverage data, so these anomalies are collected
//! here and rendered alongside the coverage numbers instead of aborting.

use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Authoring mistake that makes part of the claimed coverage meaningless
    Error,
    /// Degraded report completeness
    Warning,
    /// Informational message
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Classifier for a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    /// A test claims a requirement that is not declared
    UnknownRequirement,
    /// A test claims a feature that none of its requirements declare
    UnknownFeature,
    /// A test claims a qualified feature without claiming its requirement
    OrphanFeature,
    /// A failing event lacked stimuli or response
    MissingFailureDetail,
    /// An event's own claims disagree with the registered association
    ClaimMismatch,
    /// A test reported outcomes but claims nothing
    UntaggedTest,
    /// A streamed event record could not be decoded
    UndecodableEvent,
}

impl DiagnosticCode {
    /// Stable identifier used in reports
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::UnknownRequirement => "unknown-requirement",
            DiagnosticCode::UnknownFeature => "unknown-feature",
            DiagnosticCode::OrphanFeature => "orphan-feature",
            DiagnosticCode::MissingFailureDetail => "missing-failure-detail",
            DiagnosticCode::ClaimMismatch => "claim-mismatch",
            DiagnosticCode::UntaggedTest => "untagged-test",
            DiagnosticCode::UndecodableEvent => "undecodable-event",
        }
    }

    /// Severity a diagnostic with this code is raised at
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticCode::UnknownRequirement | DiagnosticCode::UnknownFeature => {
                Severity::Error
            },
            DiagnosticCode::OrphanFeature
            | DiagnosticCode::MissingFailureDetail
            | DiagnosticCode::ClaimMismatch
            | DiagnosticCode::UndecodableEvent => Severity::Warning,
            DiagnosticCode::UntaggedTest => Severity::Info,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Individual diagnostic item
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Classifier
    pub code:     DiagnosticCode,
    /// Human-readable message
    pub message:  String,
    /// Test the diagnostic was raised for, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test:     Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic at the default severity of `code`
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: code.severity(),
            code,
            message: message.into(),
            test: None,
        }
    }

    /// Attach the test identifier the diagnostic concerns
    pub fn with_test(mut self, test: impl Into<String>) -> Self {
        self.test = Some(test.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;
        if let Some(test) = &self.test {
            write!(f, " (test `{}`)", test)?;
        }
        Ok(())
    }
}

/// Summary statistics for a diagnostic collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticSummary {
    /// Total number of diagnostics
    pub total:    usize,
    /// Number of errors
    pub errors:   usize,
    /// Number of warnings
    pub warnings: usize,
    /// Number of info messages
    pub infos:    usize,
}

impl DiagnosticSummary {
    /// Create summary from diagnostic collection
    pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        let mut summary = Self {
            total: diagnostics.len(),
            ..Self::default()
        };

        for diagnostic in diagnostics {
            match diagnostic.severity {
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Info => summary.infos += 1,
            }
        }

        summary
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}
