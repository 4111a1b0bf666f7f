//! Error types for the coverage engine
//!
//! Only structural problems are errors. Per-event anomalies (dangling
//! references, missing failure detail) are [`crate::diagnostics`] entries
//! and never abort a run.

use std::path::{
    Path,
    PathBuf,
};

use thiserror::Error;

/// Errors raised by the coverage engine
#[derive(Debug, Error)]
pub enum ReqcovError {
    /// The requirement specification could not be loaded
    #[error("malformed specification: {reason}")]
    MalformedSpecification {
        /// What is wrong with the source
        reason: String,
    },

    /// A test was associated twice with conflicting claim sets
    #[error("duplicate association for test `{test_id}`: {detail}")]
    DuplicateAssociation {
        /// The offending test identifier
        test_id: String,
        /// How the second association differs from the first
        detail:  String,
    },

    /// Reading or writing a file failed
    #[error("failed to access {}: {source}", path.display())]
    Io {
        /// File that could not be accessed
        path:   PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A machine-readable report could not be decoded
    #[error("failed to parse coverage report: {0}")]
    ReportParse(#[source] serde_json::Error),

    /// A configuration file is invalid
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ReqcovError {
    /// Shorthand for [`ReqcovError::MalformedSpecification`]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedSpecification {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`ReqcovError::Io`]
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether this error stops a run before any test executes
    pub fn is_load_time(&self) -> bool {
        matches!(
            self,
            Self::MalformedSpecification { .. } | Self::DuplicateAssociation { .. }
        )
    }
}

/// Result alias used throughout the crate
pub type ReqcovResult<T> = Result<T, ReqcovError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReqcovError::malformed("requirement `REQ-1` has no description");
        assert_eq!(
            err.to_string(),
            "malformed specification: requirement `REQ-1` has no description"
        );
        assert!(err.is_load_time());

        let err = ReqcovError::io(
            Path::new("missing.json"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.to_string().contains("missing.json"));
        assert!(!err.is_load_time());
    }
}
