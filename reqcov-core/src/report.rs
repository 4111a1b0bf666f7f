//! Machine-readable coverage report document model

use std::path::Path;

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    aggregate::CoverageSummary,
    error::{
        ReqcovError,
        ReqcovResult,
    },
};

/// Schema version written into every report
pub const SCHEMA_VERSION: &str = "1.0";

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// Coverage summary plus document metadata
///
/// This is what every renderer reads and what the gate evaluates when it is
/// handed a serialized report instead of a live run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Report schema version
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// When the report was finalized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at:   Option<DateTime<Utc>>,
    /// Optional report title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title:          Option<String>,
    /// Aggregated coverage
    #[serde(flatten)]
    pub coverage:       CoverageSummary,
}

impl CoverageReport {
    /// Wrap a summary without a timestamp
    pub fn new(coverage: CoverageSummary) -> Self {
        Self {
            schema_version: default_schema_version(),
            generated_at: None,
            title: None,
            coverage,
        }
    }

    /// Wrap a summary stamped with the current time
    pub fn stamped(coverage: CoverageSummary) -> Self {
        Self {
            generated_at: Some(Utc::now()),
            ..Self::new(coverage)
        }
    }

    /// Set the report title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Title to print, falling back to a generic heading
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Requirements Coverage Report")
    }

    /// Decode a report from its JSON form
    pub fn from_json_str(content: &str) -> ReqcovResult<Self> {
        serde_json::from_str(content).map_err(ReqcovError::ReportParse)
    }

    /// Read and decode a report file
    pub fn load(path: &Path) -> ReqcovResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ReqcovError::io(path, e))?;
        Self::from_json_str(&content)
    }
}
