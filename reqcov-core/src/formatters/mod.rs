//! Report renderers
//!
//! Each renderer is a pure function of a [`CoverageReport`]. They read the
//! same fields, so the numbers they print always agree; percentages are
//! printed with one decimal everywhere.

pub mod html;
pub mod json;
pub mod markdown;
pub mod table;
pub mod uncovered;

use std::{
    fmt,
    path::{
        Path,
        PathBuf,
    },
    str::FromStr,
};

use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;
use tracing::info;

pub use table::TableOptions;

use crate::{
    error::{
        ReqcovError,
        ReqcovResult,
    },
    report::CoverageReport,
};

/// Marker printed in place of a missing failure field
pub const DETAIL_UNAVAILABLE: &str = "detail unavailable";

/// Output document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Machine-readable JSON
    Json,
    /// Standalone HTML page
    Html,
    /// Markdown prose
    Markdown,
    /// Fixed-width plain-text table
    Table,
    /// Plain-text listing of uncovered requirements and features
    Uncovered,
}

impl OutputFormat {
    /// The four documents written at the end of a run
    pub const REPORTS: [OutputFormat; 4] = [
        OutputFormat::Json,
        OutputFormat::Html,
        OutputFormat::Markdown,
        OutputFormat::Table,
    ];

    /// Conventional file name for the format
    pub fn file_name(self) -> &'static str {
        match self {
            OutputFormat::Json => "report.json",
            OutputFormat::Html => "report.html",
            OutputFormat::Markdown => "report.md",
            OutputFormat::Table => "report_table.txt",
            OutputFormat::Uncovered => "uncovered.txt",
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Table => "table",
            OutputFormat::Uncovered => "uncovered",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ReqcovError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "table" | "text" => Ok(OutputFormat::Table),
            "uncovered" => Ok(OutputFormat::Uncovered),
            other => Err(ReqcovError::Config(format!("unknown output format `{}`", other))),
        }
    }
}

/// A rendered report document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Format the body is written in
    pub format:    OutputFormat,
    /// Suggested file name
    pub file_name: String,
    /// Document text
    pub body:      String,
}

impl Document {
    fn new(format: OutputFormat, body: String) -> Self {
        Self {
            format,
            file_name: format.file_name().to_string(),
            body,
        }
    }

    /// Write the document into `dir`, returning the written path
    pub fn write_to(&self, dir: &Path) -> ReqcovResult<PathBuf> {
        std::fs::create_dir_all(dir).map_err(|e| ReqcovError::io(dir, e))?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.body).map_err(|e| ReqcovError::io(&path, e))?;
        info!(format = %self.format, path = %path.display(), "wrote report");
        Ok(path)
    }
}

/// Render a report in one format with default options
pub fn render(report: &CoverageReport, format: OutputFormat) -> Document {
    render_with(report, format, &TableOptions::default())
}

/// Render a report in one format
pub fn render_with(report: &CoverageReport, format: OutputFormat, table: &TableOptions) -> Document {
    let body = match format {
        OutputFormat::Json => json::render(report),
        OutputFormat::Html => html::render(report),
        OutputFormat::Markdown => markdown::render(report),
        OutputFormat::Table => table::render_with(report, table),
        OutputFormat::Uncovered => uncovered::render(report),
    };
    Document::new(format, body)
}

/// Render the JSON, HTML, Markdown and table documents
pub fn render_all(report: &CoverageReport) -> Vec<Document> {
    OutputFormat::REPORTS
        .iter()
        .map(|format| render(report, *format))
        .collect()
}

/// Percentage with one decimal
pub(crate) fn fmt_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Failure field as compact JSON, or the unavailable marker
pub(crate) fn fmt_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => format!("{:?}", s),
        Some(v) => v.to_string(),
        None => DETAIL_UNAVAILABLE.to_string(),
    }
}

/// Thousands-separated count, e.g. `1,234`
pub(crate) fn fmt_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_format_parse_and_names() {
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("HTML".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
        assert!("pdf".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Table.file_name(), "report_table.txt");
    }

    #[test]
    fn test_fmt_helpers() {
        assert_eq!(fmt_percent(66.66), "66.7%");
        assert_eq!(fmt_percent(0.0), "0.0%");
        assert_eq!(fmt_count(0), "0");
        assert_eq!(fmt_count(999), "999");
        assert_eq!(fmt_count(1501), "1,501");
        assert_eq!(fmt_count(1234567), "1,234,567");
        assert_eq!(fmt_value(None), DETAIL_UNAVAILABLE);
        assert_eq!(fmt_value(Some(&json!("ab"))), "\"ab\"");
        assert_eq!(fmt_value(Some(&json!({"s": 1}))), "{\"s\":1}");
    }

    #[test]
    fn test_render_all_writes_four_documents() {
        let report = fixtures::report();
        let dir = tempfile::tempdir().unwrap();

        let documents = render_all(&report);
        assert_eq!(documents.len(), 4);
        for document in &documents {
            let path = document.write_to(dir.path()).unwrap();
            assert!(path.exists());
        }
        assert!(dir.path().join("report.md").exists());
    }
}
