//! Fixed-width plain-text table
//!
//! Columns are Requirement, Description, Test Case, Status and Examples,
//! one row per test row. Continuation rows of a requirement leave the
//! requirement columns blank; a requirement without tests gets a single
//! `UNCOVERED` row. Widths are measured in terminal columns, not bytes.

use std::fmt::{
    self,
    Write,
};

use serde::{
    Deserialize,
    Serialize,
};
use unicode_width::{
    UnicodeWidthChar,
    UnicodeWidthStr,
};

use super::{
    fmt_count,
    fmt_percent,
};
use crate::report::CoverageReport;

const HEADERS: [&str; 5] = ["Requirement", "Description", "Test Case", "Status", "Examples"];
const ELLIPSIS: char = '…';

/// Column limits for the table renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    /// Descriptions wider than this are truncated
    pub max_description_width: usize,
    /// Test names wider than this are truncated
    pub max_test_width:        usize,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            max_description_width: 60,
            max_test_width:        70,
        }
    }
}

/// Render with default column limits
pub fn render(report: &CoverageReport) -> String {
    render_with(report, &TableOptions::default())
}

/// Render with explicit column limits
pub fn render_with(report: &CoverageReport, options: &TableOptions) -> String {
    let rows = build_rows(report, options);
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_table(&mut out, report, &rows);
    out
}

type Row = [String; 5];

fn build_rows(report: &CoverageReport, options: &TableOptions) -> Vec<Row> {
    let mut rows = Vec::new();

    for (id, requirement) in &report.coverage.requirements {
        let description = truncate(&cell(&requirement.description), options.max_description_width);

        if requirement.tests.is_empty() {
            rows.push([
                cell(id),
                description,
                "No tests".to_string(),
                "✗ UNCOVERED".to_string(),
                "0".to_string(),
            ]);
            continue;
        }

        for (index, row) in requirement.tests.iter().enumerate() {
            let (req_col, desc_col) = if index == 0 {
                (cell(id), description.clone())
            } else {
                (String::new(), String::new())
            };
            let status = if row.passed { "✓ PASS" } else { "✗ FAIL" };
            rows.push([
                req_col,
                desc_col,
                truncate(&cell(&row.test), options.max_test_width),
                status.to_string(),
                fmt_count(row.examples),
            ]);
        }
    }

    rows
}

fn write_table(out: &mut String, report: &CoverageReport, rows: &[Row]) -> fmt::Result {
    let mut widths = HEADERS.map(|header| header.width());
    for row in rows {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.width());
        }
    }

    let separator = widths
        .iter()
        .fold(String::from("+"), |mut line, width| {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
            line
        });
    let rule = "=".repeat(separator.chars().count());
    let totals = &report.coverage.summary;

    writeln!(out, "{}", rule)?;
    writeln!(out, "TEST COVERAGE TABLE")?;
    writeln!(out, "{}", rule)?;
    writeln!(out)?;
    if let Some(generated_at) = report.generated_at {
        writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    }
    writeln!(
        out,
        "Summary: {}/{} requirements verified ({})",
        totals.verified_requirements,
        totals.total_requirements,
        fmt_percent(totals.verification_percent)
    )?;
    if totals.total_examples > 0 {
        writeln!(out, "Total Test Scenarios: {} examples tested", fmt_count(totals.total_examples))?;
    }
    writeln!(out)?;

    writeln!(out, "{}", separator)?;
    write_row(out, &HEADERS.map(String::from), &widths)?;
    writeln!(out, "{}", separator)?;
    for row in rows {
        write_row(out, row, &widths)?;
    }
    writeln!(out, "{}", separator)?;

    if !report.coverage.diagnostics.is_empty() {
        writeln!(out)?;
        writeln!(out, "Diagnostics:")?;
        for diagnostic in &report.coverage.diagnostics {
            writeln!(out, "  {}", cell(&diagnostic.to_string()))?;
        }
    }
    Ok(())
}

fn write_row(out: &mut String, row: &Row, widths: &[usize; 5]) -> fmt::Result {
    out.push('|');
    for (value, width) in row.iter().zip(widths) {
        let padding = width.saturating_sub(value.width());
        write!(out, " {}{} |", value, " ".repeat(padding))?;
    }
    writeln!(out)
}

/// Collapse characters that would break the row layout
fn cell(text: &str) -> String {
    text.chars()
        .map(|c| if c == '\n' || c == '\r' || c == '\t' { ' ' } else { c })
        .collect()
}

/// Cut `text` to at most `max` columns, ending in an ellipsis when cut
fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }

    let budget = max - 1;
    let mut used = 0;
    let mut truncated = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        truncated.push(c);
    }
    truncated.push(ELLIPSIS);
    truncated
}
