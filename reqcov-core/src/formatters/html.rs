//! Standalone HTML report
//!
//! One styled page: summary stat blocks, a card per requirement coloured by
//! status, per-test lines, failure detail, features and diagnostics. Every
//! piece of text taken from the report is escaped.

use std::fmt::{
    self,
    Write,
};

use super::{
    fmt_count,
    fmt_percent,
    fmt_value,
};
use crate::{
    aggregate::{
        FailureDetail,
        RequirementCoverage,
    },
    diagnostics::{
        Diagnostic,
        DiagnosticSummary,
    },
    report::CoverageReport,
};

const STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; margin: 0; padding: 20px; background: #f5f5f5; color: #333; }
.container { max-width: 1200px; margin: 0 auto; background: #fff; padding: 30px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
h1 { border-bottom: 3px solid #3498db; padding-bottom: 10px; }
.summary { display: flex; flex-wrap: wrap; gap: 16px; margin: 20px 0; }
.stat { flex: 1 1 180px; background: #ecf0f1; padding: 16px; border-radius: 6px; text-align: center; }
.stat .value { font-size: 1.8em; font-weight: bold; }
.stat .label { color: #7f8c8d; }
.requirement { border-left: 5px solid #bdc3c7; margin: 16px 0; padding: 12px 16px; background: #fafafa; border-radius: 4px; }
.requirement.verified { border-left-color: #27ae60; }
.requirement.failing { border-left-color: #e67e22; }
.requirement.uncovered { border-left-color: #c0392b; }
.priority { display: inline-block; padding: 2px 8px; border-radius: 10px; font-size: 0.8em; color: #fff; }
.priority.high { background: #c0392b; }
.priority.medium { background: #e67e22; }
.priority.low { background: #7f8c8d; }
.test.passed { color: #27ae60; }
.test.failed { color: #c0392b; }
.failure { background: #fdf2e9; padding: 8px 12px; border-radius: 4px; margin: 8px 0; }
.failure code { white-space: pre-wrap; }
.feature.verified { color: #27ae60; }
.feature.failing { color: #e67e22; }
.feature.uncovered { color: #c0392b; }
.diagnostics li.error { color: #c0392b; }
.diagnostics li.warning { color: #e67e22; }
.diagnostics li.info { color: #7f8c8d; }
"#;

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the HTML page
pub fn render(report: &CoverageReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_page(&mut out, report);
    out
}

fn write_page(out: &mut String, report: &CoverageReport) -> fmt::Result {
    let title = escape_html(report.display_title());

    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html lang=\"en\">")?;
    writeln!(out, "<head>")?;
    writeln!(out, "<meta charset=\"utf-8\">")?;
    writeln!(out, "<title>{}</title>", title)?;
    writeln!(out, "<style>{}</style>", STYLE)?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;
    writeln!(out, "<div class=\"container\">")?;
    writeln!(out, "<h1>{}</h1>", title)?;

    if let Some(generated_at) = report.generated_at {
        writeln!(
            out,
            "<p class=\"generated\">Generated {}</p>",
            generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
    }

    write_summary(out, report)?;

    writeln!(out, "<h2>Requirements</h2>")?;
    for (id, requirement) in &report.coverage.requirements {
        write_requirement(out, id, requirement)?;
    }

    write_diagnostics(out, &report.coverage.diagnostics)?;

    writeln!(out, "</div>")?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")
}

fn write_summary(out: &mut String, report: &CoverageReport) -> fmt::Result {
    let totals = &report.coverage.summary;
    let stats = [
        (
            format!("{}/{}", totals.verified_requirements, totals.total_requirements),
            "Requirements verified",
        ),
        (fmt_percent(totals.verification_percent), "Verification"),
        (fmt_percent(totals.coverage_percent), "Coverage"),
        (
            format!("{}/{}", totals.verified_features, totals.total_features),
            "Features verified",
        ),
        (fmt_percent(totals.feature_verification_percent), "Feature verification"),
        (fmt_count(totals.total_examples), "Examples"),
    ];

    writeln!(out, "<div class=\"summary\">")?;
    for (value, label) in stats {
        writeln!(
            out,
            "<div class=\"stat\"><div class=\"value\">{}</div><div class=\"label\">{}</div></div>",
            value, label
        )?;
    }
    writeln!(out, "</div>")
}

fn write_requirement(out: &mut String, id: &str, requirement: &RequirementCoverage) -> fmt::Result {
    let status = requirement.status();

    writeln!(out, "<div class=\"requirement {}\">", status.css_class())?;
    writeln!(
        out,
        "<h3>{} {} <span class=\"priority {}\">{}</span></h3>",
        status.marker(),
        escape_html(id),
        requirement.priority,
        requirement.priority
    )?;
    writeln!(out, "<p>{}</p>", escape_html(&requirement.description))?;
    writeln!(
        out,
        "<p><strong>Status:</strong> {} &middot; <strong>Examples:</strong> {}</p>",
        status.label(),
        fmt_count(requirement.examples)
    )?;

    if requirement.tests.is_empty() {
        writeln!(out, "<p class=\"tests\"><em>No tests</em></p>")?;
    } else {
        writeln!(out, "<ul class=\"tests\">")?;
        for row in &requirement.tests {
            let (class, marker) = if row.passed { ("passed", "✓") } else { ("failed", "✗") };
            write!(
                out,
                "<li class=\"test {}\">{} <code>{}</code> ({} examples",
                class,
                marker,
                escape_html(&row.test),
                fmt_count(row.examples)
            )?;
            if row.failed_examples > 0 {
                write!(out, ", {} failed", fmt_count(row.failed_examples))?;
            }
            writeln!(out, ")</li>")?;
        }
        writeln!(out, "</ul>")?;
    }

    if let Some(failure) = &requirement.failure {
        write_failure(out, failure)?;
    }

    if !requirement.features.is_empty() {
        writeln!(
            out,
            "<h4>Features ({}/{} verified)</h4>",
            requirement.verified_features(),
            requirement.features.len()
        )?;
        writeln!(out, "<ul class=\"features\">")?;
        for (feature_id, feature) in &requirement.features {
            let status = feature.status();
            writeln!(
                out,
                "<li class=\"feature {}\">{} <strong>{}</strong>: {} ({} examples)</li>",
                status.css_class(),
                status.marker(),
                escape_html(feature_id),
                escape_html(&feature.description),
                fmt_count(feature.examples)
            )?;
        }
        writeln!(out, "</ul>")?;
    }

    writeln!(out, "</div>")
}

fn write_failure(out: &mut String, failure: &FailureDetail) -> fmt::Result {
    writeln!(out, "<div class=\"failure\">")?;
    write!(out, "<p><strong>First failure:</strong> <code>{}</code>", escape_html(&failure.test))?;
    if let Some(example) = failure.example {
        write!(out, " (example {})", example)?;
    }
    writeln!(out, "</p>")?;

    let fields = [
        ("Stimuli", fmt_value(failure.stimuli.as_ref())),
        ("Response", fmt_value(failure.response.as_ref())),
        ("Expected", fmt_value(failure.expected.as_ref())),
    ];
    writeln!(out, "<ul>")?;
    for (label, value) in fields {
        writeln!(out, "<li>{}: <code>{}</code></li>", label, escape_html(&value))?;
    }
    if let Some(kind) = &failure.error_kind {
        writeln!(out, "<li>Error kind: {}</li>", escape_html(kind))?;
    }
    if let Some(message) = &failure.error_message {
        writeln!(out, "<li>Error message: <code>{}</code></li>", escape_html(message))?;
    }
    writeln!(out, "</ul>")?;
    writeln!(out, "</div>")
}

fn write_diagnostics(out: &mut String, diagnostics: &[Diagnostic]) -> fmt::Result {
    if diagnostics.is_empty() {
        return Ok(());
    }

    let counts = DiagnosticSummary::from_diagnostics(diagnostics);
    writeln!(out, "<h2>Diagnostics</h2>")?;
    writeln!(
        out,
        "<p>{} errors, {} warnings, {} info</p>",
        counts.errors, counts.warnings, counts.infos
    )?;
    writeln!(out, "<ul class=\"diagnostics\">")?;
    for diagnostic in diagnostics {
        writeln!(
            out,
            "<li class=\"{}\">{}</li>",
            diagnostic.severity,
            escape_html(&diagnostic.to_string())
        )?;
    }
    writeln!(out, "</ul>")
}
