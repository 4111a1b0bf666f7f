//! Markdown report
//!
//! GitHub-flavored prose suitable for a PR comment or a docs page.

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
    diagnostics::DiagnosticSummary,
    report::CoverageReport,
};

/// Escape Markdown syntax and inline HTML in free text
///
/// Besides inline markup, a leading list, ordered-list, rule or setext marker
/// is escaped so text written as its own paragraph stays a paragraph.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 1);

    let body = text.trim_start_matches(' ');
    escaped.push_str(&text[..text.len() - body.len()]);

    let digits = body.bytes().take_while(u8::is_ascii_digit).count();
    let rest = match body.as_bytes().get(digits) {
        Some(marker @ (b'.' | b')')) if digits > 0 => {
            escaped.push_str(&body[..digits]);
            escaped.push('\\');
            escaped.push(char::from(*marker));
            &body[digits + 1..]
        },
        _ => {
            if body.starts_with(['-', '+', '=']) {
                escaped.push('\\');
            }
            body
        },
    };

    for c in rest.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '#' | '|' | '~' => {
                escaped.push('\\');
                escaped.push(c);
            },
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '\n' | '\r' => escaped.push(' '),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Wrap text in a code span whose fence is longer than any backtick run inside
pub fn code_span(text: &str) -> String {
    let longest_run = text
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest_run + 1);
    let text = text.replace(['\n', '\r'], " ");
    if text.starts_with('`') || text.ends_with('`') {
        format!("{} {} {}", fence, text, fence)
    } else {
        format!("{}{}{}", fence, text, fence)
    }
}

/// Render the Markdown document
pub fn render(report: &CoverageReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_document(&mut out, report);
    out
}

fn write_document(out: &mut String, report: &CoverageReport) -> fmt::Result {
    let totals = &report.coverage.summary;

    writeln!(out, "# {}\n", escape_markdown(report.display_title()))?;
    if let Some(generated_at) = report.generated_at {
        writeln!(out, "_Generated {}_\n", generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    }

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total Requirements**: {}", totals.total_requirements)?;
    writeln!(
        out,
        "- **Covered**: {} ({})",
        totals.covered_requirements,
        fmt_percent(totals.coverage_percent)
    )?;
    writeln!(
        out,
        "- **Verified**: {} ({})",
        totals.verified_requirements,
        fmt_percent(totals.verification_percent)
    )?;
    writeln!(
        out,
        "- **Features Verified**: {}/{} ({})",
        totals.verified_features,
        totals.total_features,
        fmt_percent(totals.feature_verification_percent)
    )?;
    writeln!(out, "- **Total Examples**: {}\n", fmt_count(totals.total_examples))?;

    writeln!(out, "## Requirements\n")?;
    for (id, requirement) in &report.coverage.requirements {
        write_requirement(out, id, requirement)?;
    }

    if !report.coverage.diagnostics.is_empty() {
        let counts = DiagnosticSummary::from_diagnostics(&report.coverage.diagnostics);
        writeln!(out, "## Diagnostics\n")?;
        writeln!(
            out,
            "{} errors, {} warnings, {} info\n",
            counts.errors, counts.warnings, counts.infos
        )?;
        for diagnostic in &report.coverage.diagnostics {
            writeln!(out, "- {}", escape_markdown(&diagnostic.to_string()))?;
        }
        writeln!(out)?;
    }

    Ok(())
}

fn write_requirement(out: &mut String, id: &str, requirement: &RequirementCoverage) -> fmt::Result {
    let status = requirement.status();

    writeln!(out, "### {} {}\n", status.marker(), escape_markdown(id))?;
    writeln!(out, "{}\n", escape_markdown(&requirement.description))?;
    writeln!(out, "- **Status**: {}", status.label())?;
    writeln!(out, "- **Priority**: {}", requirement.priority)?;
    writeln!(out, "- **Examples**: {}", fmt_count(requirement.examples))?;

    if requirement.tests.is_empty() {
        writeln!(out, "- **Tests**: none")?;
    } else {
        writeln!(out, "- **Tests**:")?;
        for row in &requirement.tests {
            let marker = if row.passed { "✓" } else { "✗" };
            write!(
                out,
                "  - {} {} ({} examples",
                marker,
                code_span(&row.test),
                fmt_count(row.examples)
            )?;
            if row.failed_examples > 0 {
                write!(out, ", {} failed", fmt_count(row.failed_examples))?;
            }
            writeln!(out, ")")?;
        }
    }

    if !requirement.features.is_empty() {
        writeln!(
            out,
            "- **Features** ({}/{} verified):",
            requirement.verified_features(),
            requirement.features.len()
        )?;
        for (feature_id, feature) in &requirement.features {
            writeln!(
                out,
                "  - {} **{}**: {}",
                feature.status().marker(),
                escape_markdown(feature_id),
                escape_markdown(&feature.description)
            )?;
        }
    }

    if let Some(failure) = &requirement.failure {
        write_failure(out, failure)?;
    }

    writeln!(out)
}

fn write_failure(out: &mut String, failure: &FailureDetail) -> fmt::Result {
    write!(out, "\n**First failure** in {}", code_span(&failure.test))?;
    if let Some(example) = failure.example {
        write!(out, " (example {})", example)?;
    }
    writeln!(out, ":\n")?;
    writeln!(out, "- Stimuli: {}", code_span(&fmt_value(failure.stimuli.as_ref())))?;
    writeln!(out, "- Response: {}", code_span(&fmt_value(failure.response.as_ref())))?;
    writeln!(out, "- Expected: {}", code_span(&fmt_value(failure.expected.as_ref())))?;
    if let Some(kind) = &failure.error_kind {
        writeln!(out, "- Error kind: {}", escape_markdown(kind))?;
    }
    if let Some(message) = &failure.error_message {
        writeln!(out, "- Error message: {}", code_span(message))?;
    }
    Ok(())
}
