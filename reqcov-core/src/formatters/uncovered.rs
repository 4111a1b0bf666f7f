//! Plain-text listing of what no test exercises

use std::fmt::{
    self,
    Write,
};

use super::fmt_percent;
use crate::report::CoverageReport;

/// Render the uncovered requirements and features
pub fn render(report: &CoverageReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_listing(&mut out, report);
    out
}

fn write_listing(out: &mut String, report: &CoverageReport) -> fmt::Result {
    let rule = "=".repeat(80);
    let coverage = &report.coverage;

    writeln!(out, "{}", rule)?;
    writeln!(out, "UNCOVERED REQUIREMENTS")?;
    writeln!(out, "{}", rule)?;
    writeln!(out)?;

    let mut any = false;
    for (id, requirement) in coverage.uncovered_requirements() {
        any = true;
        writeln!(out, "❌ {} [{}]: {}", id, requirement.priority, requirement.description)?;
    }
    if !any {
        writeln!(out, "✅ All requirements are covered!")?;
    }
    writeln!(out)?;

    writeln!(out, "{}", rule)?;
    writeln!(out, "UNCOVERED FEATURES")?;
    writeln!(out, "{}", rule)?;
    writeln!(out)?;

    let mut any = false;
    for (id, requirement) in &coverage.requirements {
        let missing: Vec<_> = requirement
            .features
            .iter()
            .filter(|(_, feature)| !feature.covered)
            .collect();
        if missing.is_empty() {
            continue;
        }

        any = true;
        writeln!(out, "📋 {}: {}", id, requirement.description)?;
        for (feature_id, feature) in missing {
            writeln!(out, "   ❌ {}: {}", feature_id, feature.description)?;
        }
        writeln!(out)?;
    }
    if !any {
        writeln!(out, "✅ All features are covered!")?;
        writeln!(out)?;
    }

    let totals = &coverage.summary;
    writeln!(out, "{}", rule)?;
    writeln!(out, "SUMMARY")?;
    writeln!(out, "{}", rule)?;
    writeln!(
        out,
        "Feature Coverage: {}/{} verified ({})",
        totals.verified_features,
        totals.total_features,
        fmt_percent(totals.feature_verification_percent)
    )?;
    writeln!(
        out,
        "Missing: {} features",
        totals.total_features.saturating_sub(totals.covered_features)
    )
}
