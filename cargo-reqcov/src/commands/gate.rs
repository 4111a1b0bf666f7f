//! `gate` command

use std::path::Path;

use anyhow::Result;
use reqcov_core::{
    GateResult,
    GateThresholds,
    gate::{
        self,
        fmt_threshold,
    },
};

use super::load_report;
use crate::{
    EXIT_GATE_FAILED,
    EXIT_SUCCESS,
    helpers::OutputManager,
};

/// Evaluate the gate and print the decision
pub fn cmd_gate(report_path: &Path, thresholds: &GateThresholds, output: &OutputManager) -> Result<i32> {
    let report = load_report(report_path)?;
    let coverage = &report.coverage;
    let totals = &coverage.summary;

    output.header("REQUIREMENT COVERAGE GATE");
    println!();
    println!("Total Requirements: {}", totals.total_requirements);
    println!("Covered: {}", totals.covered_requirements);
    println!("Verified: {}", totals.verified_requirements);
    println!("Verification: {:.1}%", totals.verification_percent);
    println!("Minimum Required: {}", fmt_threshold(thresholds.min_verification));
    if totals.total_features > 0 {
        println!(
            "Features Verified: {}/{} ({:.1}%)",
            totals.verified_features, totals.total_features, totals.feature_verification_percent
        );
    }
    println!();

    match gate::evaluate_report(&report, thresholds) {
        GateResult::Pass => {
            output.success(&format!(
                "PASS - Verification {:.1}% >= {}",
                totals.verification_percent,
                fmt_threshold(thresholds.min_verification)
            ));
            Ok(EXIT_SUCCESS)
        },
        GateResult::Fail(reasons) => {
            for reason in &reasons {
                output.failure(&format!("FAIL - {}", reason));
            }

            let uncovered: Vec<_> = coverage.uncovered_requirements().collect();
            if !uncovered.is_empty() {
                println!();
                output.failure(&format!("Uncovered requirements ({}):", uncovered.len()));
                for (id, requirement) in uncovered {
                    output.item(&format!("{}: {}", id, requirement.description));
                }
            }

            let failing: Vec<_> = coverage.failing_requirements().collect();
            if !failing.is_empty() {
                println!();
                output.warning(&format!("Failing requirements ({}):", failing.len()));
                for (id, requirement) in failing {
                    output.item(&format!("{}: {}", id, requirement.description));
                }
            }

            println!();
            println!("Build blocked! Fix tests before merging.");
            Ok(EXIT_GATE_FAILED)
        },
    }
}
