//! CI gate evaluation
//!
//! Compares the rounded percentages of a summary against configured
//! thresholds. Evaluation is pure and total: any summary, including one
//! decoded from a report file, yields a decision.

use std::fmt;

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
    report::CoverageReport,
};

/// Default minimum requirement verification percentage
pub const DEFAULT_MIN_VERIFICATION: f64 = 95.0;

/// Gate thresholds, all percentages in `0..=100`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateThresholds {
    /// Minimum verified / total requirements
    pub min_verification:         f64,
    /// Minimum verified / total features
    pub min_feature_verification: Option<f64>,
    /// Minimum covered / total requirements
    pub min_coverage:             Option<f64>,
    /// Fail when the specification declares no requirements
    pub require_requirements:     bool,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            min_verification:         DEFAULT_MIN_VERIFICATION,
            min_feature_verification: None,
            min_coverage:             None,
            require_requirements:     false,
        }
    }
}

impl GateThresholds {
    /// Thresholds with only a verification minimum
    pub fn with_min_verification(min_verification: f64) -> Self {
        Self {
            min_verification,
            ..Self::default()
        }
    }

    /// Reject thresholds that are not finite percentages in `0..=100`
    pub fn validate(&self) -> ReqcovResult<()> {
        validate_percent("min_verification", self.min_verification)?;
        if let Some(value) = self.min_feature_verification {
            validate_percent("min_feature_verification", value)?;
        }
        if let Some(value) = self.min_coverage {
            validate_percent("min_coverage", value)?;
        }
        Ok(())
    }
}

fn validate_percent(name: &str, value: f64) -> ReqcovResult<()> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ReqcovError::Config(format!(
            "gate threshold `{}` must be a percentage between 0 and 100, got {}",
            name, value
        )))
    }
}

/// Gate decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateResult {
    /// Every threshold is met
    Pass,
    /// Violated thresholds, in a fixed order
    Fail(Vec<String>),
}

impl GateResult {
    /// Whether the gate passed
    pub fn passed(&self) -> bool {
        matches!(self, GateResult::Pass)
    }

    /// Violation messages; empty on pass
    pub fn reasons(&self) -> &[String] {
        match self {
            GateResult::Pass => &[],
            GateResult::Fail(reasons) => reasons,
        }
    }
}

impl fmt::Display for GateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateResult::Pass => write!(f, "PASS"),
            GateResult::Fail(reasons) => write!(f, "FAIL: {}", reasons.join("; ")),
        }
    }
}

/// Print a threshold percentage without a trailing `.0`
pub fn fmt_threshold(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}%", value)
    } else {
        format!("{:.1}%", value)
    }
}

fn check(reasons: &mut Vec<String>, label: &str, actual: f64, minimum: f64) {
    // NaN on either side fails
    if actual.is_nan() || minimum.is_nan() || actual < minimum {
        reasons.push(format!(
            "{} {:.1}% < {}",
            label,
            actual,
            fmt_threshold(minimum)
        ));
    }
}

/// Evaluate a summary against thresholds
pub fn evaluate(summary: &CoverageSummary, thresholds: &GateThresholds) -> GateResult {
    let totals = &summary.summary;
    let mut reasons = Vec::new();

    // With no requirements every ratio is 0/0; only the explicit flag can fail
    if totals.total_requirements > 0 {
        check(
            &mut reasons,
            "requirement verification",
            totals.verification_percent,
            thresholds.min_verification,
        );
        if let Some(minimum) = thresholds.min_coverage {
            check(&mut reasons, "requirement coverage", totals.coverage_percent, minimum);
        }
        if let Some(minimum) = thresholds.min_feature_verification {
            if totals.total_features > 0 {
                check(
                    &mut reasons,
                    "feature verification",
                    totals.feature_verification_percent,
                    minimum,
                );
            }
        }
    } else if thresholds.require_requirements {
        reasons.push("specification declares no requirements".to_string());
    }

    if reasons.is_empty() {
        GateResult::Pass
    } else {
        GateResult::Fail(reasons)
    }
}

/// Evaluate a decoded machine-readable report
pub fn evaluate_report(report: &CoverageReport, thresholds: &GateThresholds) -> GateResult {
    evaluate(&report.coverage, thresholds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Totals;

    fn summary(total: usize, covered: usize, verified: usize) -> CoverageSummary {
        let percent = crate::aggregate::percent;
        CoverageSummary {
            summary: Totals {
                total_requirements: total,
                covered_requirements: covered,
                verified_requirements: verified,
                coverage_percent: percent(covered, total),
                verification_percent: percent(verified, total),
                ..Totals::default()
            },
            ..CoverageSummary::default()
        }
    }

    #[test]
    fn test_below_threshold_fails() {
        let result = evaluate(&summary(3, 3, 2), &GateThresholds::with_min_verification(95.0));
        assert_eq!(
            result,
            GateResult::Fail(vec!["requirement verification 66.7% < 95%".to_string()])
        );
        assert!(!result.passed());
    }

    #[test]
    fn test_full_verification_passes() {
        let result = evaluate(&summary(3, 3, 3), &GateThresholds::default());
        assert_eq!(result, GateResult::Pass);
        assert!(result.reasons().is_empty());
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let result = evaluate(&summary(3, 3, 2), &GateThresholds::with_min_verification(66.7));
        assert!(result.passed());
    }

    #[test]
    fn test_reason_order() {
        let mut s = summary(4, 2, 1);
        s.summary.total_features = 2;
        s.summary.verified_features = 0;
        let thresholds = GateThresholds {
            min_verification:         80.0,
            min_feature_verification: Some(50.0),
            min_coverage:             Some(90.5),
            require_requirements:     true,
        };

        let result = evaluate(&s, &thresholds);
        assert_eq!(
            result.reasons(),
            &[
                "requirement verification 25.0% < 80%".to_string(),
                "requirement coverage 50.0% < 90.5%".to_string(),
                "feature verification 0.0% < 50%".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_specification() {
        let empty = CoverageSummary::default();
        assert!(evaluate(&empty, &GateThresholds::default()).passed());

        let strict = GateThresholds {
            require_requirements: true,
            ..GateThresholds::default()
        };
        assert_eq!(
            evaluate(&empty, &strict),
            GateResult::Fail(vec!["specification declares no requirements".to_string()])
        );
    }

    #[test]
    fn test_no_features_skips_feature_threshold() {
        let thresholds = GateThresholds {
            min_feature_verification: Some(100.0),
            ..GateThresholds::default()
        };
        assert!(evaluate(&summary(2, 2, 2), &thresholds).passed());
    }

    #[test]
    fn test_validate_rejects_non_percentages() {
        assert!(GateThresholds::default().validate().is_ok());
        assert!(GateThresholds::with_min_verification(0.0).validate().is_ok());
        assert!(GateThresholds::with_min_verification(100.0).validate().is_ok());

        let nan: GateThresholds = toml::from_str("min_verification = nan").unwrap();
        let err = nan.validate().unwrap_err();
        assert!(matches!(err, ReqcovError::Config(_)));
        assert!(err.to_string().contains("min_verification"));

        assert!(GateThresholds::with_min_verification(150.0).validate().is_err());
        assert!(GateThresholds::with_min_verification(-1.0).validate().is_err());
        let thresholds = GateThresholds {
            min_coverage: Some(f64::INFINITY),
            ..GateThresholds::default()
        };
        assert!(thresholds.validate().is_err());
        let thresholds = GateThresholds {
            min_feature_verification: Some(f64::NAN),
            ..GateThresholds::default()
        };
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_nan_never_passes() {
        let thresholds = GateThresholds::with_min_verification(f64::NAN);
        assert!(!evaluate(&summary(3, 0, 0), &thresholds).passed());

        let mut s = summary(3, 3, 3);
        s.summary.verification_percent = f64::NAN;
        assert!(!evaluate(&s, &GateThresholds::default()).passed());
    }

    #[test]
    fn test_thresholds_from_toml() {
        let thresholds: GateThresholds = toml::from_str("min_feature_verification = 80.0").unwrap();
        assert_eq!(thresholds.min_verification, 95.0);
        assert_eq!(thresholds.min_feature_verification, Some(80.0));
    }
}
