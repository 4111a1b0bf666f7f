//! Coverage aggregation
//!
//! [`summarize`] folds a multiset of [`TestOutcomeEvent`]s against the
//! specification and tag registry into a [`CoverageSummary`]. The fold is a
//! pure function of its inputs: events are first put into canonical order
//! (test identifier, example ordinal, then content), so permuting the input
//! or folding it again yields an identical summary.
//!
//! Requirement verification and feature verification are independent
//! counters. A requirement is verified when every event claiming it passed,
//! even if some of its features were never exercised.

use std::{
    borrow::Cow,
    collections::{
        BTreeMap,
        BTreeSet,
    },
    fmt,
};

use indexmap::IndexMap;
use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;
use tracing::{
    debug,
    warn,
};

use crate::{
    diagnostics::{
        Diagnostic,
        DiagnosticCode,
    },
    recorder::TestOutcomeEvent,
    registry::{
        Association,
        TagRegistry,
    },
    requirements::{
        FeatureKey,
        Priority,
        Requirement,
        SpecificationModel,
    },
};

/// Verification state of a requirement, feature or test row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoverageStatus {
    /// Covered and every associated outcome passed
    Verified,
    /// Covered but at least one associated outcome failed
    Failing,
    /// No associated outcome
    Uncovered,
}

impl CoverageStatus {
    fn from_flags(covered: bool, verified: bool) -> Self {
        match (covered, verified) {
            (_, true) => CoverageStatus::Verified,
            (true, false) => CoverageStatus::Failing,
            (false, false) => CoverageStatus::Uncovered,
        }
    }

    /// Status marker used by the human-readable reports
    pub fn marker(self) -> &'static str {
        match self {
            CoverageStatus::Verified => "✅",
            CoverageStatus::Failing => "⚠️",
            CoverageStatus::Uncovered => "❌",
        }
    }

    /// Upper-case label
    pub fn label(self) -> &'static str {
        match self {
            CoverageStatus::Verified => "VERIFIED",
            CoverageStatus::Failing => "FAILING",
            CoverageStatus::Uncovered => "UNCOVERED",
        }
    }

    /// CSS class name used by the hypertext report
    pub fn css_class(self) -> &'static str {
        match self {
            CoverageStatus::Verified => "verified",
            CoverageStatus::Failing => "failing",
            CoverageStatus::Uncovered => "uncovered",
        }
    }
}

impl fmt::Display for CoverageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Captured detail of the first failing event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureDetail {
    /// Failing test identifier
    pub test:          String,
    /// Example ordinal, for property-based tests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example:       Option<u64>,
    /// Input value(s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stimuli:       Option<Value>,
    /// Actual value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response:      Option<Value>,
    /// Expected value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected:      Option<Value>,
    /// Failure classifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind:    Option<String>,
    /// Failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl FailureDetail {
    fn from_event(event: &TestOutcomeEvent) -> Self {
        Self {
            test:          event.test_id.clone(),
            example:       event.example,
            stimuli:       event.stimuli.clone(),
            response:      event.response.clone(),
            expected:      event.expected.clone(),
            error_kind:    event.error_kind.clone(),
            error_message: event.error_message.clone(),
        }
    }
}

/// Outcomes of one test identifier under a requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRow {
    /// Test identifier
    pub test:            String,
    /// Whether every example passed
    pub passed:          bool,
    /// Number of recorded examples
    pub examples:        u64,
    /// Number of failing examples
    pub failed_examples: u64,
    /// First failing example
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure:         Option<FailureDetail>,
}

/// Coverage of one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCoverage {
    /// Feature description
    pub description: String,
    /// At least one event claims the feature
    pub covered:     bool,
    /// Covered and every claiming event passed
    pub verified:    bool,
    /// Number of claiming events
    pub examples:    u64,
    /// First failing claiming event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure:     Option<FailureDetail>,
}

impl FeatureCoverage {
    /// Verification state
    pub fn status(&self) -> CoverageStatus {
        CoverageStatus::from_flags(self.covered, self.verified)
    }
}

/// Coverage of one requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementCoverage {
    /// Requirement description
    pub description: String,
    /// Requirement priority
    pub priority:    Priority,
    /// At least one event claims the requirement
    pub covered:     bool,
    /// Covered and every claiming event passed
    pub verified:    bool,
    /// Number of claiming events
    pub examples:    u64,
    /// First failing claiming event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure:     Option<FailureDetail>,
    /// Per-test breakdown, ordered by test identifier
    #[serde(default)]
    pub tests:       Vec<TestRow>,
    /// Per-feature breakdown in declaration order
    #[serde(default)]
    pub features:    IndexMap<String, FeatureCoverage>,
}

impl RequirementCoverage {
    /// Verification state
    pub fn status(&self) -> CoverageStatus {
        CoverageStatus::from_flags(self.covered, self.verified)
    }

    /// Number of verified features
    pub fn verified_features(&self) -> usize {
        self.features.values().filter(|f| f.verified).count()
    }
}

/// Run-wide totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    /// Declared requirements
    pub total_requirements:           usize,
    /// Requirements with at least one outcome
    pub covered_requirements:         usize,
    /// Requirements whose outcomes all passed
    pub verified_requirements:        usize,
    /// `covered / total`, percent
    pub coverage_percent:             f64,
    /// `verified / total`, percent
    pub verification_percent:         f64,
    /// Declared features
    pub total_features:               usize,
    /// Features with at least one outcome
    pub covered_features:             usize,
    /// Features whose outcomes all passed
    pub verified_features:            usize,
    /// Feature `covered / total`, percent
    pub feature_coverage_percent:     f64,
    /// Feature `verified / total`, percent
    pub feature_verification_percent: f64,
    /// Every recorded event, each generated example counting once
    pub total_examples:               u64,
}

/// Aggregated coverage of a run
///
/// Serializes to the `summary` / `requirements` / `diagnostics` shape of the
/// machine-readable report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageSummary {
    /// Run-wide totals
    pub summary:      Totals,
    /// Per-requirement coverage in declaration order
    pub requirements: IndexMap<String, RequirementCoverage>,
    /// Non-fatal anomalies, sorted
    #[serde(default)]
    pub diagnostics:  Vec<Diagnostic>,
}

impl CoverageSummary {
    /// Requirements with no outcome at all
    pub fn uncovered_requirements(&self) -> impl Iterator<Item = (&str, &RequirementCoverage)> {
        self.requirements
            .iter()
            .filter(|(_, r)| !r.covered)
            .map(|(id, r)| (id.as_str(), r))
    }

    /// Covered requirements with at least one failing outcome
    pub fn failing_requirements(&self) -> impl Iterator<Item = (&str, &RequirementCoverage)> {
        self.requirements
            .iter()
            .filter(|(_, r)| r.covered && !r.verified)
            .map(|(id, r)| (id.as_str(), r))
    }
}

/// `numerator / denominator` as a percentage rounded to one decimal
///
/// `0 / 0` is `0.0`.
pub fn percent(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    ((numerator as f64 / denominator as f64) * 1000.0).round() / 10.0
}

/// Sort key that makes the fold independent of arrival order
type CanonicalKey = (
    String,
    Option<u64>,
    bool,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    BTreeSet<String>,
    BTreeSet<String>,
);

fn canonical_key(event: &TestOutcomeEvent) -> CanonicalKey {
    (
        event.test_id.clone(),
        event.example,
        event.passed,
        event.stimuli.as_ref().map(Value::to_string),
        event.response.as_ref().map(Value::to_string),
        event.expected.as_ref().map(Value::to_string),
        event.error_kind.clone(),
        event.error_message.clone(),
        event.requirement_ids.clone(),
        event.feature_ids.clone(),
    )
}

/// Event paired with the claims it is aggregated under
struct ResolvedEvent<'a> {
    event:  &'a TestOutcomeEvent,
    claims: Cow<'a, Association>,
}

/// Running counts for a requirement, feature or test row
#[derive(Default)]
struct Tally<'a> {
    examples:      u64,
    failed:        u64,
    first_failure: Option<&'a TestOutcomeEvent>,
}

impl<'a> Tally<'a> {
    fn add(&mut self, event: &'a TestOutcomeEvent) {
        self.examples += 1;
        if !event.passed {
            self.failed += 1;
            if self.first_failure.is_none() {
                self.first_failure = Some(event);
            }
        }
    }

    fn covered(&self) -> bool {
        self.examples > 0
    }

    fn verified(&self) -> bool {
        self.covered() && self.failed == 0
    }

    fn failure(&self) -> Option<FailureDetail> {
        self.first_failure.map(FailureDetail::from_event)
    }
}

/// Fold events into a coverage summary
pub fn summarize(
    spec: &SpecificationModel,
    registry: &TagRegistry,
    events: &[TestOutcomeEvent],
) -> CoverageSummary {
    let mut ordered: Vec<&TestOutcomeEvent> = events.iter().collect();
    ordered.sort_by_cached_key(|event| canonical_key(event));

    let mut diagnostics = BTreeSet::new();
    let resolved = resolve_claims(spec, registry, &ordered, &mut diagnostics);
    collect_missing_detail(&ordered, &mut diagnostics);

    let mut requirements = IndexMap::with_capacity(spec.len());
    for requirement in spec.requirements() {
        requirements.insert(
            requirement.id.clone(),
            summarize_requirement(requirement, &resolved),
        );
    }

    let totals = compute_totals(&requirements, events.len() as u64);
    let diagnostics: Vec<Diagnostic> = diagnostics.into_iter().collect();

    debug!(
        requirements = totals.total_requirements,
        verified = totals.verified_requirements,
        examples = totals.total_examples,
        diagnostics = diagnostics.len(),
        "coverage summary computed"
    );

    CoverageSummary {
        summary: totals,
        requirements,
        diagnostics,
    }
}

fn resolve_claims<'a>(
    spec: &SpecificationModel,
    registry: &'a TagRegistry,
    ordered: &[&'a TestOutcomeEvent],
    diagnostics: &mut BTreeSet<Diagnostic>,
) -> Vec<ResolvedEvent<'a>> {
    let mut checked_tests = BTreeSet::new();
    let mut resolved = Vec::with_capacity(ordered.len());

    for &event in ordered {
        let claims = match registry.get(&event.test_id) {
            Some(registered) => {
                if event.has_claims() && event.claims() != *registered {
                    diagnostics.insert(
                        Diagnostic::new(
                            DiagnosticCode::ClaimMismatch,
                            "event claims differ from the registered association; using the registered one",
                        )
                        .with_test(&event.test_id),
                    );
                }
                Cow::Borrowed(registered)
            },
            None => Cow::Owned(event.claims()),
        };

        // Reference checks depend only on (test, claims); run them once per pair
        if checked_tests.insert((event.test_id.as_str(), claims.clone().into_owned())) {
            check_references(spec, &event.test_id, &claims, diagnostics);
        }

        resolved.push(ResolvedEvent { event, claims });
    }

    resolved
}

fn check_references(
    spec: &SpecificationModel,
    test_id: &str,
    claims: &Association,
    diagnostics: &mut BTreeSet<Diagnostic>,
) {
    if claims.is_empty() {
        diagnostics.insert(
            Diagnostic::new(
                DiagnosticCode::UntaggedTest,
                "test claims no requirement and contributes no coverage",
            )
            .with_test(test_id),
        );
        return;
    }

    for requirement in &claims.requirements {
        if !spec.contains_requirement(requirement) {
            warn!(test = test_id, requirement = %requirement, "unknown requirement reference");
            diagnostics.insert(
                Diagnostic::new(
                    DiagnosticCode::UnknownRequirement,
                    format!("requirement `{}` is not declared", requirement),
                )
                .with_test(test_id),
            );
        }
    }

    for feature in &claims.features {
        let diagnostic = match FeatureKey::parse(feature) {
            Some(key) if spec.feature(&key.requirement, &key.feature).is_none() => Some(
                Diagnostic::new(
                    DiagnosticCode::UnknownFeature,
                    format!("feature `{}` is not declared", key),
                ),
            ),
            Some(key) if !claims.claims_requirement(&key.requirement) => Some(Diagnostic::new(
                DiagnosticCode::OrphanFeature,
                format!(
                    "feature `{}` is claimed without its requirement `{}`",
                    key, key.requirement
                ),
            )),
            Some(_) => None,
            None => {
                let declared = claims
                    .requirements
                    .iter()
                    .any(|requirement| spec.feature(requirement, feature).is_some());
                (!declared).then(|| {
                    Diagnostic::new(
                        DiagnosticCode::UnknownFeature,
                        format!(
                            "feature `{}` is not declared by any claimed requirement",
                            feature
                        ),
                    )
                })
            },
        };

        if let Some(diagnostic) = diagnostic {
            warn!(test = test_id, feature = %feature, code = %diagnostic.code, "bad feature reference");
            diagnostics.insert(diagnostic.with_test(test_id));
        }
    }
}

fn collect_missing_detail(ordered: &[&TestOutcomeEvent], diagnostics: &mut BTreeSet<Diagnostic>) {
    let mut per_test: BTreeMap<&str, (u64, BTreeSet<&'static str>)> = BTreeMap::new();

    for event in ordered {
        let missing = event.missing_failure_detail();
        if missing.is_empty() {
            continue;
        }
        let entry = per_test.entry(event.test_id.as_str()).or_default();
        entry.0 += 1;
        entry.1.extend(missing);
    }

    for (test, (count, fields)) in per_test {
        let fields: Vec<_> = fields.into_iter().collect();
        diagnostics.insert(
            Diagnostic::new(
                DiagnosticCode::MissingFailureDetail,
                format!(
                    "{} failing example(s) recorded without {}; detail unavailable",
                    count,
                    fields.join(" or ")
                ),
            )
            .with_test(test),
        );
    }
}

fn summarize_requirement(
    requirement: &Requirement,
    resolved: &[ResolvedEvent<'_>],
) -> RequirementCoverage {
    let mut tally = Tally::default();
    let mut rows: BTreeMap<&str, Tally<'_>> = BTreeMap::new();
    let mut feature_tallies: IndexMap<&str, Tally<'_>> = requirement
        .features()
        .map(|feature| (feature.id.as_str(), Tally::default()))
        .collect();

    for item in resolved
        .iter()
        .filter(|item| item.claims.claims_requirement(&requirement.id))
    {
        tally.add(item.event);
        rows.entry(item.event.test_id.as_str()).or_default().add(item.event);

        for (feature_id, feature_tally) in feature_tallies.iter_mut() {
            if item.claims.claims_feature(&requirement.id, feature_id) {
                feature_tally.add(item.event);
            }
        }
    }

    let tests = rows
        .into_iter()
        .map(|(test, row)| TestRow {
            test:            test.to_string(),
            passed:          row.failed == 0,
            examples:        row.examples,
            failed_examples: row.failed,
            failure:         row.failure(),
        })
        .collect();

    let features = requirement
        .features()
        .map(|feature| {
            let t = feature_tallies.swap_remove(feature.id.as_str()).unwrap_or_default();
            let coverage = FeatureCoverage {
                description: feature.description.clone(),
                covered:     t.covered(),
                verified:    t.verified(),
                examples:    t.examples,
                failure:     t.failure(),
            };
            (feature.id.clone(), coverage)
        })
        .collect();

    RequirementCoverage {
        description: requirement.description.clone(),
        priority: requirement.priority,
        covered: tally.covered(),
        verified: tally.verified(),
        examples: tally.examples,
        failure: tally.failure(),
        tests,
        features,
    }
}

fn compute_totals(requirements: &IndexMap<String, RequirementCoverage>, total_examples: u64) -> Totals {
    let total_requirements = requirements.len();
    let covered_requirements = requirements.values().filter(|r| r.covered).count();
    let verified_requirements = requirements.values().filter(|r| r.verified).count();

    let features = || requirements.values().flat_map(|r| r.features.values());
    let total_features = features().count();
    let covered_features = features().filter(|f| f.covered).count();
    let verified_features = features().filter(|f| f.verified).count();

    Totals {
        total_requirements,
        covered_requirements,
        verified_requirements,
        coverage_percent: percent(covered_requirements, total_requirements),
        verification_percent: percent(verified_requirements, total_requirements),
        total_features,
        covered_features,
        verified_features,
        feature_coverage_percent: percent(covered_features, total_features),
        feature_verification_percent: percent(verified_features, total_features),
        total_examples,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn spec() -> SpecificationModel {
        SpecificationModel::builder()
            .requirement("REQ-1", "reverse_string returns the reversed string", Priority::High)
            .feature("F1.1", "handles ASCII characters")
            .feature("F1.2", "handles Unicode characters")
            .requirement("REQ-2", "reversing twice returns the original", Priority::High)
            .build()
            .unwrap()
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(2, 3), 66.7);
        assert_eq!(percent(1, 3), 33.3);
        assert_eq!(percent(3, 3), 100.0);
    }

    #[test]
    fn test_empty_run_keeps_every_entry() {
        let summary = summarize(&spec(), &TagRegistry::new(), &[]);

        assert_eq!(summary.requirements.len(), 2);
        let req = &summary.requirements["REQ-1"];
        assert!(!req.covered && !req.verified);
        assert_eq!(req.features.len(), 2);
        assert!(req.features.values().all(|f| !f.covered && !f.verified));
        assert_eq!(summary.summary.verification_percent, 0.0);
        assert_eq!(summary.summary.total_features, 2);
        assert!(summary.diagnostics.is_empty());
    }

    #[test]
    fn test_requirement_without_feature_claims() {
        let events = vec![TestOutcomeEvent::passed("t").requirement("REQ-1")];
        let summary = summarize(&spec(), &TagRegistry::new(), &events);

        let req = &summary.requirements["REQ-1"];
        assert!(req.verified);
        assert!(req.features.values().all(|f| !f.covered));
        assert_eq!(req.status(), CoverageStatus::Verified);
    }

    #[test]
    fn test_registry_overrides_event_claims() {
        let mut registry = TagRegistry::new();
        registry.associate("t", ["REQ-2"], Vec::<String>::new()).unwrap();
        let events = vec![TestOutcomeEvent::passed("t").requirement("REQ-1")];

        let summary = summarize(&spec(), &registry, &events);

        assert!(!summary.requirements["REQ-1"].covered);
        assert!(summary.requirements["REQ-2"].covered);
        assert!(summary
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::ClaimMismatch));
    }

    #[test]
    fn test_unknown_references_reported_once() {
        let events: Vec<_> = (0..3)
            .map(|n| {
                TestOutcomeEvent::passed("t")
                    .requirement("REQ-1")
                    .requirement("REQ-9")
                    .feature("F9.9")
                    .feature("REQ-1/F1.7")
                    .example(n)
            })
            .collect();

        let summary = summarize(&spec(), &TagRegistry::new(), &events);

        let codes: Vec<_> = summary.diagnostics.iter().map(|d| d.code).collect();
        assert_eq!(
            codes.iter().filter(|c| **c == DiagnosticCode::UnknownRequirement).count(),
            1
        );
        assert_eq!(
            codes.iter().filter(|c| **c == DiagnosticCode::UnknownFeature).count(),
            2
        );
        // Known references still count
        assert!(summary.requirements["REQ-1"].verified);
        assert!(!summary.requirements.contains_key("REQ-9"));
    }

    #[test]
    fn test_orphan_feature_does_not_count() {
        let events = vec![TestOutcomeEvent::passed("t").requirement("REQ-2").feature("REQ-1/F1.1")];
        let summary = summarize(&spec(), &TagRegistry::new(), &events);

        assert!(!summary.requirements["REQ-1"].features["F1.1"].covered);
        assert!(summary
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::OrphanFeature));
    }

    #[test]
    fn test_untagged_test_contributes_examples_only() {
        let events = vec![TestOutcomeEvent::passed("helper")];
        let summary = summarize(&spec(), &TagRegistry::new(), &events);

        assert_eq!(summary.summary.total_examples, 1);
        assert_eq!(summary.summary.covered_requirements, 0);
        assert_eq!(summary.diagnostics[0].code, DiagnosticCode::UntaggedTest);
    }

    #[test]
    fn test_first_failure_follows_example_order() {
        let events = vec![
            TestOutcomeEvent::failed("prop")
                .requirement("REQ-1")
                .example(7)
                .stimuli(json!("late"))
                .response("x"),
            TestOutcomeEvent::failed("prop")
                .requirement("REQ-1")
                .example(3)
                .stimuli(json!("early"))
                .response("y"),
            TestOutcomeEvent::passed("prop").requirement("REQ-1").example(1),
        ];

        let summary = summarize(&spec(), &TagRegistry::new(), &events);
        let req = &summary.requirements["REQ-1"];

        assert_eq!(req.examples, 3);
        assert_eq!(req.tests.len(), 1);
        assert_eq!(req.tests[0].failed_examples, 2);
        let failure = req.failure.as_ref().unwrap();
        assert_eq!(failure.example, Some(3));
        assert_eq!(failure.stimuli, Some(json!("early")));
    }

    #[test]
    fn test_missing_detail_diagnostic() {
        let events = vec![
            TestOutcomeEvent::failed("t").requirement("REQ-1"),
            TestOutcomeEvent::failed("t").requirement("REQ-1").stimuli(1),
        ];
        let summary = summarize(&spec(), &TagRegistry::new(), &events);

        let diagnostic = summary
            .diagnostics
            .iter()
            .find(|d| d.code == DiagnosticCode::MissingFailureDetail)
            .unwrap();
        assert!(diagnostic.message.starts_with("2 failing example(s)"));
        assert!(!summary.requirements["REQ-1"].verified);
    }

    #[test]
    fn test_summary_json_shape() {
        let events = vec![TestOutcomeEvent::passed("t").requirement("REQ-1").feature("F1.1")];
        let summary = summarize(&spec(), &TagRegistry::new(), &events);
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(value["summary"]["total_requirements"], json!(2));
        assert_eq!(value["summary"]["verification_percent"], json!(50.0));
        assert_eq!(value["requirements"]["REQ-1"]["covered"], json!(true));
        assert_eq!(value["requirements"]["REQ-1"]["tests"][0]["test"], json!("t"));
        assert_eq!(
            value["requirements"]["REQ-1"]["features"]["F1.1"]["verified"],
            json!(true)
        );
        assert_eq!(value["requirements"]["REQ-2"]["covered"], json!(false));
    }
}
