//! Property-based tests for the aggregation fold
//!
//! Events are drawn from small pools of test, requirement and feature
//! identifiers (including undeclared ones) so that collisions, duplicate
//! claims and dangling references all show up in generated runs.

use proptest::prelude::*;
use reqcov_core::{
    Priority,
    SpecificationModel,
    TagRegistry,
    TestOutcomeEvent,
    summarize,
};

fn spec() -> SpecificationModel {
    SpecificationModel::builder()
        .requirement("REQ-1", "reverse_string returns the reversed string", Priority::High)
        .feature("F1.1", "handles ASCII characters")
        .feature("F1.2", "handles Unicode characters")
        .requirement("REQ-2", "reversing twice returns the original", Priority::High)
        .feature("F2.1", "ASCII round trip")
        .requirement("REQ-3", "reverse_string handles empty strings", Priority::Medium)
        .build()
        .unwrap()
}

fn registry() -> TagRegistry {
    let mut registry = TagRegistry::new();
    registry.associate("t0", ["REQ-1"], ["F1.1"]).unwrap();
    registry
}

const TESTS: &[&str] = &["t0", "t1", "t2", "t3[a]", "t3[b]"];
const REQUIREMENTS: &[&str] = &["REQ-1", "REQ-2", "REQ-3", "REQ-404"];
const FEATURES: &[&str] = &["F1.1", "F1.2", "F2.1", "REQ-1/F1.2", "REQ-2/F2.1", "F9.9"];

fn event_strategy() -> impl Strategy<Value = TestOutcomeEvent> {
    (
        prop::sample::select(TESTS),
        prop::sample::subsequence(REQUIREMENTS, 0..=2),
        prop::sample::subsequence(FEATURES, 0..=2),
        any::<bool>(),
        prop::option::of(0u64..4),
        prop::option::of("[a-z]{0,3}"),
    )
        .prop_map(|(test, requirements, features, passed, example, stimuli)| {
            let mut event = if passed {
                TestOutcomeEvent::passed(test)
            } else {
                TestOutcomeEvent::failed(test).response("x")
            };
            for requirement in requirements {
                event = event.requirement(requirement);
            }
            for feature in features {
                event = event.feature(feature);
            }
            if let Some(example) = example {
                event = event.example(example);
            }
            if let Some(stimuli) = stimuli {
                event = event.stimuli(stimuli);
            }
            event
        })
}

fn events_strategy() -> impl Strategy<Value = Vec<TestOutcomeEvent>> {
    prop::collection::vec(event_strategy(), 0..24)
}

proptest! {
    #[test]
    fn permutation_does_not_change_summary(
        (events, shuffled) in events_strategy()
            .prop_flat_map(|events| (Just(events.clone()), Just(events).prop_shuffle()))
    ) {
        let spec = spec();
        let registry = registry();
        prop_assert_eq!(
            summarize(&spec, &registry, &events),
            summarize(&spec, &registry, &shuffled)
        );
    }

    #[test]
    fn folding_is_idempotent(events in events_strategy()) {
        let spec = spec();
        let registry = registry();
        let first = summarize(&spec, &registry, &events);
        let second = summarize(&spec, &registry, &events);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn every_declared_entry_is_present(events in events_strategy()) {
        let spec = spec();
        let summary = summarize(&spec, &registry(), &events);

        let ids: Vec<_> = summary.requirements.keys().map(String::as_str).collect();
        prop_assert_eq!(ids, vec!["REQ-1", "REQ-2", "REQ-3"]);
        prop_assert_eq!(summary.summary.total_features, 3);
        prop_assert_eq!(summary.summary.total_examples, events.len() as u64);
        prop_assert!(summary.summary.verified_requirements <= summary.summary.covered_requirements);
        prop_assert!(summary.summary.verified_features <= summary.summary.covered_features);
    }

    #[test]
    fn failing_an_event_never_raises_verification(
        events in prop::collection::vec(event_strategy(), 1..24),
        index in any::<prop::sample::Index>(),
    ) {
        let spec = spec();
        let registry = registry();
        let before = summarize(&spec, &registry, &events);

        let mut degraded = events.clone();
        let i = index.index(degraded.len());
        degraded[i].passed = false;
        let after = summarize(&spec, &registry, &degraded);

        prop_assert!(after.summary.verification_percent <= before.summary.verification_percent);
        prop_assert!(
            after.summary.feature_verification_percent
                <= before.summary.feature_verification_percent
        );
        prop_assert_eq!(after.summary.coverage_percent, before.summary.coverage_percent);
    }

    #[test]
    fn empty_specification_reports_nothing_covered(events in events_strategy()) {
        let summary = summarize(&SpecificationModel::default(), &TagRegistry::new(), &events);

        prop_assert!(summary.requirements.is_empty());
        prop_assert_eq!(summary.summary.total_requirements, 0);
        prop_assert_eq!(summary.summary.verification_percent, 0.0);
        prop_assert_eq!(summary.summary.feature_verification_percent, 0.0);
    }
}

#[test]
fn empty_run_leaves_everything_uncovered() {
    let summary = summarize(&spec(), &registry(), &[]);

    assert!(summary.requirements.values().all(|r| !r.covered && !r.verified));
    assert!(summary
        .requirements
        .values()
        .flat_map(|r| r.features.values())
        .all(|f| !f.covered));
    assert_eq!(summary.summary.coverage_percent, 0.0);
    assert_eq!(summary.summary.verification_percent, 0.0);
}
