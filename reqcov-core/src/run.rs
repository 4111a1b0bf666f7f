//! Run-scoped coverage context
//!
//! A [`RunContext`] owns everything one test run accumulates: the
//! specification, the tag registry, the event sequence and any diagnostics
//! raised before an event reached the recorder. Host engines feed
//! it through [`EventSink`]; [`RunContext::finalize`] consumes it, so a
//! finished run cannot be appended to or reported twice.

use tracing::info;

use crate::{
    aggregate::{
        CoverageSummary,
        summarize,
    },
    diagnostics::Diagnostic,
    error::ReqcovResult,
    recorder::{
        EventSink,
        OutcomeRecorder,
        TestOutcomeEvent,
    },
    registry::{
        TagRegistry,
        TestTags,
    },
    report::CoverageReport,
    requirements::SpecificationModel,
};

/// State of one test run
#[derive(Debug, Clone)]
pub struct RunContext {
    spec:     SpecificationModel,
    registry: TagRegistry,
    recorder: OutcomeRecorder,
    intake:   Vec<Diagnostic>,
    title:    Option<String>,
}

impl RunContext {
    /// Start a run against a loaded specification
    pub fn new(spec: SpecificationModel) -> Self {
        Self {
            spec,
            registry: TagRegistry::new(),
            recorder: OutcomeRecorder::new(),
            intake: Vec::new(),
            title: None,
        }
    }

    /// Use associations declared ahead of the run
    pub fn with_registry(mut self, registry: TagRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Title carried into the finalized report
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Declare the claims of a test
    pub fn associate<R, F>(
        &mut self,
        test_id: impl Into<String>,
        requirements: R,
        features: F,
    ) -> ReqcovResult<()>
    where
        R: IntoIterator,
        R::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        self.registry.associate(test_id, requirements, features)
    }

    /// Declare the claims of a test from a builder
    pub fn register(&mut self, tags: TestTags) -> ReqcovResult<()> {
        tags.register(&mut self.registry)
    }

    /// Specification the run is measured against
    pub fn spec(&self) -> &SpecificationModel {
        &self.spec
    }

    /// Declared associations
    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    /// Every event recorded so far, in arrival order
    pub fn events(&self) -> &[TestOutcomeEvent] {
        self.recorder.events()
    }

    /// Attach a diagnostic raised outside aggregation, such as an event
    /// record the engine emitted but that could not be decoded
    pub fn note(&mut self, diagnostic: Diagnostic) {
        self.intake.push(diagnostic);
    }

    /// Summary of the events recorded so far
    pub fn snapshot(&self) -> CoverageSummary {
        let mut summary = summarize(&self.spec, &self.registry, self.recorder.events());
        if !self.intake.is_empty() {
            summary.diagnostics.extend(self.intake.iter().cloned());
            summary.diagnostics.sort();
            summary.diagnostics.dedup();
        }
        summary
    }

    /// Close the run and produce its report
    pub fn finalize(self) -> CoverageReport {
        let summary = self.snapshot();
        let totals = &summary.summary;
        info!(
            events = self.recorder.len(),
            requirements = totals.total_requirements,
            verified = totals.verified_requirements,
            verification_percent = totals.verification_percent,
            "run finalized"
        );

        let report = CoverageReport::stamped(summary);
        match self.title {
            Some(title) => report.with_title(title),
            None => report,
        }
    }
}

impl EventSink for RunContext {
    fn record(&mut self, event: TestOutcomeEvent) {
        self.recorder.record(event);
    }
}

impl Extend<TestOutcomeEvent> for RunContext {
    fn extend<T: IntoIterator<Item = TestOutcomeEvent>>(&mut self, iter: T) {
        self.recorder.extend(iter);
    }
}
