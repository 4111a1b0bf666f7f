//! Outcome recording
//!
//! A host test engine adapts to [`EventSink`] and calls `record` once per
//! completed test invocation, or once per generated example of a
//! property-based test. Records are appended and never rejected: a failure
//! without stimuli or response is still kept, with a note, because the
//! coverage report must not fail closed when the engine misbehaves.

use std::{
    collections::BTreeSet,
    io::BufRead,
    sync::{
        Arc,
        Mutex,
        PoisonError,
    },
};

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
    error::{
        ReqcovError,
        ReqcovResult,
    },
    registry::Association,
};

/// One completed test invocation or generated example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcomeEvent {
    /// Stable test name, optionally parameterized (`test_x[input]`)
    pub test_id:         String,
    /// Requirement IDs claimed by the event
    #[serde(default)]
    pub requirement_ids: BTreeSet<String>,
    /// Feature IDs claimed by the event
    #[serde(default)]
    pub feature_ids:     BTreeSet<String>,
    /// Whether the invocation passed
    pub passed:          bool,
    /// Input value(s) passed to the test
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stimuli:         Option<Value>,
    /// Actual returned or observed value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response:        Option<Value>,
    /// Expected value, when statically known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected:        Option<Value>,
    /// Short failure classifier, e.g. `assertion`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind:      Option<String>,
    /// Human-readable failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message:   Option<String>,
    /// Example ordinal within a property-based test
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example:         Option<u64>,
    /// Note attached by the recorder when the record is incomplete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic:      Option<String>,
}

impl TestOutcomeEvent {
    fn new(test_id: impl Into<String>, passed: bool) -> Self {
        Self {
            test_id: test_id.into(),
            requirement_ids: BTreeSet::new(),
            feature_ids: BTreeSet::new(),
            passed,
            stimuli: None,
            response: None,
            expected: None,
            error_kind: None,
            error_message: None,
            example: None,
            diagnostic: None,
        }
    }

    /// A passing outcome
    pub fn passed(test_id: impl Into<String>) -> Self {
        Self::new(test_id, true)
    }

    /// A failing outcome
    pub fn failed(test_id: impl Into<String>) -> Self {
        Self::new(test_id, false)
    }

    /// Claim a requirement
    pub fn requirement(mut self, id: impl Into<String>) -> Self {
        self.requirement_ids.insert(id.into());
        self
    }

    /// Claim a feature
    pub fn feature(mut self, id: impl Into<String>) -> Self {
        self.feature_ids.insert(id.into());
        self
    }

    /// Captured input value(s)
    pub fn stimuli(mut self, value: impl Into<Value>) -> Self {
        self.stimuli = Some(value.into());
        self
    }

    /// Captured actual value
    pub fn response(mut self, value: impl Into<Value>) -> Self {
        self.response = Some(value.into());
        self
    }

    /// Captured expected value
    pub fn expected(mut self, value: impl Into<Value>) -> Self {
        self.expected = Some(value.into());
        self
    }

    /// Failure classifier and message
    pub fn error(mut self, kind: impl Into<String>, message: impl Into<String>) -> Self {
        self.error_kind = Some(kind.into());
        self.error_message = Some(message.into());
        self
    }

    /// Example ordinal within a property-based test
    pub fn example(mut self, ordinal: u64) -> Self {
        self.example = Some(ordinal);
        self
    }

    /// Claims carried by the event itself
    pub fn claims(&self) -> Association {
        Association {
            requirements: self.requirement_ids.clone(),
            features:     self.feature_ids.clone(),
        }
    }

    /// Whether the event carries any claim
    pub fn has_claims(&self) -> bool {
        !self.requirement_ids.is_empty() || !self.feature_ids.is_empty()
    }

    /// Failure detail fields a failing event lacks
    pub fn missing_failure_detail(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.passed {
            return missing;
        }
        if self.stimuli.is_none() {
            missing.push("stimuli");
        }
        if self.response.is_none() {
            missing.push("response");
        }
        missing
    }
}

/// Narrow entry point a host test engine reports outcomes through
pub trait EventSink {
    /// Append one outcome
    fn record(&mut self, event: TestOutcomeEvent);

    /// Append several outcomes in order
    fn record_all<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = TestOutcomeEvent>,
        Self: Sized,
    {
        for event in events {
            self.record(event);
        }
    }
}

/// Run-scoped, append-only event sequence
#[derive(Debug, Clone, Default)]
pub struct OutcomeRecorder {
    events: Vec<TestOutcomeEvent>,
}

impl OutcomeRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events in arrival order
    pub fn events(&self) -> &[TestOutcomeEvent] {
        &self.events
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Consume the recorder, returning the sequence
    pub fn into_events(self) -> Vec<TestOutcomeEvent> {
        self.events
    }

    fn append(&mut self, mut event: TestOutcomeEvent) {
        let missing = event.missing_failure_detail();
        if !missing.is_empty() {
            warn!(
                test = %event.test_id,
                missing = ?missing,
                "failure recorded without detail"
            );
            event.diagnostic = Some(format!(
                "failure detail unavailable: missing {}",
                missing.join(", ")
            ));
        }

        debug!(
            test = %event.test_id,
            passed = event.passed,
            sequence = self.events.len(),
            "recorded outcome"
        );
        self.events.push(event);
    }
}

impl EventSink for OutcomeRecorder {
    fn record(&mut self, event: TestOutcomeEvent) {
        self.append(event);
    }
}

impl Extend<TestOutcomeEvent> for OutcomeRecorder {
    fn extend<T: IntoIterator<Item = TestOutcomeEvent>>(&mut self, iter: T) {
        for event in iter {
            self.append(event);
        }
    }
}

/// Cloneable recorder handle for engines reporting from several threads
///
/// Appends are serialized behind a mutex. A poisoned lock is recovered
/// rather than dropping the event.
#[derive(Debug, Clone, Default)]
pub struct SharedRecorder {
    inner: Arc<Mutex<OutcomeRecorder>>,
}

impl SharedRecorder {
    /// Create an empty shared recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one outcome
    pub fn record(&self, event: TestOutcomeEvent) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .append(event);
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the sequence recorded so far, for aggregation
    pub fn snapshot_events(&self) -> Vec<TestOutcomeEvent> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .events()
            .to_vec()
    }
}

impl EventSink for SharedRecorder {
    fn record(&mut self, event: TestOutcomeEvent) {
        SharedRecorder::record(self, event);
    }
}

/// A streamed line that did not decode into an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    /// One-based line number in the stream
    pub line:    usize,
    /// `test_id` of the record, when the line is a JSON object carrying one
    pub test_id: Option<String>,
    /// Decoder error
    pub error:   String,
}

impl RejectedLine {
    /// Diagnostic carried into the report for this line
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::new(
            DiagnosticCode::UndecodableEvent,
            format!("event on line {} could not be decoded: {}", self.line, self.error),
        );
        match &self.test_id {
            Some(test_id) => diagnostic.with_test(test_id),
            None => diagnostic,
        }
    }
}

/// Decoded events together with the lines that could not be decoded
#[derive(Debug, Clone, Default)]
pub struct EventStream {
    /// Events in stream order
    pub events:   Vec<TestOutcomeEvent>,
    /// Lines that were not events
    pub rejected: Vec<RejectedLine>,
}

/// Read events streamed by an engine as JSON lines
///
/// Blank lines are ignored. A line that does not decode is returned in
/// [`EventStream::rejected`] so the caller can report it; only I/O failures
/// are errors.
pub fn read_json_lines<R: BufRead>(reader: R) -> ReqcovResult<EventStream> {
    let mut stream = EventStream::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| ReqcovError::io(std::path::Path::new("<events>"), e))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<TestOutcomeEvent>(line) {
            Ok(event) => stream.events.push(event),
            Err(e) => {
                warn!(line = index + 1, error = %e, "undecodable event");
                let test_id = serde_json::from_str::<Value>(line)
                    .ok()
                    .and_then(|value| value.get("test_id")?.as_str().map(str::to_string));
                stream.rejected.push(RejectedLine {
                    line: index + 1,
                    test_id,
                    error: e.to_string(),
                });
            },
        }
    }

    Ok(stream)
}
