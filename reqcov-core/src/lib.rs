//! reqcov Core - Requirement coverage aggregation and reporting
//!
//! This library links executable test outcomes to a declared set of
//! requirements and their features, folds the outcomes of a run (including
//! every generated example of a property-based test) into a coverage
//! summary, renders that summary into several report formats and decides a
//! pass/fail CI gate.
//!
//! # Architecture
//!
//! Data flows one way through the crate:
//!
//! - **Specification**: [`SpecificationModel`] holds the declared
//!   requirements and features, loaded once per run
//! - **Tagging**: [`TagRegistry`] maps a test identifier to the IDs it claims
//! - **Recording**: [`EventSink`] is the narrow entry point a host test engine
//!   reports each [`TestOutcomeEvent`] through
//! - **Aggregation**: [`summarize`] folds events into a [`CoverageSummary`]
//! - **Reporting**: [`formatters`] render a [`CoverageReport`] as JSON, HTML,
//!   Markdown or a plain-text table
//! - **Gating**: [`gate::evaluate`] compares the summary with thresholds
//!
//! [`RunContext`] ties these together for a single run.
//!
//! # Example
//!
//! ```
//! use reqcov_core::{
//!     EventSink, GateThresholds, Priority, RunContext, SpecificationModel, TestOutcomeEvent,
//!     TestTags, gate,
//! };
//!
//! let spec = SpecificationModel::builder()
//!     .requirement("REQ-1", "reverse_string returns the reversed string", Priority::High)
//!     .feature("F1.1", "handles ASCII characters")
//!     .build()?;
//!
//! let mut run = RunContext::new(spec);
//! run.register(TestTags::new("test_ascii").requirement("REQ-1").feature("F1.1"))?;
//! run.record(TestOutcomeEvent::passed("test_ascii"));
//!
//! let report = run.finalize();
//! assert!(gate::evaluate_report(&report, &GateThresholds::default()).passed());
//! # Ok::<(), reqcov_core::ReqcovError>(())
//! ```

#![forbid(unsafe_code)]
// Lints configured in Cargo.toml

pub mod aggregate;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod formatters;
pub mod gate;
pub mod recorder;
pub mod registry;
pub mod report;
pub mod requirements;
pub mod run;

// Public API
pub use aggregate::{
    CoverageStatus,
    CoverageSummary,
    summarize,
};
pub use config::ReqcovConfig;
pub use diagnostics::{
    Diagnostic,
    DiagnosticCode,
    Severity,
};
pub use error::{
    ReqcovError,
    ReqcovResult,
};
pub use formatters::{
    Document,
    OutputFormat,
};
pub use gate::{
    GateResult,
    GateThresholds,
};
pub use recorder::{
    EventSink,
    EventStream,
    OutcomeRecorder,
    SharedRecorder,
    TestOutcomeEvent,
};
pub use registry::{
    Association,
    TagRegistry,
    TestTags,
};
pub use report::CoverageReport;
pub use requirements::{
    Priority,
    SpecificationModel,
};
pub use run::RunContext;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
