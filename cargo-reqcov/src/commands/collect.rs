//! `collect` command

use std::{
    fs::File,
    io::BufReader,
    path::Path,
};

use anyhow::{
    Context,
    Result,
};
use reqcov_core::{
    ReqcovConfig,
    diagnostics::DiagnosticSummary,
    RunContext,
    SpecificationModel,
    TagRegistry,
    formatters,
    recorder::read_json_lines,
};
use tracing::info;

use crate::{
    EXIT_SUCCESS,
    helpers::{
        OutputManager,
        resolve_out_dir,
    },
};

/// Aggregate a JSON-lines event stream and write the configured reports
pub fn cmd_collect(
    spec_path: &Path,
    events_path: &Path,
    tags_path: Option<&Path>,
    out_dir: Option<&Path>,
    title: Option<String>,
    config: &ReqcovConfig,
    output: &OutputManager,
) -> Result<i32> {
    let spec = SpecificationModel::load(spec_path)
        .with_context(|| format!("Invalid specification: {}", spec_path.display()))?;

    let registry = match tags_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read tag file: {}", path.display()))?;
            TagRegistry::from_toml_str(&content)
                .with_context(|| format!("Invalid tag file: {}", path.display()))?
        },
        None => TagRegistry::new(),
    };

    let file = File::open(events_path)
        .with_context(|| format!("Failed to open events file: {}", events_path.display()))?;
    let stream = read_json_lines(BufReader::new(file))
        .with_context(|| format!("Failed to read events file: {}", events_path.display()))?;
    info!(
        events = stream.events.len(),
        rejected = stream.rejected.len(),
        "read outcome events"
    );

    let mut run = RunContext::new(spec).with_registry(registry);
    if let Some(title) = title.or_else(|| config.report.title.clone()) {
        run = run.with_title(title);
    }
    run.extend(stream.events);
    for rejected in &stream.rejected {
        run.note(rejected.to_diagnostic());
    }
    let report = run.finalize();

    let out_dir = resolve_out_dir(config, out_dir);
    for format in &config.report.formats {
        let document = formatters::render_with(&report, *format, &config.table);
        let path = document
            .write_to(&out_dir)
            .with_context(|| format!("Failed to write {} report", format))?;
        output.item(&format!("{} report: {}", format, path.display()));
    }

    let totals = &report.coverage.summary;
    output.success(&format!(
        "{}/{} requirements verified ({:.1}%), {} examples",
        totals.verified_requirements,
        totals.total_requirements,
        totals.verification_percent,
        totals.total_examples
    ));
    if !stream.rejected.is_empty() {
        output.warning(&format!(
            "{} event line(s) in {} could not be decoded",
            stream.rejected.len(),
            events_path.display()
        ));
    }
    let counts = DiagnosticSummary::from_diagnostics(&report.coverage.diagnostics);
    if counts.has_errors() {
        output.warning(&format!(
            "{} unknown reference(s); claims on undeclared IDs were not counted",
            counts.errors
        ));
    }
    for diagnostic in &report.coverage.diagnostics {
        output.diagnostic(diagnostic);
    }

    Ok(EXIT_SUCCESS)
}
