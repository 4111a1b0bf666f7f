//! `render` command

use std::path::Path;

use anyhow::{
    Context,
    Result,
};
use reqcov_core::{
    OutputFormat,
    ReqcovConfig,
    formatters,
};

use super::load_report;
use crate::{
    EXIT_SUCCESS,
    helpers::{
        OutputManager,
        resolve_out_dir,
    },
};

fn parse_formats(format: &str, config: &ReqcovConfig) -> Result<Vec<OutputFormat>> {
    if format.eq_ignore_ascii_case("all") {
        return Ok(config.report.formats.clone());
    }
    format
        .split(',')
        .map(|f| f.trim().parse::<OutputFormat>().map_err(anyhow::Error::from))
        .collect()
}

/// Render a stored report into the requested formats
pub fn cmd_render(
    report_path: &Path,
    format: &str,
    out_dir: Option<&Path>,
    title: Option<String>,
    stdout: bool,
    config: &ReqcovConfig,
    output: &OutputManager,
) -> Result<i32> {
    let mut report = load_report(report_path)?;
    if let Some(title) = title.or_else(|| config.report.title.clone()) {
        report.title = Some(title);
    }

    let formats = parse_formats(format, config)?;
    let out_dir = resolve_out_dir(config, out_dir);

    for format in formats {
        let document = formatters::render_with(&report, format, &config.table);
        if stdout {
            print!("{}", document.body);
        } else {
            let path = document
                .write_to(&out_dir)
                .with_context(|| format!("Failed to write {} report", format))?;
            output.success(&format!("{} report: {}", format, path.display()));
        }
    }

    Ok(EXIT_SUCCESS)
}
