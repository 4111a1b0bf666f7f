//! `uncovered` command

use std::path::Path;

use anyhow::Result;
use reqcov_core::formatters::uncovered;

use super::load_report;
use crate::EXIT_SUCCESS;

/// Print the uncovered requirements and features of a stored report
pub fn cmd_uncovered(report_path: &Path) -> Result<i32> {
    let report = load_report(report_path)?;
    print!("{}", uncovered::render(&report));
    Ok(EXIT_SUCCESS)
}
