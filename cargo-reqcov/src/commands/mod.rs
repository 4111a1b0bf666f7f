//! Subcommand implementations
//!
//! Each handler returns the process exit code on success; an `Err` is a tool
//! failure and maps to exit code 2 in `main`.

mod check_spec;
mod collect;
mod gate;
mod render;
mod uncovered;

use std::path::Path;

use anyhow::{
    Context,
    Result,
};
pub use check_spec::cmd_check_spec;
pub use collect::cmd_collect;
pub use gate::cmd_gate;
pub use render::cmd_render;
use reqcov_core::CoverageReport;
pub use uncovered::cmd_uncovered;

/// Read a machine-readable coverage report
fn load_report(path: &Path) -> Result<CoverageReport> {
    CoverageReport::load(path)
        .with_context(|| format!("Failed to read coverage report: {}", path.display()))
}
