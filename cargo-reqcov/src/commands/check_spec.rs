//! `check-spec` command

use std::path::Path;

use anyhow::{
    Context,
    Result,
};
use reqcov_core::SpecificationModel;

use crate::{
    EXIT_SUCCESS,
    helpers::OutputManager,
};

/// Load a specification file and print what it declares
pub fn cmd_check_spec(spec_path: &Path, output: &OutputManager) -> Result<i32> {
    let spec = SpecificationModel::load(spec_path)
        .with_context(|| format!("Invalid specification: {}", spec_path.display()))?;

    output.success(&format!(
        "{}: {} requirements, {} features",
        spec_path.display(),
        spec.len(),
        spec.feature_count()
    ));
    for requirement in spec.requirements() {
        output.item(&format!(
            "{} [{}] {} ({} features)",
            requirement.id,
            requirement.priority,
            requirement.description,
            requirement.feature_count()
        ));
    }

    Ok(EXIT_SUCCESS)
}
