//! Merging of configuration file values with command-line arguments
//!
//! Command-line values win; anything left unset falls back to `reqcov.toml`
//! and then to the library defaults.

use std::path::{
    Path,
    PathBuf,
};

use anyhow::{
    Context,
    Result,
};
use reqcov_core::{
    GateThresholds,
    ReqcovConfig,
};

/// Gate thresholds from config, overridden by explicit arguments
///
/// The merged thresholds are validated; a NaN or out-of-range value is a tool
/// error, never a gate decision.
pub fn merge_thresholds(
    config: &ReqcovConfig,
    min_verification: Option<f64>,
    min_feature_verification: Option<f64>,
    min_coverage: Option<f64>,
    require_requirements: bool,
) -> Result<GateThresholds> {
    let base = &config.gate;
    let thresholds = GateThresholds {
        min_verification:         min_verification.unwrap_or(base.min_verification),
        min_feature_verification: min_feature_verification.or(base.min_feature_verification),
        min_coverage:             min_coverage.or(base.min_coverage),
        require_requirements:     require_requirements || base.require_requirements,
    };
    thresholds.validate().context("Invalid gate thresholds")?;
    Ok(thresholds)
}

/// Output directory from the argument or the config
pub fn resolve_out_dir(config: &ReqcovConfig, out_dir: Option<&Path>) -> PathBuf {
    out_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.report.output_dir.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arguments_override_config() {
        let config = ReqcovConfig::from_toml_str(
            "[gate]\nmin_verification = 80.0\nmin_coverage = 90.0\n",
        )
        .unwrap();

        let merged = merge_thresholds(&config, Some(99.0), Some(50.0), None, false).unwrap();
        assert_eq!(merged.min_verification, 99.0);
        assert_eq!(merged.min_feature_verification, Some(50.0));
        assert_eq!(merged.min_coverage, Some(90.0));
        assert!(!merged.require_requirements);

        let merged = merge_thresholds(&config, None, None, None, true).unwrap();
        assert_eq!(merged.min_verification, 80.0);
        assert!(merged.require_requirements);
    }

    #[test]
    fn test_invalid_argument_thresholds_are_errors() {
        let config = ReqcovConfig::default();
        assert!(merge_thresholds(&config, Some(f64::NAN), None, None, false).is_err());
        assert!(merge_thresholds(&config, None, Some(250.0), None, false).is_err());
        assert!(merge_thresholds(&config, None, None, Some(-5.0), false).is_err());
    }

    #[test]
    fn test_out_dir_resolution() {
        let config = ReqcovConfig::from_toml_str("[report]\noutput_dir = \"reports\"\n").unwrap();
        assert_eq!(resolve_out_dir(&config, None), PathBuf::from("reports"));
        assert_eq!(
            resolve_out_dir(&config, Some(Path::new("elsewhere"))),
            PathBuf::from("elsewhere")
        );
    }
}
