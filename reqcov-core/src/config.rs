//! Configuration for reqcov runs and tooling

use std::path::{
    Path,
    PathBuf,
};

use serde::{
    Deserialize,
    Serialize,
};
use tracing::debug;

use crate::{
    error::{
        ReqcovError,
        ReqcovResult,
    },
    formatters::{
        OutputFormat,
        TableOptions,
    },
    gate::GateThresholds,
};

/// Conventional configuration file name
pub const CONFIG_FILE_NAME: &str = "reqcov.toml";

/// Report output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Title printed at the top of every report
    pub title:      Option<String>,
    /// Directory the report documents are written to
    pub output_dir: PathBuf,
    /// Documents written at the end of a run
    pub formats:    Vec<OutputFormat>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title:      None,
            output_dir: PathBuf::from("."),
            formats:    OutputFormat::REPORTS.to_vec(),
        }
    }
}

/// Contents of `reqcov.toml`
///
/// Every table and field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReqcovConfig {
    /// Gate thresholds
    pub gate:   GateThresholds,
    /// Table renderer options
    pub table:  TableOptions,
    /// Report output
    pub report: ReportConfig,
}

impl ReqcovConfig {
    /// Parse a configuration document
    ///
    /// Gate thresholds are validated here, so a bad value is a configuration
    /// error instead of a gate decision.
    pub fn from_toml_str(content: &str) -> ReqcovResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ReqcovError::Config(e.to_string()))?;
        config.gate.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> ReqcovResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ReqcovError::io(path, e))?;
        Self::from_toml_str(&content)
            .map_err(|e| ReqcovError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load the first configuration file found under `dir`, or the defaults
    pub fn discover(dir: &Path) -> ReqcovResult<Self> {
        let candidates = [
            dir.join(CONFIG_FILE_NAME),
            dir.join(format!(".{}", CONFIG_FILE_NAME)),
            dir.join(".config").join(CONFIG_FILE_NAME),
        ];

        for candidate in &candidates {
            if candidate.is_file() {
                debug!(path = %candidate.display(), "using configuration file");
                return Self::load(candidate);
            }
        }

        debug!(dir = %dir.display(), "no configuration file, using defaults");
        Ok(Self::default())
    }
}
