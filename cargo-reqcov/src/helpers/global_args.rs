//! Global argument propagation helper

use std::{
    io::IsTerminal,
    path::PathBuf,
};

use anyhow::{
    Context,
    Result,
};
use reqcov_core::ReqcovConfig;

/// Global arguments shared by every subcommand
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    /// Explicit configuration file
    pub config:   Option<PathBuf>,
    /// Color output was disabled on the command line
    pub no_color: bool,
}

impl GlobalArgs {
    /// Collect the global flags parsed by clap
    pub fn from_cli(config: Option<PathBuf>, no_color: bool) -> Self {
        Self { config, no_color }
    }

    /// Whether stdout output should be colored
    pub fn use_colors(&self) -> bool {
        !self.no_color && std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
    }

    /// Load the explicit configuration file, or discover one in the current
    /// directory
    pub fn load_config(&self) -> Result<ReqcovConfig> {
        match &self.config {
            Some(path) => ReqcovConfig::load(path)
                .with_context(|| format!("Failed to load config file: {}", path.display())),
            None => {
                let cwd = std::env::current_dir().context("Failed to read current directory")?;
                ReqcovConfig::discover(&cwd).context("Failed to load reqcov.toml")
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_color_flag_disables_colors() {
        let args = GlobalArgs::from_cli(None, true);
        assert!(!args.use_colors());
    }

    #[test]
    fn test_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ci.toml");
        std::fs::write(&path, "[gate]\nmin_verification = 50.0\n").unwrap();

        let args = GlobalArgs::from_cli(Some(path), true);
        assert_eq!(args.load_config().unwrap().gate.min_verification, 50.0);

        let missing = GlobalArgs::from_cli(Some(dir.path().join("absent.toml")), true);
        assert!(missing.load_config().is_err());
    }
}
