//! Command handlers -- one module per subcommand

pub mod config;
pub mod generate;

use std::path::Path;

use pybom_core::config::PybomConfig;

use crate::error::CliError;

/// Load the effective configuration.
///
/// An explicitly named file must exist; the implicit `pybom.toml` falls back
/// to defaults when absent. Environment overrides are applied in both cases.
pub fn load_config(path: &Path, explicit: bool) -> Result<PybomConfig, CliError> {
    let config = if explicit {
        PybomConfig::load(path)?
    } else {
        PybomConfig::load_or_default(path)?
    };
    Ok(config)
}
