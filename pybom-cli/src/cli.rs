//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use pybom_sbom::ResolveMode;

/// Default configuration file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "pybom.toml";

/// pybom -- CycloneDX SBOM generator for Python environments.
///
/// Use `pybom <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "pybom", version, about, long_about = None)]
pub struct Cli {
    /// Path to the pybom.toml configuration file (default: ./pybom.toml if present).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format for reports and summaries.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Config file path to load and whether the user named it explicitly.
    pub fn config_path(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        }
    }
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a CycloneDX 1.5 SBOM for a Python project environment.
    Generate(GenerateArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- generate ----

/// Generate an SBOM from installed metadata, a freeze listing and the project manifest.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Project directory containing pyproject.toml (default: from config, else ".").
    pub project_dir: Option<PathBuf>,

    /// Write the SBOM to this file instead of stdout.
    #[arg(short = 'o', long = "output-file")]
    pub output_file: Option<PathBuf>,

    /// Dependency resolution mode.
    #[arg(long)]
    pub resolve_mode: Option<ResolveModeArg>,

    /// Site-packages directory to read installed metadata from (repeatable).
    #[arg(long = "site-packages", value_name = "DIR")]
    pub site_packages: Vec<PathBuf>,

    /// Python interpreter used to discover site-packages directories.
    #[arg(long, value_name = "BIN")]
    pub python: Option<String>,

    /// Skip the frozen package listing.
    #[arg(long)]
    pub no_freeze: bool,

    /// Skip reading installed package metadata.
    #[arg(long)]
    pub no_introspection: bool,
}

/// `--resolve-mode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResolveModeArg {
    /// Only packages declared by each entry.
    Direct,
    /// Full transitive closure of each entry.
    Transitive,
}

impl From<ResolveModeArg> for ResolveMode {
    fn from(arg: ResolveModeArg) -> Self {
        match arg {
            ResolveModeArg::Direct => ResolveMode::Direct,
            ResolveModeArg::Transitive => ResolveMode::Transitive,
        }
    }
}

// ---- config ----

/// Manage pybom configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, sbom).
        #[arg(long)]
        section: Option<String>,
    },
}
