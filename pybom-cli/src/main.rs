//! pybom -- CycloneDX SBOM generator for Python environments.

use clap::Parser;

use pybom_cli::cli::{Cli, Commands};
use pybom_cli::commands;
use pybom_cli::error::CliError;
use pybom_cli::logging;
use pybom_cli::output::OutputWriter;
use pybom_core::config::{GeneralConfig, PybomConfig};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let (config_path, explicit) = cli.config_path();
    let loaded = commands::load_config(&config_path, explicit);

    // `config validate` reports a broken file itself, so logging falls back to defaults.
    let mut general = match &loaded {
        Ok(config) => config.general.clone(),
        Err(_) => GeneralConfig::default(),
    };
    if let Some(level) = cli.log_level.clone() {
        general.log_level = level;
    }
    if let Err(e) = logging::init_tracing(&general) {
        eprintln!("warning: {e}");
    }
    pybom_core::metrics::describe_all();

    tracing::debug!(config = %config_path.display(), explicit, "pybom starting");

    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Generate(args) => {
            let config: PybomConfig = loaded?;
            commands::generate::execute(args, &config, &writer)
        }
        Commands::Config(args) => {
            commands::config::execute(args, &config_path, explicit, &writer)
        }
    }
}
