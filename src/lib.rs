// Scaleup - piano piece complexity features
// Main library entry point

pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod corpus;
pub mod events;
pub mod features;

use std::process::ExitCode;

use crate::cli::{Cli, Command};
use crate::config::{default_config_path, Config};

/// Dispatch a parsed command line
pub fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = Config::load_or_default(&config_path);
    log::debug!("Using config from {}", config_path.display());

    match cli.command {
        Command::Extract(args) => commands::extract(args, &config),
        Command::Features { file } => commands::features(&file).map(|_| ExitCode::SUCCESS),
        Command::Convert { midi, output } => {
            commands::convert(&midi, output).map(|_| ExitCode::SUCCESS)
        }
        Command::Recommend(args) => commands::recommend(args, &config).map(|_| ExitCode::SUCCESS),
        Command::Ranges { catalog } => commands::ranges(&catalog).map(|_| ExitCode::SUCCESS),
    }
}
