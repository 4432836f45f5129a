//! Command-line interface
//!
//! - Argument parsing with clap
//! - Configuration merging (CLI args + config files)
//! - Command execution for `serve`, `migrate` and `send`

pub mod config_merger;
pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use config_merger::ConfigurationMerger;
pub use executor::execute_command;
pub use parser::{ChannelArg, Cli, Commands, Environment, LogLevel};

use anyhow::Context;

use crate::config::Settings;
use crate::logger::init_logger;

/// Loads configuration from files and environment, then applies CLI overrides.
///
/// # Errors
/// Configuration loading, merging or validation failures
pub fn load_and_merge_config(cli: &Cli) -> anyhow::Result<Settings> {
    let merger = ConfigurationMerger::from_cli(cli).context("Configuration error")?;
    merger
        .merge_cli_args(cli)
        .context("Configuration merge error")
}

/// Installs the global tracing subscriber from the logger settings.
pub fn init_logger_from_settings(settings: &Settings) -> anyhow::Result<()> {
    let logger_config = settings
        .logger
        .clone()
        .into_logger_config()
        .context("Logger configuration error")?;
    init_logger(logger_config).context("Logger initialization error")
}
