//! Logging built on `tracing-subscriber`.
//!
//! - Console output, colored only when stdout is a terminal
//! - Optional file output (full, compact or JSON) through a size-rotating writer
//! - `RUST_LOG` directives override the configured level

pub mod config;
pub mod error;
pub(crate) mod writer;

pub use config::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig, RotationConfig};
pub use error::LoggerError;

use std::io::IsTerminal;

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use writer::RotatingFileWriter;

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

/// Installs the global subscriber described by `config`.
///
/// # Errors
/// * `LoggerError::Config` - invalid level or no output enabled
/// * `LoggerError::Io` - the log file cannot be opened
/// * `LoggerError::Init` - a global subscriber is already installed
pub fn init_logger(config: LoggerConfig) -> Result<(), LoggerError> {
    config.validate()?;

    let filter = build_filter(&config.level);

    // The file layer goes first so the console layer's ANSI setting does not
    // leak escape codes into span fields written to the file.
    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);
    if config.file.enabled {
        layers.push(file_layer(&config.file)?);
    }
    if config.console.enabled {
        layers.push(console_layer(&config.console));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| LoggerError::Init {
            message: e.to_string(),
        })
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .unwrap_or_else(|_| tracing::level_filters::LevelFilter::INFO.into()),
        )
        .from_env_lossy()
}

fn console_layer(config: &ConsoleConfig) -> BoxedLayer {
    let use_ansi = config.colored && std::io::stdout().is_terminal();

    fmt::layer()
        .with_ansi(use_ansi)
        .with_target(true)
        .with_level(true)
        .boxed()
}

fn file_layer(config: &FileConfig) -> Result<BoxedLayer, LoggerError> {
    let writer = RotatingFileWriter::new(config)?;
    let layer = fmt::layer().with_ansi(false).with_writer(writer);

    Ok(match config.format {
        LogFormat::Full => layer.with_target(true).boxed(),
        LogFormat::Compact => layer.with_target(true).compact().boxed(),
        LogFormat::Json => layer.json().boxed(),
    })
}
