//! Configuration management for messagehub
//!
//! Layered loading with the `config` crate:
//!
//! # Configuration Priority (lowest to highest)
//! 1. `default.toml` - Base default configuration
//! 2. `{environment}.toml` - Environment-specific configuration
//! 3. `local.toml` - Local overrides (not committed to version control)
//! 4. `MESSAGEHUB_*` environment variables
//!
//! Provider credentials are normally supplied through the environment, e.g.
//! `MESSAGEHUB_PROVIDERS__SMS__TWILIO__AUTH_TOKEN`.

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{
    DatabaseConfig, DispatchConfig, ProviderKind, ProviderSettings, ProvidersConfig,
    SendGridConfig, Settings, TwilioConfig,
};
