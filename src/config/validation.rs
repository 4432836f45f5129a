//! Configuration validation logic
//!
//! This module provides validation methods for all configuration structures
//! to ensure configuration values are within acceptable ranges and formats.

use crate::config::error::ConfigError;
use crate::config::settings::{
    DatabaseConfig, DispatchConfig, FileSettings, LoggerSettings, ProviderKind, ProviderSettings,
    ProvidersConfig, SendGridConfig, ServerConfig, Settings, TwilioConfig,
};
use crate::models::ChannelType;
use crate::services::messaging::recipient;

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

impl ServerConfig {
    /// Validate server configuration
    ///
    /// # Validation Rules
    /// - Port must be between 1 and 65535
    /// - Request timeout must be greater than 0
    /// - Keep-alive timeout must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        if self.keep_alive_timeout == 0 {
            return Err(ConfigError::validation(
                "server.keep_alive_timeout",
                "Keep-alive timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    /// Validate database configuration
    ///
    /// An empty URL is valid and selects the in-memory lifecycle store, whose
    /// record cap must be greater than 0. When a URL is set:
    /// - it must use the `postgres://` or `postgresql://` scheme
    /// - max and min connections must be greater than 0
    /// - min connections must not exceed max connections
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.is_configured() {
            if self.memory_max_records == 0 {
                return Err(ConfigError::validation(
                    "database.memory_max_records",
                    "In-memory record cap must be greater than 0.",
                ));
            }
            return Ok(());
        }

        if !self.is_valid_database_url() {
            return Err(ConfigError::validation(
                "database.url",
                "Invalid database URL format. Expected format: postgres://[user:password@]host[:port]/database",
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }

        if self.min_connections == 0 {
            return Err(ConfigError::validation(
                "database.min_connections",
                "Min connections must be greater than 0.",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::ValidationError {
                field: "database.min_connections".to_string(),
                message: format!(
                    "Min connections ({}) cannot exceed max connections ({}).",
                    self.min_connections, self.max_connections
                ),
            });
        }

        if self.connection_timeout == 0 {
            return Err(ConfigError::validation(
                "database.connection_timeout",
                "Connection timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }

    fn is_valid_database_url(&self) -> bool {
        ["postgres://", "postgresql://"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme))
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        if self.rotation.max_size == 0 || self.rotation.max_files == 0 {
            return Err(ConfigError::validation(
                "logger.file.rotation",
                "Rotation max_size and max_files must be greater than 0.",
            ));
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    ///
    /// # Validation Rules
    /// - Log level must be one of: trace, debug, info, warn, error
    /// - If file logging is enabled, path must not be empty
    /// - Log format must be one of: full, compact, json
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        self.file.validate()
    }
}

fn require_non_empty(field: String, value: &str, what: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field,
            message: format!("{} is required.", what),
        });
    }
    Ok(())
}

fn validate_base_url(field: String, url: &str) -> Result<(), ConfigError> {
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(ConfigError::ValidationError {
            field,
            message: format!("Base URL '{}' must start with http:// or https://", url),
        });
    }
    Ok(())
}

fn validate_timeout(field: String, seconds: u64) -> Result<(), ConfigError> {
    if seconds == 0 {
        return Err(ConfigError::ValidationError {
            field,
            message: "Timeout must be greater than 0 seconds.".to_string(),
        });
    }
    Ok(())
}

impl TwilioConfig {
    fn validate(&self, prefix: &str) -> Result<(), ConfigError> {
        require_non_empty(format!("{prefix}.account_sid"), &self.account_sid, "Account SID")?;
        require_non_empty(format!("{prefix}.auth_token"), &self.auth_token, "Auth token")?;
        recipient::validate_phone(&self.from_number).map_err(|e| ConfigError::ValidationError {
            field: format!("{prefix}.from_number"),
            message: e.to_string(),
        })?;
        validate_base_url(format!("{prefix}.base_url"), &self.base_url)?;
        validate_timeout(format!("{prefix}.timeout_seconds"), self.timeout_seconds)
    }
}

impl SendGridConfig {
    fn validate(&self, prefix: &str) -> Result<(), ConfigError> {
        require_non_empty(format!("{prefix}.api_key"), &self.api_key, "API key")?;
        recipient::validate_email(&self.from_email).map_err(|e| ConfigError::ValidationError {
            field: format!("{prefix}.from_email"),
            message: e.to_string(),
        })?;
        validate_base_url(format!("{prefix}.base_url"), &self.base_url)?;
        validate_timeout(format!("{prefix}.timeout_seconds"), self.timeout_seconds)
    }
}

impl ProviderSettings {
    /// Validate one channel slot
    ///
    /// # Validation Rules
    /// - Twilio only serves SMS and SendGrid only serves email
    /// - The selected vendor's credentials must be present
    /// - A console name override must not be blank
    pub fn validate(&self, channel: ChannelType) -> Result<(), ConfigError> {
        let prefix = format!("providers.{}", channel);

        let compatible = match (self.kind, channel) {
            (ProviderKind::Twilio, ChannelType::Email) => false,
            (ProviderKind::Sendgrid, ChannelType::Sms) => false,
            _ => true,
        };
        if !compatible {
            return Err(ConfigError::ValidationError {
                field: format!("{prefix}.kind"),
                message: format!(
                    "Provider '{}' cannot serve the {} channel.",
                    self.kind.as_str(),
                    channel
                ),
            });
        }

        match self.kind {
            ProviderKind::Console => match &self.name {
                Some(name) => require_non_empty(format!("{prefix}.name"), name, "Provider name"),
                None => Ok(()),
            },
            ProviderKind::Twilio => self.twilio.validate(&format!("{prefix}.twilio")),
            ProviderKind::Sendgrid => self.sendgrid.validate(&format!("{prefix}.sendgrid")),
            ProviderKind::Disabled => Ok(()),
        }
    }
}

impl ProvidersConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sms.validate(ChannelType::Sms)?;
        self.email.validate(ChannelType::Email)
    }
}

impl DispatchConfig {
    /// Validate the send deadline against the HTTP request timeout
    ///
    /// The request timeout starts counting before the pending write, so an
    /// enabled deadline must be strictly shorter to ever fire first.
    pub fn validate(&self, request_timeout: u64) -> Result<(), ConfigError> {
        if self.send_timeout_seconds > 0 && self.send_timeout_seconds >= request_timeout {
            return Err(ConfigError::ValidationError {
                field: "dispatch.send_timeout_seconds".to_string(),
                message: format!(
                    "Send timeout ({}s) must be less than server.request_timeout ({}s), or 0 to disable it.",
                    self.send_timeout_seconds, request_timeout
                ),
            });
        }
        Ok(())
    }
}

impl Settings {
    /// Validate all configuration settings
    ///
    /// This method validates all sub-configurations and returns the first
    /// validation error encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.logger.validate()?;
        self.dispatch.validate(self.server.request_timeout)?;
        self.providers.validate()?;
        Ok(())
    }
}
