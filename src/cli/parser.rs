//! CLI argument parsing with clap
//!
//! Defines the command-line surface: `serve`, `migrate` and `send`, plus the
//! global configuration flags.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::models::ChannelType;

/// Notification gateway routing SMS and email to configured providers
#[derive(Parser, Debug)]
#[command(name = "messagehub")]
#[command(about = "Notification gateway routing SMS and email to configured providers")]
#[command(long_about = "
MessageHub accepts outbound messages, routes each one to the provider
registered for its channel and records the delivery lifecycle.

EXAMPLES:
    # Start the HTTP server with default configuration
    messagehub serve

    # Bind to all interfaces on a custom port
    messagehub serve --host 0.0.0.0 --port 8080

    # Use a custom configuration file
    messagehub --config /etc/messagehub/production.toml serve

    # Check configuration without starting the server
    messagehub serve --dry-run

    # Apply or preview database migrations
    messagehub migrate
    messagehub migrate --dry-run
    messagehub migrate --rollback 1

    # Send one message through the configured providers
    messagehub send --channel sms --to +15551234567 --body \"hello\"
    messagehub send --channel email --to ops@example.com --subject Alert --body \"disk full\"
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Loaded instead of the `config/` directory layers. Must be an existing
    /// TOML file.
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection (`MESSAGEHUB_APP_ENV`)
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (default)
    ///
    /// Examples:
    ///   messagehub serve
    ///   messagehub serve --host 0.0.0.0 --port 80
    ///   messagehub serve --dry-run
    Serve {
        /// Host address to bind to
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::validate_host_address)]
        host: Option<String>,

        /// Port number to listen on
        #[arg(short, long, value_name = "PORT", value_parser = super::validation::validate_port)]
        port: Option<u16>,

        /// Log level override, takes precedence over --verbose/--quiet
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and exit
        #[arg(long)]
        dry_run: bool,
    },
    /// Database migration operations
    ///
    /// Examples:
    ///   messagehub migrate
    ///   messagehub migrate --dry-run
    ///   messagehub migrate --rollback 3
    Migrate {
        /// Show pending migrations without applying them
        #[arg(long, conflicts_with = "rollback")]
        dry_run: bool,

        /// Number of most recent migrations to revert (1-100)
        #[arg(long, value_name = "STEPS", conflicts_with = "dry_run", value_parser = super::validation::validate_rollback_steps)]
        rollback: Option<u32>,
    },
    /// Send a single message and print its recorded lifecycle
    ///
    /// Uses the providers and lifecycle store from the loaded configuration.
    ///
    /// Examples:
    ///   messagehub send --channel sms --to +15551234567 --body "hello"
    ///   messagehub send --channel email --to a@example.com --subject Hi --body "hello"
    Send {
        /// Delivery channel
        #[arg(long, value_enum)]
        channel: ChannelArg,

        /// Recipient address: E.164 phone number or email address
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::validate_recipient)]
        to: String,

        /// Subject line (email only)
        #[arg(long)]
        subject: Option<String>,

        /// Message body
        #[arg(long, value_parser = super::validation::validate_non_blank)]
        body: String,
    },
}

/// Environment options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

/// Log level options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Channel selector for `send`
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelArg {
    Sms,
    Email,
}

impl From<ChannelArg> for ChannelType {
    fn from(channel: ChannelArg) -> Self {
        match channel {
            ChannelArg::Sms => ChannelType::Sms,
            ChannelArg::Email => ChannelType::Email,
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}

impl Cli {
    /// Checks argument combinations clap cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(Commands::Send {
            channel: ChannelArg::Sms,
            subject: Some(_),
            ..
        }) = &self.command
        {
            return Err("--subject only applies to the email channel".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        let err = Cli::try_parse_from(["messagehub", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_default_behavior() {
        let cli = Cli::try_parse_from(["messagehub"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(!cli.quiet);
        assert!(cli.config.is_none());
        assert!(cli.env.is_none());
    }

    #[test]
    fn test_serve_command() {
        let cli = Cli::try_parse_from([
            "messagehub",
            "serve",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--log-level",
            "debug",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Serve {
                host,
                port,
                log_level,
                dry_run,
            }) => {
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(8080));
                assert_eq!(log_level, Some(LogLevel::Debug));
                assert!(!dry_run);
            }
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn test_serve_rejects_port_zero() {
        assert!(Cli::try_parse_from(["messagehub", "serve", "--port", "0"]).is_err());
    }

    #[test]
    fn test_migrate_dry_run_conflicts_with_rollback() {
        let err = Cli::try_parse_from(["messagehub", "migrate", "--dry-run", "--rollback", "1"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_send_command() {
        let cli = Cli::try_parse_from([
            "messagehub",
            "send",
            "--channel",
            "email",
            "--to",
            "ops@example.com",
            "--subject",
            "Alert",
            "--body",
            "disk full",
        ])
        .unwrap();
        match &cli.command {
            Some(Commands::Send {
                channel,
                to,
                subject,
                body,
            }) => {
                assert_eq!(*channel, ChannelArg::Email);
                assert_eq!(ChannelType::from(*channel), ChannelType::Email);
                assert_eq!(to, "ops@example.com");
                assert_eq!(subject.as_deref(), Some("Alert"));
                assert_eq!(body, "disk full");
            }
            other => panic!("expected send, got {other:?}"),
        }
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_send_requires_channel_and_body() {
        assert!(Cli::try_parse_from(["messagehub", "send", "--to", "+15551234567"]).is_err());
        assert!(
            Cli::try_parse_from(["messagehub", "send", "--channel", "sms", "--to", "+15551234567"])
                .is_err()
        );
    }

    #[test]
    fn test_send_rejects_blank_body() {
        let result = Cli::try_parse_from([
            "messagehub",
            "send",
            "--channel",
            "sms",
            "--to",
            "+15551234567",
            "--body",
            "   ",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_send_rejects_overlong_recipient() {
        let to = format!("{}@example.com", "a".repeat(250));
        let result = Cli::try_parse_from([
            "messagehub",
            "send",
            "--channel",
            "email",
            "--to",
            to.as_str(),
            "--body",
            "hello",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_sms_subject_is_rejected() {
        let cli = Cli::try_parse_from([
            "messagehub",
            "send",
            "--channel",
            "sms",
            "--to",
            "+15551234567",
            "--subject",
            "Hi",
            "--body",
            "hello",
        ])
        .unwrap();
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_env_aliases() {
        let cli = Cli::try_parse_from(["messagehub", "--env", "prod"]).unwrap();
        assert_eq!(cli.env, Some(Environment::Production));
        assert_eq!(
            crate::config::Environment::from(Environment::Staging),
            crate::config::Environment::Staging
        );
    }

    #[test]
    fn test_conflicting_verbose_quiet() {
        let err = Cli::try_parse_from(["messagehub", "--verbose", "--quiet"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
