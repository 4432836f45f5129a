//! Command executor for dispatching CLI commands

use super::handlers::{MigrateCommandHandler, SendCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::Settings;
use crate::error::{AppError, AppResult};

/// Execute a CLI command with merged settings
///
/// A missing subcommand runs `serve`.
///
/// # Errors
/// Argument validation failures and errors from the command handlers
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    cli.validate().map_err(|reason| AppError::Validation {
        field: "cli_arguments".to_string(),
        reason,
    })?;

    match &cli.command {
        Some(Commands::Serve { dry_run, .. }) => {
            ServeCommandHandler::new(settings).execute(*dry_run).await
        }
        None => ServeCommandHandler::new(settings).execute(false).await,
        Some(Commands::Migrate { dry_run, rollback }) => {
            MigrateCommandHandler::new(settings)
                .execute(*dry_run, *rollback)
                .await
        }
        Some(Commands::Send {
            channel,
            to,
            subject,
            body,
        }) => {
            SendCommandHandler::new(settings)
                .execute((*channel).into(), to, subject.as_deref(), body)
                .await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[tokio::test]
    async fn test_execute_serve_dry_run() {
        let cli = Cli::try_parse_from(["messagehub", "serve", "--dry-run"]).unwrap();
        assert!(execute_command(&cli, Settings::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_execute_send() {
        let cli = Cli::try_parse_from([
            "messagehub",
            "send",
            "--channel",
            "sms",
            "--to",
            "+15551234567",
            "--body",
            "hello",
        ])
        .unwrap();
        assert!(execute_command(&cli, Settings::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_execute_rejects_sms_subject() {
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

        match execute_command(&cli, Settings::default()).await {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "cli_arguments"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
