//! Migrate command handler
//!
//! Handles database migration operations including dry-run and rollback.

use crate::config::Settings;
use crate::db::{pending_migrations, revert_migrations, run_migrations};
use crate::error::{AppError, AppResult};

/// Handler for the migrate command
pub struct MigrateCommandHandler {
    config: Settings,
}

impl MigrateCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Execute the migrate command with dry-run and rollback support
    ///
    /// # Arguments
    /// * `dry_run` - list pending migrations without applying them
    /// * `rollback` - number of migrations to revert
    ///
    /// # Errors
    /// - `AppError::Validation` when no database URL is configured
    /// - Database connection and migration errors
    pub async fn execute(&self, dry_run: bool, rollback: Option<u32>) -> AppResult<()> {
        let database = &self.config.database;
        if !database.is_configured() {
            return Err(AppError::Validation {
                field: "database.url".to_string(),
                reason: "Migrations need a database; set database.url or MESSAGEHUB_DATABASE__URL"
                    .to_string(),
            });
        }
        database.validate()?;

        if dry_run {
            println!("Checking for pending migrations...");
            let pending = pending_migrations(&database.url).await?;
            if pending.is_empty() {
                println!("✓ No pending migrations found - database is up to date");
            } else {
                println!("Found {} pending migration(s):", pending.len());
                print_names(&pending);
                println!("\nRun without --dry-run to apply these migrations");
            }
            return Ok(());
        }

        if let Some(steps) = rollback {
            println!("Rolling back {} migration(s)...", steps);
            let reverted = revert_migrations(&database.url, steps).await?;
            println!("✓ Rolled back {} migration(s):", reverted.len());
            print_names(&reverted);
            return Ok(());
        }

        println!("Running database migrations...");
        let applied = run_migrations(&database.url).await?;
        if applied.is_empty() {
            println!("✓ No migrations to apply - database is already up to date");
        } else {
            println!("✓ Applied {} migration(s):", applied.len());
            print_names(&applied);
        }
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}

fn print_names(names: &[String]) {
    for name in names {
        println!("  - {}", name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_valid_config() -> Settings {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/test".to_string();
        config
    }

    #[test]
    fn test_migrate_handler_new() {
        let config = create_valid_config();
        let handler = MigrateCommandHandler::new(config.clone());
        assert_eq!(handler.config(), &config);
    }

    #[tokio::test]
    async fn test_migrate_requires_database() {
        let handler = MigrateCommandHandler::new(Settings::default());

        match handler.execute(true, None).await {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "database.url"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_migrate_handler_zero_rollback_steps() {
        let handler = MigrateCommandHandler::new(create_valid_config());

        match handler.execute(false, Some(0)).await {
            Err(AppError::Validation { field, reason }) => {
                assert_eq!(field, "rollback_steps");
                assert!(reason.contains("must be greater than 0"));
            }
            other => panic!("expected validation error for zero rollback steps, got {other:?}"),
        }
    }
}
