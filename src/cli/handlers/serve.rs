//! Serve command handler
//!
//! Handles the serve command including dry-run validation and server startup.

use crate::config::Settings;
use crate::error::{AppError, AppResult};
use crate::server::Server;
use crate::services::messaging::build_registry;

/// Handler for the serve command
pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Runs the server, or only checks the configuration when `dry_run` is set.
    ///
    /// # Errors
    /// - Configuration validation errors
    /// - Server startup errors (if not dry-run)
    pub async fn execute(self, dry_run: bool) -> AppResult<()> {
        if dry_run {
            return self.validate_only();
        }
        Server::new(self.config).run().await.map_err(AppError::from)
    }

    /// Validates settings and provider wiring without binding a socket.
    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;
        let registry = build_registry(&self.config.providers)?;

        println!("✓ Configuration is valid");
        println!("✓ Server would bind to: {}", self.config.server.address());
        if self.config.database.is_configured() {
            println!("✓ Lifecycle store: postgres");
        } else {
            println!("! Lifecycle store: in-memory (no database.url configured)");
        }
        for provider in registry.registered() {
            println!("✓ Provider for {}: {}", provider.channel, provider.name);
        }

        println!("Dry run completed successfully - configuration is ready for deployment");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
