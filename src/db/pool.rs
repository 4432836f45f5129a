//! Async database connection pool and embedded migrations.
//!
//! Queries go through a bb8 pool of `AsyncPgConnection`s. Migrations run on a
//! blocking `PgConnection` inside `spawn_blocking`, since the migration
//! harness is synchronous.

use std::time::Duration;

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::Pool;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};

/// Migrations compiled into the binary from `migrations/`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Async connection pool type alias.
///
/// bb8::Pool internally uses Arc, so Clone is cheap (just reference count increment).
pub type AsyncDbPool = Pool<AsyncPgConnection>;

/// Creates an async database connection pool sized from `config`.
///
/// # Errors
/// `AppError::ConnectionPool` if the initial connections cannot be opened
///
/// # Example
///
/// ```ignore
/// let pool = establish_async_connection_pool(&settings.database).await?;
/// let mut conn = pool.get().await?;
/// ```
pub async fn establish_async_connection_pool(config: &DatabaseConfig) -> AppResult<AsyncDbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.url);
    let pool = Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_connections))
        .connection_timeout(Duration::from_secs(config.connection_timeout))
        .build(manager)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database pool established"
    );
    Ok(pool)
}

fn establish_sync(database_url: &str, operation: &str) -> AppResult<PgConnection> {
    PgConnection::establish(database_url).map_err(|e| AppError::Database {
        operation: operation.to_string(),
        source: anyhow::anyhow!("Connection error: {}", e),
    })
}

fn migration_error(operation: &str, error: impl std::fmt::Display) -> AppError {
    AppError::Database {
        operation: operation.to_string(),
        source: anyhow::anyhow!("Migration error: {}", error),
    }
}

async fn blocking<T, F>(f: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> AppResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?
}

/// Names of migrations not yet applied.
pub async fn pending_migrations(database_url: &str) -> AppResult<Vec<String>> {
    let url = database_url.to_string();
    blocking(move || {
        let mut conn = establish_sync(&url, "establish connection for migration check")?;
        let pending = conn
            .pending_migrations(MIGRATIONS)
            .map_err(|e| migration_error("check pending migrations", e))?;
        Ok(pending.iter().map(|m| m.name().to_string()).collect())
    })
    .await
}

/// Applies all pending migrations and returns their versions.
pub async fn run_migrations(database_url: &str) -> AppResult<Vec<String>> {
    let url = database_url.to_string();
    blocking(move || {
        let mut conn = establish_sync(&url, "establish connection for migrations")?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| migration_error("run pending migrations", e))?;
        Ok(applied.iter().map(|v| v.to_string()).collect())
    })
    .await
}

/// Reverts the last `steps` migrations.
///
/// # Errors
/// `AppError::Validation` when `steps` is zero or exceeds the applied count
pub async fn revert_migrations(database_url: &str, steps: u32) -> AppResult<Vec<String>> {
    if steps == 0 {
        return Err(AppError::Validation {
            field: "rollback_steps".to_string(),
            reason: "Number of rollback steps must be greater than 0".to_string(),
        });
    }

    let url = database_url.to_string();
    blocking(move || {
        let mut conn = establish_sync(&url, "establish connection for rollback")?;
        let applied = conn
            .applied_migrations()
            .map_err(|e| migration_error("get applied migrations", e))?;

        if applied.len() < steps as usize {
            return Err(AppError::Validation {
                field: "rollback_steps".to_string(),
                reason: format!(
                    "Cannot rollback {} migrations - only {} applied migrations available",
                    steps,
                    applied.len()
                ),
            });
        }

        let mut reverted = Vec::with_capacity(steps as usize);
        for _ in 0..steps {
            let version = conn
                .revert_last_migration(MIGRATIONS)
                .map_err(|e| migration_error("revert migration", e))?;
            reverted.push(version.to_string());
        }
        Ok(reverted)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_rollback_steps_rejected_before_connecting() {
        let err = revert_migrations("postgres://unused/db", 0).await.unwrap_err();
        match err {
            AppError::Validation { field, reason } => {
                assert_eq!(field, "rollback_steps");
                assert!(reason.contains("must be greater than 0"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_migrations_are_embedded() {
        use diesel::migration::MigrationSource;

        let migrations: Vec<_> =
            MigrationSource::<diesel::pg::Pg>::migrations(&MIGRATIONS).unwrap();
        assert!(
            migrations
                .iter()
                .any(|m| m.name().to_string().contains("create_messages"))
        );
    }

    #[test]
    fn test_provider_name_column_is_unbounded() {
        use diesel::migration::MigrationSource;

        let migrations: Vec<_> =
            MigrationSource::<diesel::pg::Pg>::migrations(&MIGRATIONS).unwrap();
        assert!(
            migrations
                .iter()
                .any(|m| m.name().to_string().contains("widen_provider_name"))
        );

        let up = include_str!("../../migrations/2026-02-01-000000_widen_provider_name/up.sql");
        assert!(up.contains("provider_name TYPE TEXT"));
    }
}
