//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers.

use std::sync::Arc;

use crate::config::Settings;
use crate::db::{establish_async_connection_pool, run_migrations};
use crate::error::AppResult;
use crate::repositories::Repositories;
use crate::services::Services;
use crate::services::messaging::{
    Dispatcher, InMemoryLifecycleStore, LifecycleStore, ProviderRegistry, build_registry,
};

/// Application state containing all shared services.
///
/// Cloning is cheap; services hold their dependencies behind `Arc`.
#[derive(Clone, Debug)]
pub struct AppState {
    pub services: Services,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            services: Services::new(dispatcher),
        }
    }

    /// Wires providers, the lifecycle store and the dispatcher from settings.
    ///
    /// With a database URL the Postgres repository backs the lifecycle store
    /// (migrating first when `database.auto_migrate` is set). Without one the
    /// gateway falls back to an in-memory store.
    ///
    /// # Errors
    /// Provider configuration errors, pool creation or migration failures
    pub async fn from_settings(settings: &Settings) -> AppResult<Self> {
        let registry = build_registry(&settings.providers)?;
        let store = lifecycle_store(settings).await?;
        Ok(Self::new(Arc::new(dispatcher(registry, store, settings))))
    }
}

fn dispatcher(
    registry: ProviderRegistry,
    store: Arc<dyn LifecycleStore>,
    settings: &Settings,
) -> Dispatcher {
    Dispatcher::new(Arc::new(registry), store).with_send_timeout(settings.dispatch.send_timeout())
}

/// Postgres-backed store when a database is configured, in-memory otherwise.
pub async fn lifecycle_store(settings: &Settings) -> AppResult<Arc<dyn LifecycleStore>> {
    let database = &settings.database;
    if !database.is_configured() {
        tracing::warn!(
            max_records = database.memory_max_records,
            "No database configured; message lifecycle is kept in memory and lost on restart"
        );
        return Ok(Arc::new(InMemoryLifecycleStore::with_capacity(
            database.memory_max_records,
        )));
    }

    if database.auto_migrate {
        let applied = run_migrations(&database.url).await?;
        tracing::info!(applied = applied.len(), "Database migrations applied");
    }

    tracing::info!(
        max_connections = database.max_connections,
        min_connections = database.min_connections,
        "Initializing database connection pool"
    );
    let pool = establish_async_connection_pool(database).await?;
    let repos = Repositories::new(pool);
    Ok(Arc::new(repos.messages))
}
