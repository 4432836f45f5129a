//! Send orchestration.
//!
//! One call to [`Dispatcher::send`] drives a single message through its
//! lifecycle: identity, pending write, provider resolution, delivery attempt,
//! terminal write. Store writes are observability only; a store outage
//! degrades auditing but never blocks delivery.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use jiff::Timestamp;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, field};
use uuid::Uuid;

use super::error::{CancelReason, DispatchError};
use super::lifecycle::LifecycleStore;
use super::provider::MessageProvider;
use super::registry::ProviderRegistry;
use crate::error::{AppError, AppResult};
use crate::models::{Message, MessageStatus};

/// Error detail persisted when a channel has no provider.
pub const NO_PROVIDER_DETAIL: &str = "no provider available";

/// Upper bound on any single lifecycle store call.
const STORE_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Routes messages to the provider registered for their channel and records
/// the lifecycle around each attempt.
pub struct Dispatcher {
    registry: Arc<ProviderRegistry>,
    store: Arc<dyn LifecycleStore>,
    send_timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ProviderRegistry>, store: Arc<dyn LifecycleStore>) -> Self {
        Self {
            registry,
            store,
            send_timeout: None,
        }
    }

    /// Bounds every provider call by `timeout`. `None` waits indefinitely,
    /// leaving only the caller's cancellation token.
    pub fn with_send_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.send_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn LifecycleStore> {
        &self.store
    }

    /// Registers `provider` for its channel; see [`ProviderRegistry::register`].
    pub fn register(&self, provider: Arc<dyn MessageProvider>) -> Option<String> {
        self.registry.register(provider)
    }

    /// Sends one message.
    ///
    /// On return `message` carries its assigned id and terminal status,
    /// whether or not the store accepted the writes.
    ///
    /// # Arguments
    /// * `cancel` - Fires to abandon the in-flight provider call
    /// * `message` - Caller-filled message; identity and lifecycle fields are
    ///   overwritten
    ///
    /// # Errors
    /// * `DispatchError::NoProviderAvailable` - nothing registered for the channel
    /// * `DispatchError::Provider` - the provider's own error, unchanged
    /// * `DispatchError::Cancelled` - cancellation or send deadline
    pub async fn send(
        &self,
        cancel: &CancellationToken,
        message: &mut Message,
    ) -> Result<(), DispatchError> {
        message.id = Uuid::new_v4();
        message.created_at = Timestamp::now();
        message.status = MessageStatus::Pending;
        message.provider_name.clear();
        message.error_detail = None;

        let span = tracing::info_span!(
            "dispatch",
            message_id = %message.id,
            channel = %message.channel,
            provider = field::Empty,
        );

        self.dispatch(cancel, message).instrument(span).await
    }

    async fn dispatch(
        &self,
        cancel: &CancellationToken,
        message: &mut Message,
    ) -> Result<(), DispatchError> {
        // Write-ahead of intent: a crash mid-send stays visible as pending.
        if let Err(e) = self.store_call(self.store.save(message)).await {
            tracing::warn!(error = %e, "Failed to persist pending message, continuing unaudited");
        }

        let Some(provider) = self.registry.resolve(message.channel) else {
            message.mark_failed("", NO_PROVIDER_DETAIL);
            self.persist_terminal(message).await;
            tracing::warn!("No provider registered for channel");
            return Err(DispatchError::NoProviderAvailable {
                channel: message.channel,
            });
        };

        tracing::Span::current().record("provider", provider.name());

        let result = self.attempt(provider.as_ref(), cancel, message).await;

        match &result {
            Ok(()) => {
                message.mark_sent(provider.name());
                tracing::info!("Message sent");
            }
            Err(e) => {
                message.mark_failed(provider.name(), e.to_string());
                tracing::warn!(kind = %e.kind(), error = %e, "Message delivery failed");
            }
        }

        self.persist_terminal(message).await;
        result
    }

    /// Races the provider call against cancellation and the send deadline.
    async fn attempt(
        &self,
        provider: &dyn MessageProvider,
        cancel: &CancellationToken,
        message: &Message,
    ) -> Result<(), DispatchError> {
        let deadline = async {
            match self.send_timeout {
                Some(limit) => {
                    tokio::time::sleep(limit).await;
                    limit
                }
                None => std::future::pending().await,
            }
        };

        let cancelled = |reason| DispatchError::Cancelled {
            provider: provider.name().to_string(),
            reason,
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(cancelled(CancelReason::Cancelled)),
            limit = deadline => Err(cancelled(CancelReason::DeadlineExceeded(limit))),
            result = provider.send(message) => result.map_err(DispatchError::from),
        }
    }

    /// Records the terminal state. Falls back to a full upsert when the
    /// pending write never landed.
    async fn persist_terminal(&self, message: &Message) {
        let update = self.store_call(self.store.update_status(
            message.id,
            message.status,
            &message.provider_name,
            message.error_detail.as_deref(),
        ));

        let result = match update.await {
            Err(AppError::NotFound { .. }) => {
                tracing::debug!("Pending record missing, upserting terminal state");
                self.store_call(self.store.save(message)).await
            }
            other => other,
        };

        if let Err(e) = result {
            tracing::warn!(
                error = %e,
                status = %message.status,
                "Failed to persist terminal message state"
            );
        }
    }

    async fn store_call<F>(&self, call: F) -> AppResult<()>
    where
        F: Future<Output = AppResult<()>>,
    {
        tokio::time::timeout(STORE_CALL_TIMEOUT, call)
            .await
            .unwrap_or_else(|_| {
                Err(AppError::Internal {
                    source: anyhow::anyhow!(
                        "lifecycle store call exceeded {}s",
                        STORE_CALL_TIMEOUT.as_secs()
                    ),
                })
            })
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("send_timeout", &self.send_timeout)
            .finish_non_exhaustive()
    }
}
