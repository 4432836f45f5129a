//! Message service: the entry point handlers and the CLI use to send.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Message;
use crate::services::messaging::{Dispatcher, RegisteredProvider};

/// Wraps the shared [`Dispatcher`].
///
/// Cloning is cheap: the dispatcher sits behind an `Arc`.
#[derive(Clone, Debug)]
pub struct MessageService {
    dispatcher: Arc<Dispatcher>,
}

impl MessageService {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Sends `message` and returns it in its terminal state.
    ///
    /// The send runs on its own task. Dropping the returned future (for
    /// example when an HTTP client disconnects) cancels the in-flight
    /// provider call, and the dispatcher still records the message as failed.
    ///
    /// # Errors
    /// * `AppError::Dispatch` - the message ended as failed; carries its id
    /// * `AppError::Internal` - the send task panicked
    pub async fn send(&self, message: Message) -> AppResult<Message> {
        let cancel = CancellationToken::new();
        let _guard = cancel.clone().drop_guard();

        let dispatcher = self.dispatcher.clone();
        let task = tokio::spawn(async move {
            let mut message = message;
            let result = dispatcher.send(&cancel, &mut message).await;
            (message, result)
        });

        let (message, result) = task.await.map_err(|e| AppError::Internal {
            source: anyhow::anyhow!("send task failed: {e}"),
        })?;

        match result {
            Ok(()) => Ok(message),
            Err(source) => Err(AppError::Dispatch {
                message_id: message.id,
                source,
            }),
        }
    }

    /// Reads back a recorded message.
    pub async fn find(&self, id: Uuid) -> AppResult<Message> {
        self.dispatcher
            .store()
            .find(id)
            .await?
            .ok_or_else(|| AppError::not_found("message", "id", id))
    }

    pub fn providers(&self) -> Vec<RegisteredProvider> {
        self.dispatcher.registry().registered()
    }
}
