//! Send command handler
//!
//! Dispatches a single message through the configured providers and prints
//! the recorded lifecycle as JSON.

use crate::config::Settings;
use crate::error::{AppError, AppResult};
use crate::models::{ChannelType, Message};
use crate::state::AppState;

/// Handler for the send command
pub struct SendCommandHandler {
    config: Settings,
}

impl SendCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Sends one message and returns it in its terminal state.
    ///
    /// # Errors
    /// `AppError::Dispatch` when delivery fails; the message is still
    /// recorded and its id is printed.
    pub async fn execute(
        &self,
        channel: ChannelType,
        to: &str,
        subject: Option<&str>,
        body: &str,
    ) -> AppResult<Message> {
        let state = AppState::from_settings(&self.config).await?;

        let mut message = Message::new(channel, to, body);
        if let Some(subject) = subject {
            message = message.with_subject(subject);
        }

        match state.services.messages.send(message).await {
            Ok(sent) => {
                let rendered = serde_json::to_string_pretty(&sent).map_err(|e| {
                    AppError::Internal {
                        source: anyhow::Error::from(e),
                    }
                })?;
                println!("{rendered}");
                Ok(sent)
            }
            Err(AppError::Dispatch { message_id, source }) => {
                eprintln!("✗ Message {} failed: {}", message_id, source);
                Err(AppError::Dispatch { message_id, source })
            }
            Err(other) => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;
    use crate::models::MessageStatus;
    use crate::services::messaging::ErrorKind;

    #[tokio::test]
    async fn test_send_through_console_provider() {
        let handler = SendCommandHandler::new(Settings::default());
        let message = handler
            .execute(ChannelType::Email, "ops@example.com", Some("Alert"), "disk full")
            .await
            .unwrap();

        assert_eq!(message.status, MessageStatus::Sent);
        assert_eq!(message.provider_name, "console-email");
        assert_eq!(message.subject.as_deref(), Some("Alert"));
        assert!(!message.id.is_nil());
    }

    #[tokio::test]
    async fn test_send_invalid_recipient() {
        let handler = SendCommandHandler::new(Settings::default());
        let result = handler
            .execute(ChannelType::Sms, "not-a-number", None, "hello")
            .await;

        match result {
            Err(AppError::Dispatch { message_id, source }) => {
                assert!(!message_id.is_nil());
                assert_eq!(source.kind(), ErrorKind::InvalidRecipient);
            }
            other => panic!("expected dispatch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_on_disabled_channel() {
        let mut config = Settings::default();
        config.providers.sms.kind = ProviderKind::Disabled;
        let handler = SendCommandHandler::new(config);

        match handler.execute(ChannelType::Sms, "+15551234567", None, "hello").await {
            Err(AppError::Dispatch { source, .. }) => {
                assert_eq!(source.kind(), ErrorKind::NoProviderAvailable)
            }
            other => panic!("expected dispatch error, got {other:?}"),
        }
    }
}
