//! Console message provider.
//!
//! Writes messages to the log instead of a vendor API. Used for local
//! development and as the default provider for both channels.

use async_trait::async_trait;

use super::error::ProviderError;
use super::provider::MessageProvider;
use super::recipient;
use crate::models::{ChannelType, Message};

/// Provider that "delivers" by emitting a structured log event.
///
/// Recipient validation still applies, so a console provider rejects the same
/// addresses a vendor provider for the channel would.
#[derive(Debug, Clone)]
pub struct ConsoleProvider {
    name: String,
    channel: ChannelType,
}

impl ConsoleProvider {
    pub fn new(name: impl Into<String>, channel: ChannelType) -> Self {
        Self {
            name: name.into(),
            channel,
        }
    }
}

#[async_trait]
impl MessageProvider for ConsoleProvider {
    async fn send(&self, message: &Message) -> Result<(), ProviderError> {
        recipient::validate_for(self.channel, &message.recipient)?;

        tracing::info!(
            target: "messagehub::console",
            provider = %self.name,
            channel = %message.channel,
            to = %message.recipient,
            subject = message.subject.as_deref().unwrap_or(""),
            body = %message.body,
            "Console delivery"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn channel(&self) -> ChannelType {
        self.channel
    }
}
