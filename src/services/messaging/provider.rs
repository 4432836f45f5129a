//! Core message provider trait.
//!
//! A provider is a transport for exactly one channel. The dispatcher resolves
//! providers by [`MessageProvider::channel`] and records
//! [`MessageProvider::name`] on every terminal lifecycle write.

use async_trait::async_trait;

use super::error::ProviderError;
use crate::models::{ChannelType, Message};

/// Trait for message transports (console, Twilio, SendGrid, ...).
///
/// Uses `async_trait` so providers can live behind `Arc<dyn MessageProvider>`
/// in the registry. All providers must be Send + Sync.
///
/// # Example Implementation
/// ```ignore
/// use async_trait::async_trait;
///
/// pub struct PigeonProvider;
///
/// #[async_trait]
/// impl MessageProvider for PigeonProvider {
///     async fn send(&self, message: &Message) -> Result<(), ProviderError> {
///         recipient::validate_phone(&message.recipient)?;
///         // transport-specific delivery here
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "pigeon"
///     }
///
///     fn channel(&self) -> ChannelType {
///         ChannelType::Sms
///     }
/// }
/// ```
#[async_trait]
pub trait MessageProvider: Send + Sync {
    /// Attempts delivery of a single message.
    ///
    /// Implementations validate the recipient for their channel first and
    /// return [`ProviderError::InvalidRecipient`] without network contact
    /// when it is malformed. The message is borrowed immutably; lifecycle
    /// fields are the dispatcher's to update.
    async fn send(&self, message: &Message) -> Result<(), ProviderError>;

    /// Stable identifier recorded as the message's `provider_name`.
    fn name(&self) -> &str;

    /// The single channel this provider services.
    fn channel(&self) -> ChannelType;
}
