//! Message delivery: providers, the channel registry and the dispatcher.
//!
//! `MessageProvider` is the seam every transport implements. Providers are
//! selected per channel from `ProvidersConfig` at startup and installed in a
//! `ProviderRegistry`; the `Dispatcher` routes each message through it and
//! records the lifecycle in a `LifecycleStore`.

mod console_provider;
mod sendgrid_provider;
mod twilio_provider;

pub mod dispatcher;
pub mod error;
pub mod lifecycle;
pub mod provider;
pub mod recipient;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

pub use console_provider::ConsoleProvider;
pub use dispatcher::{Dispatcher, NO_PROVIDER_DETAIL};
pub use error::{CancelReason, DispatchError, ErrorKind, ProviderError};
pub use lifecycle::{InMemoryLifecycleStore, LifecycleStore};
pub use provider::MessageProvider;
pub use registry::{ProviderRegistry, RegisteredProvider};
pub use sendgrid_provider::SendGridProvider;
pub use twilio_provider::TwilioProvider;

use crate::config::{ConfigError, ProviderKind, ProviderSettings, ProvidersConfig};
use crate::models::ChannelType;

/// Builds the provider for one channel slot.
///
/// # Returns
/// `None` when the slot is `disabled`
///
/// # Errors
/// The slot's validation error, e.g. `twilio` configured for email
pub fn build_provider(
    channel: ChannelType,
    settings: &ProviderSettings,
) -> Result<Option<Arc<dyn MessageProvider>>, ConfigError> {
    settings.validate(channel)?;

    let provider: Arc<dyn MessageProvider> = match settings.kind {
        ProviderKind::Console => {
            let name = settings
                .name
                .clone()
                .unwrap_or_else(|| format!("console-{}", channel));
            Arc::new(ConsoleProvider::new(name, channel))
        }
        ProviderKind::Twilio => Arc::new(TwilioProvider::new(settings.twilio.clone())),
        ProviderKind::Sendgrid => Arc::new(SendGridProvider::new(settings.sendgrid.clone())),
        ProviderKind::Disabled => return Ok(None),
    };

    Ok(Some(provider))
}

/// Builds a registry with one provider per enabled channel.
pub fn build_registry(config: &ProvidersConfig) -> Result<ProviderRegistry, ConfigError> {
    let registry = ProviderRegistry::new();

    for channel in ChannelType::ALL {
        let settings = match channel {
            ChannelType::Sms => &config.sms,
            ChannelType::Email => &config.email,
        };
        match build_provider(channel, settings)? {
            Some(provider) => {
                registry.register(provider);
            }
            None => tracing::warn!(channel = %channel, "Channel disabled, sends will fail"),
        }
    }

    Ok(registry)
}
