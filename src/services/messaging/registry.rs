//! Channel to provider mapping.
//!
//! The registry is a closed set of slots, one per [`ChannelType`]. Every
//! lookup is an exhaustive match, so adding a channel does not compile until
//! the registry has a slot for it.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use super::provider::MessageProvider;
use crate::models::ChannelType;

#[derive(Default)]
struct ProviderSlots {
    sms: Option<Arc<dyn MessageProvider>>,
    email: Option<Arc<dyn MessageProvider>>,
}

impl ProviderSlots {
    fn slot(&self, channel: ChannelType) -> &Option<Arc<dyn MessageProvider>> {
        match channel {
            ChannelType::Sms => &self.sms,
            ChannelType::Email => &self.email,
        }
    }

    fn slot_mut(&mut self, channel: ChannelType) -> &mut Option<Arc<dyn MessageProvider>> {
        match channel {
            ChannelType::Sms => &mut self.sms,
            ChannelType::Email => &mut self.email,
        }
    }
}

/// One row of [`ProviderRegistry::registered`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredProvider {
    pub channel: ChannelType,
    pub name: String,
}

/// Shared, read-mostly provider mapping.
///
/// Registration normally happens once at startup, but runtime registration is
/// supported: the slots sit behind a `std::sync::RwLock` whose guards are
/// never held across an `.await`. Lookups clone the `Arc` out of the lock.
///
/// Registering a second provider for a channel replaces the first (last
/// write wins). The replacement is logged at WARN and the old provider's name
/// is returned so callers can detect it.
#[derive(Default)]
pub struct ProviderRegistry {
    slots: RwLock<ProviderSlots>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `provider` in the slot for `provider.channel()`.
    ///
    /// # Returns
    /// The name of the provider that was replaced, if the slot was occupied.
    pub fn register(&self, provider: Arc<dyn MessageProvider>) -> Option<String> {
        let channel = provider.channel();
        let name = provider.name().to_string();

        let previous = self.write().slot_mut(channel).replace(provider);
        let replaced = previous.map(|p| p.name().to_string());

        match &replaced {
            Some(old) => tracing::warn!(
                channel = %channel,
                provider = %name,
                replaced = %old,
                "Provider registration replaced an existing provider"
            ),
            None => tracing::info!(channel = %channel, provider = %name, "Provider registered"),
        }

        replaced
    }

    /// Returns the provider currently registered for `channel`.
    pub fn resolve(&self, channel: ChannelType) -> Option<Arc<dyn MessageProvider>> {
        self.read().slot(channel).clone()
    }

    /// Snapshot of the active mapping, in channel order.
    pub fn registered(&self) -> Vec<RegisteredProvider> {
        let slots = self.read();
        ChannelType::ALL
            .into_iter()
            .filter_map(|channel| {
                slots.slot(channel).as_ref().map(|p| RegisteredProvider {
                    channel,
                    name: p.name().to_string(),
                })
            })
            .collect()
    }

    // A writer that panicked mid-replace leaves a fully valid mapping behind,
    // so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, ProviderSlots> {
        self.slots.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ProviderSlots> {
        self.slots.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.registered())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::messaging::console_provider::ConsoleProvider;

    fn console(name: &str, channel: ChannelType) -> Arc<dyn MessageProvider> {
        Arc::new(ConsoleProvider::new(name, channel))
    }

    #[test]
    fn test_empty_registry_resolves_nothing() {
        let registry = ProviderRegistry::new();
        assert!(registry.resolve(ChannelType::Sms).is_none());
        assert!(registry.resolve(ChannelType::Email).is_none());
        assert!(registry.registered().is_empty());
    }

    #[test]
    fn test_register_routes_by_channel() {
        let registry = ProviderRegistry::new();
        assert!(registry.register(console("console-sms", ChannelType::Sms)).is_none());

        let sms = registry.resolve(ChannelType::Sms).unwrap();
        assert_eq!(sms.name(), "console-sms");
        assert!(registry.resolve(ChannelType::Email).is_none());
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = ProviderRegistry::new();
        registry.register(console("first", ChannelType::Email));
        let replaced = registry.register(console("second", ChannelType::Email));

        assert_eq!(replaced.as_deref(), Some("first"));
        assert_eq!(registry.resolve(ChannelType::Email).unwrap().name(), "second");
        assert_eq!(registry.registered().len(), 1);
    }

    #[test]
    fn test_reregistering_same_instance_is_idempotent() {
        let registry = ProviderRegistry::new();
        let provider = console("console-sms", ChannelType::Sms);
        registry.register(provider.clone());
        registry.register(provider.clone());

        let resolved = registry.resolve(ChannelType::Sms).unwrap();
        assert!(Arc::ptr_eq(&resolved, &provider));
        assert_eq!(registry.registered().len(), 1);
    }

    #[test]
    fn test_registered_lists_in_channel_order() {
        let registry = ProviderRegistry::new();
        registry.register(console("mail", ChannelType::Email));
        registry.register(console("text", ChannelType::Sms));

        assert_eq!(
            registry.registered(),
            vec![
                RegisteredProvider {
                    channel: ChannelType::Sms,
                    name: "text".into()
                },
                RegisteredProvider {
                    channel: ChannelType::Email,
                    name: "mail".into()
                },
            ]
        );
    }
}
