//! Service layer: message delivery and the operations built on it.

mod message_service;
pub mod messaging;

pub use message_service::MessageService;

use std::sync::Arc;

use crate::services::messaging::Dispatcher;

/// Aggregates all services for convenient access.
///
/// Designed to be used as Axum application state; cloning is cheap.
#[derive(Clone, Debug)]
pub struct Services {
    pub messages: MessageService,
}

impl Services {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            messages: MessageService::new(dispatcher),
        }
    }
}
