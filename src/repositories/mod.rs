//! Repository layer for data access operations.

mod message_repo;

pub use message_repo::MessageRepository;

use crate::db::AsyncDbPool;

/// Aggregates all repositories for convenient access.
///
/// Since `AsyncDbPool` uses `Arc` internally, cloning is cheap.
#[derive(Clone)]
pub struct Repositories {
    pub messages: MessageRepository,
}

impl Repositories {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self {
            messages: MessageRepository::new(pool),
        }
    }
}
