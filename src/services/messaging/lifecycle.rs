//! Lifecycle store contract and its in-memory implementation.
//!
//! The store is the durable record of message id -> status, provider and
//! error. Only the dispatcher writes to it. Both writes of one send are
//! independent and idempotent by id.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Message, MessageStatus};

#[async_trait]
pub trait LifecycleStore: Send + Sync {
    /// Upserts the full message record by id.
    async fn save(&self, message: &Message) -> AppResult<()>;

    /// Records a terminal transition for an already saved message.
    ///
    /// # Errors
    /// `AppError::NotFound` when no record exists for `id`.
    async fn update_status(
        &self,
        id: Uuid,
        status: MessageStatus,
        provider_name: &str,
        error_detail: Option<&str>,
    ) -> AppResult<()>;

    /// Reads a record back by id.
    async fn find(&self, id: Uuid) -> AppResult<Option<Message>>;
}

/// Default record cap of [`InMemoryLifecycleStore::new`].
pub const DEFAULT_MEMORY_CAPACITY: usize = 10_000;

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<Uuid, Message>,
    // Insertion order, oldest first.
    order: VecDeque<Uuid>,
}

/// Process-local store used when no database is configured.
///
/// Records live only as long as the process; this is the gateway's degraded,
/// unaudited mode. The store holds at most `capacity` records and evicts the
/// oldest one when a new id would exceed it.
#[derive(Debug)]
pub struct InMemoryLifecycleStore {
    records: RwLock<Records>,
    capacity: usize,
}

impl Default for InMemoryLifecycleStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_CAPACITY)
    }
}

impl InMemoryLifecycleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that keeps at most `capacity` records (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: RwLock::new(Records::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.by_id.is_empty()
    }
}

#[async_trait]
impl LifecycleStore for InMemoryLifecycleStore {
    async fn save(&self, message: &Message) -> AppResult<()> {
        let mut records = self.records.write().await;
        if records.by_id.insert(message.id, message.clone()).is_none() {
            records.order.push_back(message.id);
        }

        while records.order.len() > self.capacity {
            if let Some(oldest) = records.order.pop_front() {
                records.by_id.remove(&oldest);
                tracing::debug!(message_id = %oldest, "Evicted lifecycle record");
            }
        }
        Ok(())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: MessageStatus,
        provider_name: &str,
        error_detail: Option<&str>,
    ) -> AppResult<()> {
        let mut records = self.records.write().await;
        let record = records.by_id.get_mut(&id).ok_or_else(|| AppError::NotFound {
            entity: "message".to_string(),
            field: "id".to_string(),
            value: id.to_string(),
        })?;

        record.status = status;
        record.provider_name = provider_name.to_string();
        record.error_detail = error_detail.map(str::to_string);
        Ok(())
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<Message>> {
        Ok(self.records.read().await.by_id.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChannelType;

    fn pending(recipient: &str) -> Message {
        let mut message = Message::new(ChannelType::Sms, recipient, "hi");
        message.id = Uuid::new_v4();
        message
    }

    #[tokio::test]
    async fn test_save_then_find() {
        let store = InMemoryLifecycleStore::new();
        let message = pending("+15550001111");

        store.save(&message).await.unwrap();

        let found = store.find(message.id).await.unwrap().unwrap();
        assert_eq!(found, message);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_save_is_upsert_by_id() {
        let store = InMemoryLifecycleStore::new();
        let mut message = pending("+15550001111");

        store.save(&message).await.unwrap();
        message.mark_sent("console-sms");
        store.save(&message).await.unwrap();

        assert_eq!(store.len().await, 1);
        let found = store.find(message.id).await.unwrap().unwrap();
        assert_eq!(found.status, MessageStatus::Sent);
    }

    #[tokio::test]
    async fn test_update_status_records_terminal_fields() {
        let store = InMemoryLifecycleStore::new();
        let message = pending("+15550001111");
        store.save(&message).await.unwrap();

        store
            .update_status(
                message.id,
                MessageStatus::Failed,
                "twilio",
                Some("authentication failed: bad token"),
            )
            .await
            .unwrap();

        let found = store.find(message.id).await.unwrap().unwrap();
        assert_eq!(found.status, MessageStatus::Failed);
        assert_eq!(found.provider_name, "twilio");
        assert_eq!(
            found.error_detail.as_deref(),
            Some("authentication failed: bad token")
        );
        assert_eq!(found.recipient, "+15550001111");
    }

    #[tokio::test]
    async fn test_update_status_unknown_id_is_not_found() {
        let store = InMemoryLifecycleStore::new();
        let result = store
            .update_status(Uuid::new_v4(), MessageStatus::Sent, "x", None)
            .await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest_record() {
        let store = InMemoryLifecycleStore::with_capacity(2);
        let first = pending("+15550000001");
        let mut second = pending("+15550000002");
        let third = pending("+15550000003");

        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();
        // Re-saving an existing id does not count against the cap.
        second.mark_sent("console-sms");
        store.save(&second).await.unwrap();
        assert_eq!(store.len().await, 2);

        store.save(&third).await.unwrap();

        assert_eq!(store.len().await, 2);
        assert!(store.find(first.id).await.unwrap().is_none());
        assert!(store.find(second.id).await.unwrap().is_some());
        assert!(store.find(third.id).await.unwrap().is_some());
    }

    #[test]
    fn test_default_capacity_is_bounded() {
        assert_eq!(InMemoryLifecycleStore::new().capacity(), DEFAULT_MEMORY_CAPACITY);
        assert_eq!(InMemoryLifecycleStore::with_capacity(0).capacity(), 1);
    }

    #[tokio::test]
    async fn test_find_unknown_is_none() {
        let store = InMemoryLifecycleStore::new();
        assert!(store.find(Uuid::new_v4()).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }
}
