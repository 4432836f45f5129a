//! Message repository: the PostgreSQL lifecycle store.
//!
//! Both lifecycle writes are single statements keyed by id, so repeating
//! either one is harmless.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{Message, MessageRecord, MessageStatus, NewMessageRecord};
use crate::services::messaging::LifecycleStore;

/// Message repository holding an async connection pool.
///
/// `AsyncDbPool` is a bb8 pool and already reference counted, so clones
/// share connections.
#[derive(Clone)]
pub struct MessageRepository {
    pool: AsyncDbPool,
}

impl MessageRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LifecycleStore for MessageRepository {
    /// `INSERT ... ON CONFLICT (id) DO UPDATE` of the mutable columns.
    async fn save(&self, message: &Message) -> AppResult<()> {
        use crate::schema::messages::dsl::*;
        let mut conn = self.pool.get().await?;

        let row = NewMessageRecord::from(message);
        diesel::insert_into(messages)
            .values(&row)
            .on_conflict(id)
            .do_update()
            .set((
                status.eq(excluded(status)),
                provider_name.eq(excluded(provider_name)),
                error_detail.eq(excluded(error_detail)),
                subject.eq(excluded(subject)),
                body.eq(excluded(body)),
            ))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    async fn update_status(
        &self,
        message_id: Uuid,
        new_status: MessageStatus,
        new_provider_name: &str,
        new_error_detail: Option<&str>,
    ) -> AppResult<()> {
        use crate::schema::messages::dsl::*;
        let mut conn = self.pool.get().await?;

        let updated = diesel::update(messages.filter(id.eq(message_id)))
            .set((
                status.eq(new_status),
                provider_name.eq(new_provider_name),
                error_detail.eq(new_error_detail),
            ))
            .execute(&mut conn)
            .await?;

        if updated == 0 {
            return Err(AppError::not_found("message", "id", message_id));
        }
        Ok(())
    }

    async fn find(&self, message_id: Uuid) -> AppResult<Option<Message>> {
        use crate::schema::messages::dsl::*;
        let mut conn = self.pool.get().await?;

        let record = messages
            .filter(id.eq(message_id))
            .select(MessageRecord::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        Ok(record.map(Message::from))
    }
}
