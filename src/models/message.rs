//! Message models for dispatch and database operations.
//!
//! `Message` is the in-memory unit of work that flows through the dispatcher.
//! `MessageRecord` / `NewMessageRecord` are its row representations in the
//! `messages` table.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use diesel::{AsExpression, FromSqlRow};
use jiff::Timestamp;
use jiff_diesel::ToDiesel;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Enums
// ============================================================================

/// Transport category of a message. Selects which provider may act on it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
    AsExpression,
    FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Sms,
    Email,
}

impl ChannelType {
    /// Every channel the gateway knows about, in a stable order.
    pub const ALL: [ChannelType; 2] = [ChannelType::Sms, ChannelType::Email];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Sms => "sms",
            ChannelType::Email => "email",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sms" => Ok(ChannelType::Sms),
            "email" => Ok(ChannelType::Email),
            _ => Err(format!(
                "Unrecognized channel '{}'. Valid channels are: sms, email",
                s
            )),
        }
    }
}

impl diesel::query_builder::QueryId for ChannelType {
    type QueryId = ChannelType;
    const HAS_STATIC_QUERY_ID: bool = false;
}

impl ToSql<Text, Pg> for ChannelType {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(serialize::IsNull::No)
    }
}

impl FromSql<Text, Pg> for ChannelType {
    fn from_sql(
        bytes: <Pg as diesel::backend::Backend>::RawValue<'_>,
    ) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        s.parse::<ChannelType>().map_err(Into::into)
    }
}

/// Lifecycle status of a message.
///
/// A message starts `Pending` and moves exactly once to `Sent` or `Failed`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
    AsExpression,
    FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Sent,
    Failed,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Pending => "pending",
            MessageStatus::Sent => "sent",
            MessageStatus::Failed => "failed",
        }
    }

    /// Sent and Failed are terminal; nothing follows them.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MessageStatus::Pending)
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl diesel::query_builder::QueryId for MessageStatus {
    type QueryId = MessageStatus;
    const HAS_STATIC_QUERY_ID: bool = false;
}

impl ToSql<Text, Pg> for MessageStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(serialize::IsNull::No)
    }
}

impl FromSql<Text, Pg> for MessageStatus {
    fn from_sql(
        bytes: <Pg as diesel::backend::Backend>::RawValue<'_>,
    ) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        match s.as_str() {
            "pending" => Ok(MessageStatus::Pending),
            "sent" => Ok(MessageStatus::Sent),
            "failed" => Ok(MessageStatus::Failed),
            _ => Err(format!("Unrecognized message status: {}", s).into()),
        }
    }
}

// ============================================================================
// Domain Message
// ============================================================================

/// An outbound message and its delivery lifecycle.
///
/// Callers fill in `channel`, `recipient`, `subject` and `body`. Identity,
/// timestamps and lifecycle fields belong to the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    /// Nil until the dispatcher assigns an identity.
    pub id: Uuid,
    pub channel: ChannelType,
    pub recipient: String,
    /// Only meaningful for email.
    pub subject: Option<String>,
    pub body: String,
    pub status: MessageStatus,
    pub created_at: Timestamp,
    /// Empty until a terminal transition names the acting provider.
    pub provider_name: String,
    /// Set only when the message failed.
    pub error_detail: Option<String>,
}

impl Message {
    pub fn new(channel: ChannelType, recipient: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::nil(),
            channel,
            recipient: recipient.into(),
            subject: None,
            body: body.into(),
            status: MessageStatus::Pending,
            created_at: Timestamp::now(),
            provider_name: String::new(),
            error_detail: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Terminal success transition.
    pub fn mark_sent(&mut self, provider_name: &str) {
        debug_assert!(!self.status.is_terminal(), "status never regresses");
        self.status = MessageStatus::Sent;
        self.provider_name = provider_name.to_string();
        self.error_detail = None;
    }

    /// Terminal failure transition. `provider_name` is empty when no provider
    /// could be resolved.
    pub fn mark_failed(&mut self, provider_name: &str, detail: impl Into<String>) {
        debug_assert!(!self.status.is_terminal(), "status never regresses");
        self.status = MessageStatus::Failed;
        self.provider_name = provider_name.to_string();
        self.error_detail = Some(detail.into());
    }
}

// ============================================================================
// Message Row Models (Query/Insert)
// ============================================================================

/// Row of the `messages` table, as read back from the database.
#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MessageRecord {
    pub id: Uuid,
    pub channel: ChannelType,
    pub recipient: String,
    pub subject: Option<String>,
    pub body: String,
    pub status: MessageStatus,
    pub provider_name: String,
    pub created_at: jiff_diesel::Timestamp,
    pub error_detail: Option<String>,
}

/// Insert model; also used as the changeset of the pending upsert.
#[derive(Debug, Insertable, AsChangeset, Clone)]
#[diesel(table_name = crate::schema::messages)]
#[diesel(treat_none_as_null = true)]
pub struct NewMessageRecord {
    pub id: Uuid,
    pub channel: ChannelType,
    pub recipient: String,
    pub subject: Option<String>,
    pub body: String,
    pub status: MessageStatus,
    pub provider_name: String,
    pub created_at: jiff_diesel::Timestamp,
    pub error_detail: Option<String>,
}

impl From<&Message> for NewMessageRecord {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            channel: message.channel,
            recipient: message.recipient.clone(),
            subject: message.subject.clone(),
            body: message.body.clone(),
            status: message.status,
            provider_name: message.provider_name.clone(),
            created_at: message.created_at.to_diesel(),
            error_detail: message.error_detail.clone(),
        }
    }
}

impl From<MessageRecord> for Message {
    fn from(record: MessageRecord) -> Self {
        Self {
            id: record.id,
            channel: record.channel,
            recipient: record.recipient,
            subject: record.subject,
            body: record.body,
            status: record.status,
            created_at: record.created_at.to_jiff(),
            provider_name: record.provider_name,
            error_detail: record.error_detail,
        }
    }
}
