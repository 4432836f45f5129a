//! Message DTOs for API requests and responses.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{ChannelType, Message, MessageStatus};
use crate::services::messaging::RegisteredProvider;

fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Request body for `POST /api/messages`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "channel": "sms",
    "recipient": "+15550001111",
    "body": "Your code is 123456"
}))]
pub struct SendMessageRequest {
    pub channel: ChannelType,

    /// Phone number (`+` followed by digits) for sms, address for email
    #[validate(
        length(min = 1, max = 255, message = "recipient must be 1 to 255 characters"),
        custom(function = "non_blank", message = "recipient must not be blank")
    )]
    pub recipient: String,

    /// Email only; ignored for sms
    #[serde(default)]
    pub subject: Option<String>,

    #[validate(custom(function = "non_blank", message = "body must not be empty"))]
    pub body: String,
}

impl From<SendMessageRequest> for Message {
    fn from(request: SendMessageRequest) -> Self {
        let message = Message::new(request.channel, request.recipient, request.body);
        match request.subject {
            Some(subject) => message.with_subject(subject),
            None => message,
        }
    }
}

/// Result of a successful send.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendMessageResponse {
    pub id: Uuid,
    pub status: MessageStatus,
    pub provider_name: String,
}

impl From<&Message> for SendMessageResponse {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            status: message.status,
            provider_name: message.provider_name.clone(),
        }
    }
}

/// A recorded message, as returned by `GET /api/messages/{id}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub id: Uuid,
    pub channel: ChannelType,
    pub recipient: String,
    pub subject: Option<String>,
    pub body: String,
    pub status: MessageStatus,
    pub provider_name: String,
    pub error_detail: Option<String>,
    /// RFC 3339 timestamp
    #[schema(value_type = String, format = DateTime)]
    pub created_at: String,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            channel: message.channel,
            recipient: message.recipient,
            subject: message.subject,
            body: message.body,
            status: message.status,
            provider_name: message.provider_name,
            error_detail: message.error_detail,
            created_at: message.created_at.to_string(),
        }
    }
}

/// One active channel to provider mapping.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProviderResponse {
    pub channel: ChannelType,
    pub name: String,
}

impl From<RegisteredProvider> for ProviderResponse {
    fn from(provider: RegisteredProvider) -> Self {
        Self {
            channel: provider.channel,
            name: provider.name,
        }
    }
}
