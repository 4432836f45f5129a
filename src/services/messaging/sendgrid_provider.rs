//! SendGrid email provider (v3 Mail Send API).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::ProviderError;
use super::provider::MessageProvider;
use super::recipient;
use crate::config::SendGridConfig;
use crate::external::client::HTTP_CLIENT;
use crate::models::{ChannelType, Message};

const DEFAULT_SUBJECT: &str = "(no subject)";

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct MailSendRequest<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 1],
}

#[derive(Debug, Default, Deserialize)]
struct SendGridErrorBody {
    #[serde(default)]
    errors: Vec<SendGridErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct SendGridErrorEntry {
    #[serde(default)]
    message: String,
}

pub struct SendGridProvider {
    config: SendGridConfig,
    client: reqwest::Client,
}

impl SendGridProvider {
    pub const NAME: &'static str = "sendgrid";

    pub fn new(config: SendGridConfig) -> Self {
        Self::with_client(config, HTTP_CLIENT.clone())
    }

    pub fn with_client(config: SendGridConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn mail_send_url(&self) -> String {
        format!("{}/mail/send", self.config.base_url.trim_end_matches('/'))
    }

    fn request_body<'a>(&'a self, message: &'a Message) -> MailSendRequest<'a> {
        MailSendRequest {
            personalizations: [Personalization {
                to: [Address {
                    email: &message.recipient,
                }],
            }],
            from: Address {
                email: &self.config.from_email,
            },
            subject: message
                .subject
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(DEFAULT_SUBJECT),
            content: [Content {
                content_type: "text/plain",
                value: &message.body,
            }],
        }
    }

    /// Joins the messages of SendGrid's `errors` array.
    fn error_detail(status: reqwest::StatusCode, body: &str) -> String {
        let parsed: SendGridErrorBody = serde_json::from_str(body).unwrap_or_default();
        let messages: Vec<&str> = parsed
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .filter(|m| !m.is_empty())
            .collect();

        if !messages.is_empty() {
            messages.join("; ")
        } else if body.trim().is_empty() {
            format!("sendgrid returned status {}", status)
        } else {
            format!("sendgrid returned status {}: {}", status, body.trim())
        }
    }
}

#[async_trait]
impl MessageProvider for SendGridProvider {
    async fn send(&self, message: &Message) -> Result<(), ProviderError> {
        recipient::validate_email(&message.recipient)?;

        let start = Instant::now();
        let response = self
            .client
            .post(self.mail_send_url())
            .bearer_auth(&self.config.api_key)
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .json(&self.request_body(message))
            .send()
            .await?;

        let status = response.status();
        let duration_ms = start.elapsed().as_millis() as u64;

        if status.is_success() {
            tracing::debug!(status = status.as_u16(), duration_ms, "SendGrid accepted message");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let detail = Self::error_detail(status, &body);
        tracing::debug!(status = status.as_u16(), duration_ms, detail = %detail, "SendGrid rejected message");

        Err(ProviderError::from_status(status, detail))
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn channel(&self) -> ChannelType {
        ChannelType::Email
    }
}
