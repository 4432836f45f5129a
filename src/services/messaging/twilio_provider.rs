//! Twilio SMS provider.
//!
//! Sends through the Programmable Messaging REST API: a form-encoded POST to
//! `{base_url}/Accounts/{sid}/Messages.json` with HTTP basic auth.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;

use super::error::ProviderError;
use super::provider::MessageProvider;
use super::recipient;
use crate::config::TwilioConfig;
use crate::external::client::HTTP_CLIENT;
use crate::models::{ChannelType, Message};

/// Error body Twilio returns on non-2xx responses
#[derive(Debug, Default, Deserialize)]
struct TwilioErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// Twilio SMS provider
///
/// Uses the global `HTTP_CLIENT` unless built with [`TwilioProvider::with_client`].
///
/// # Example
/// ```ignore
/// let provider = TwilioProvider::new(TwilioConfig {
///     account_sid: "AC...".into(),
///     auth_token: token,
///     from_number: "+15550009999".into(),
///     ..Default::default()
/// });
/// registry.register(Arc::new(provider));
/// ```
pub struct TwilioProvider {
    config: TwilioConfig,
    client: reqwest::Client,
}

impl TwilioProvider {
    pub const NAME: &'static str = "twilio";

    pub fn new(config: TwilioConfig) -> Self {
        Self::with_client(config, HTTP_CLIENT.clone())
    }

    pub fn with_client(config: TwilioConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            self.config.base_url.trim_end_matches('/'),
            self.config.account_sid
        )
    }

    /// Builds the error detail from Twilio's `{code, message}` body, falling
    /// back to the raw body when it is not JSON.
    fn error_detail(status: reqwest::StatusCode, body: &str) -> String {
        let parsed: TwilioErrorBody = serde_json::from_str(body).unwrap_or_default();
        match (parsed.message, parsed.code) {
            (Some(message), Some(code)) => format!("{} (code {})", message, code),
            (Some(message), None) => message,
            _ if body.trim().is_empty() => format!("twilio returned status {}", status),
            _ => format!("twilio returned status {}: {}", status, body.trim()),
        }
    }
}

#[async_trait]
impl MessageProvider for TwilioProvider {
    /// Sends an SMS via Twilio
    ///
    /// # Returns
    /// `Ok(())` once Twilio accepts the message (201 Created)
    ///
    /// # Errors
    /// * `InvalidRecipient` - recipient is not a `+`-prefixed number; no request is made
    /// * `AuthenticationFailed` - 401/403
    /// * `RateLimited` - 429
    /// * `Unavailable` - transport failure or 502/503/504
    /// * `Unspecified` - any other status, with Twilio's message preserved
    async fn send(&self, message: &Message) -> Result<(), ProviderError> {
        recipient::validate_phone(&message.recipient)?;

        let start = Instant::now();
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .form(&[
                ("To", message.recipient.as_str()),
                ("From", self.config.from_number.as_str()),
                ("Body", message.body.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let duration_ms = start.elapsed().as_millis() as u64;

        if status.is_success() {
            tracing::debug!(status = status.as_u16(), duration_ms, "Twilio accepted message");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let detail = Self::error_detail(status, &body);
        tracing::debug!(status = status.as_u16(), duration_ms, detail = %detail, "Twilio rejected message");

        Err(ProviderError::from_status(status, detail))
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn channel(&self) -> ChannelType {
        ChannelType::Sms
    }
}
