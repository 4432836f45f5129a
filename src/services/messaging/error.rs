//! Shared error vocabulary for message delivery.
//!
//! Providers classify their failures into [`ProviderError`]; the dispatcher
//! forwards them inside [`DispatchError`] without reclassifying, adding only
//! the failures it can observe itself (no provider, cancellation).

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::models::ChannelType;

/// Coarse classification of a failed send, stable across providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NoProviderAvailable,
    InvalidRecipient,
    AuthenticationFailed,
    RateLimited,
    ProviderUnavailable,
    UnspecifiedProviderFailure,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NoProviderAvailable => "NO_PROVIDER_AVAILABLE",
            ErrorKind::InvalidRecipient => "INVALID_RECIPIENT",
            ErrorKind::AuthenticationFailed => "AUTHENTICATION_FAILED",
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::ProviderUnavailable => "PROVIDER_UNAVAILABLE",
            ErrorKind::UnspecifiedProviderFailure => "UNSPECIFIED_PROVIDER_FAILURE",
            ErrorKind::Cancelled => "CANCELLED",
        }
    }

    /// Whether the caller can fix the request and try again.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::NoProviderAvailable | ErrorKind::InvalidRecipient
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a provider's `send`.
///
/// Every variant carries the provider-reported detail so it can be persisted
/// as the message's `error_detail`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Address rejected before any network contact.
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("rate limited by provider: {0}")]
    RateLimited(String),

    /// Network or vendor outage while reaching the provider.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("provider failure: {0}")]
    Unspecified(String),
}

impl ProviderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::InvalidRecipient(_) => ErrorKind::InvalidRecipient,
            ProviderError::AuthenticationFailed(_) => ErrorKind::AuthenticationFailed,
            ProviderError::RateLimited(_) => ErrorKind::RateLimited,
            ProviderError::Unavailable(_) => ErrorKind::ProviderUnavailable,
            ProviderError::Unspecified(_) => ErrorKind::UnspecifiedProviderFailure,
        }
    }
}

/// Longest vendor detail kept on a [`ProviderError`], in bytes.
pub const MAX_DETAIL_LEN: usize = 1024;

/// Cuts `detail` to at most [`MAX_DETAIL_LEN`] bytes on a char boundary.
fn truncate_detail(mut detail: String) -> String {
    if detail.len() > MAX_DETAIL_LEN {
        let mut end = MAX_DETAIL_LEN - "...".len();
        while !detail.is_char_boundary(end) {
            end -= 1;
        }
        detail.truncate(end);
        detail.push_str("...");
    }
    detail
}

impl ProviderError {
    /// Classifies a non-success vendor HTTP response. The detail is capped at
    /// [`MAX_DETAIL_LEN`] bytes.
    pub fn from_status(status: reqwest::StatusCode, detail: String) -> Self {
        let detail = truncate_detail(detail);
        match status.as_u16() {
            401 | 403 => ProviderError::AuthenticationFailed(detail),
            429 => ProviderError::RateLimited(detail),
            502..=504 => ProviderError::Unavailable(detail),
            _ => ProviderError::Unspecified(detail),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        ProviderError::Unavailable(error.to_string())
    }
}

/// Why an in-flight send was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller's cancellation token fired.
    Cancelled,
    /// The configured send deadline elapsed.
    DeadlineExceeded(Duration),
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Cancelled => f.write_str("cancelled by caller"),
            CancelReason::DeadlineExceeded(limit) => {
                write!(f, "deadline of {}ms exceeded", limit.as_millis())
            }
        }
    }
}

/// Outcome of a failed dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("no provider available for channel {channel}")]
    NoProviderAvailable { channel: ChannelType },

    /// The provider's own error, forwarded unchanged.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("send via {provider} {reason}")]
    Cancelled {
        provider: String,
        reason: CancelReason,
    },
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::NoProviderAvailable { .. } => ErrorKind::NoProviderAvailable,
            DispatchError::Provider(e) => e.kind(),
            DispatchError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// The provider's error, if the failure came from a provider.
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            DispatchError::Provider(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(
            self,
            DispatchError::Cancelled {
                reason: CancelReason::DeadlineExceeded(_),
                ..
            }
        )
    }
}
