//! Recipient address checks shared by the providers.

use std::sync::LazyLock;

use regex::Regex;

use super::error::ProviderError;
use crate::models::ChannelType;

/// Longest recipient the lifecycle store accepts.
pub const MAX_RECIPIENT_LEN: usize = 255;

/// E.164-style number: a leading `+` followed by 7 to 15 digits.
static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[0-9]{7,15}$").expect("phone regex is valid"));

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$")
        .expect("email regex is valid")
});

pub fn validate_phone(recipient: &str) -> Result<(), ProviderError> {
    if !recipient.starts_with('+') {
        return Err(ProviderError::InvalidRecipient(
            "phone must start with +".to_string(),
        ));
    }
    if !PHONE_REGEX.is_match(recipient) {
        return Err(ProviderError::InvalidRecipient(
            "phone must be + followed by 7 to 15 digits".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_email(recipient: &str) -> Result<(), ProviderError> {
    if !EMAIL_REGEX.is_match(recipient) {
        return Err(ProviderError::InvalidRecipient(
            "invalid email format".to_string(),
        ));
    }
    Ok(())
}

/// Validates `recipient` against the address format of `channel`.
pub fn validate_for(channel: ChannelType, recipient: &str) -> Result<(), ProviderError> {
    match channel {
        ChannelType::Sms => validate_phone(recipient),
        ChannelType::Email => validate_email(recipient),
    }
}
