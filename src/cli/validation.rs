//! clap value parsers for CLI arguments.

use std::net::IpAddr;
use std::path::PathBuf;

use crate::services::messaging::recipient::MAX_RECIPIENT_LEN;

const MAX_ROLLBACK_STEPS: u32 = 100;

/// Port in 1..=65535.
pub fn validate_port(value: &str) -> Result<u16, String> {
    match value.parse::<u16>() {
        Ok(0) => Err("Port must be between 1 and 65535".to_string()),
        Ok(port) => Ok(port),
        Err(_) => Err(format!(
            "Invalid port '{value}': must be a number between 1 and 65535"
        )),
    }
}

/// Existing regular file.
pub fn validate_config_file_path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if !path.exists() {
        return Err(format!("Configuration file does not exist: '{value}'"));
    }
    if !path.is_file() {
        return Err(format!("Configuration path is not a file: '{value}'"));
    }
    Ok(path)
}

/// Rollback steps in 1..=100.
pub fn validate_rollback_steps(value: &str) -> Result<u32, String> {
    let steps: u32 = value
        .parse()
        .map_err(|_| format!("Invalid rollback steps '{value}': must be a positive number"))?;
    if steps == 0 || steps > MAX_ROLLBACK_STEPS {
        return Err(format!(
            "Rollback steps must be between 1 and {MAX_ROLLBACK_STEPS}"
        ));
    }
    Ok(steps)
}

/// IP address, `localhost`, or an RFC 1123 hostname.
pub fn validate_host_address(value: &str) -> Result<String, String> {
    if value.is_empty() {
        return Err("Host address cannot be empty".to_string());
    }
    if value == "localhost" || value.parse::<IpAddr>().is_ok() {
        return Ok(value.to_string());
    }
    // Dotted digits that failed IP parsing are a malformed address, not a hostname.
    if value.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(format!("Invalid IP address '{value}'"));
    }

    let valid_label = |label: &str| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    };
    if value.len() <= 253 && value.split('.').all(valid_label) {
        Ok(value.to_string())
    } else {
        Err(format!(
            "Invalid host address '{value}': expected an IP address, 'localhost' or a hostname"
        ))
    }
}

/// Rejects empty or whitespace-only values.
pub fn validate_non_blank(value: &str) -> Result<String, String> {
    if value.trim().is_empty() {
        Err("Value must not be blank".to_string())
    } else {
        Ok(value.to_string())
    }
}

/// Recipient address: non-blank and short enough to be recorded
pub fn validate_recipient(value: &str) -> Result<String, String> {
    let value = validate_non_blank(value)?;
    if value.chars().count() > MAX_RECIPIENT_LEN {
        return Err(format!(
            "Recipient must be at most {} characters",
            MAX_RECIPIENT_LEN
        ));
    }
    Ok(value)
}
