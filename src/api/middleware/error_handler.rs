//! Error handler for converting AppError to HTTP responses.
//!
//! `AppError` renders itself as an `ErrorResponse` and also stashes that
//! response in the response extensions. [`error_response_middleware`] then
//! stamps the request id onto it, and converts non-JSON error bodies produced
//! by axum itself (unknown route, wrong method) into the same format.

use axum::{
    Json,
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::RequestId;
use crate::api::dto::ErrorResponse;
use crate::error::AppError;
use crate::services::messaging::{DispatchError, ErrorKind};

/// Status for a failed dispatch, by error kind.
fn dispatch_status(error: &DispatchError) -> StatusCode {
    match error.kind() {
        ErrorKind::NoProviderAvailable | ErrorKind::InvalidRecipient => StatusCode::BAD_REQUEST,
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::Cancelled if error.is_deadline_exceeded() => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Maps an AppError variant to its corresponding HTTP status code.
///
/// # Status Code Mapping
/// - NotFound → 404
/// - Validation, ValidationErrors, BadRequest → 400
/// - Dispatch → 400 (no provider, invalid recipient), 429 (rate limited),
///   504 (send deadline), otherwise 500
/// - ConnectionPool → 503
/// - Database, Configuration, Internal → 500
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Validation { .. } => StatusCode::BAD_REQUEST,
        AppError::ValidationErrors { .. } => StatusCode::BAD_REQUEST,
        AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::Dispatch { source, .. } => dispatch_status(source),
        AppError::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        AppError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        AppError::ConnectionPool { .. } => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Maps an AppError variant to its error code string.
pub fn error_to_code(error: &AppError) -> &'static str {
    match error {
        AppError::NotFound { .. } => "NOT_FOUND",
        AppError::Validation { .. } | AppError::ValidationErrors { .. } => "VALIDATION_ERROR",
        AppError::BadRequest { .. } => "BAD_REQUEST",
        AppError::Dispatch { source, .. } => source.kind().as_str(),
        AppError::Database { .. } => "DATABASE_ERROR",
        AppError::Configuration { .. } => "CONFIGURATION_ERROR",
        AppError::ConnectionPool { .. } => "SERVICE_UNAVAILABLE",
        AppError::Internal { .. } => "INTERNAL_ERROR",
    }
}

/// Builds the response body. Server-side failures are sanitized; their
/// sources are logged instead.
pub fn error_to_response_body(error: &AppError) -> ErrorResponse {
    let code = error_to_code(error);
    match error {
        AppError::NotFound {
            entity,
            field,
            value,
        } => ErrorResponse::new(code, &format!("{} with {} '{}' not found", entity, field, value)),
        AppError::Validation { field, reason } => {
            ErrorResponse::new(code, reason).with_details(json!({ "field": field }))
        }
        AppError::ValidationErrors { errors } => {
            ErrorResponse::new(code, "Request validation failed")
                .with_details(json!({ "errors": errors }))
        }
        AppError::BadRequest { message } => ErrorResponse::new(code, message),
        AppError::Dispatch { message_id, source } => {
            let mut details = json!({ "message_id": message_id });
            if let DispatchError::Cancelled { provider, .. } = source {
                details["provider"] = json!(provider);
            }
            ErrorResponse::new(code, &source.to_string()).with_details(details)
        }
        AppError::Database { operation, .. } => {
            ErrorResponse::new(code, &format!("Database operation failed: {}", operation))
        }
        AppError::Configuration { key, .. } => {
            ErrorResponse::new(code, &format!("Configuration error: {}", key))
        }
        AppError::ConnectionPool { .. } => {
            ErrorResponse::new(code, "Database connection unavailable")
        }
        AppError::Internal { .. } => ErrorResponse::new(code, "An internal error occurred"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        }

        let body = error_to_response_body(&self);
        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

fn fallback_body(status: StatusCode) -> ErrorResponse {
    let code = match status {
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::METHOD_NOT_ALLOWED => "METHOD_NOT_ALLOWED",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
        StatusCode::REQUEST_TIMEOUT => "REQUEST_TIMEOUT",
        s if s.is_server_error() => "INTERNAL_ERROR",
        _ => "BAD_REQUEST",
    };
    ErrorResponse::new(code, status.canonical_reason().unwrap_or("Request failed"))
}

/// Gives every error response the `ErrorResponse` shape and the request id.
pub async fn error_response_middleware(request: Request, next: Next) -> Response {
    let request_id = request.extensions().get::<RequestId>().map(|r| r.0.clone());
    let response = next.run(request).await;

    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let body = match response.extensions().get::<ErrorResponse>() {
        Some(body) => body.clone(),
        None if is_json(&response) => return response,
        None => fallback_body(status),
    };
    let body = match &request_id {
        Some(id) => body.with_request_id(id),
        None => body,
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    let mut rebuilt = (status, Json(body)).into_response();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE {
            rebuilt.headers_mut().insert(name.clone(), value.clone());
        }
    }
    rebuilt
}
