//! Message API handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use uuid::Uuid;

use crate::api::doc::MESSAGE_TAG;
use crate::api::dto::{ErrorResponse, MessageResponse, SendMessageRequest, SendMessageResponse};
use crate::error::AppResult;
use crate::models::Message;
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;

/// Creates message routes.
///
/// Routes:
/// - POST /messages       - Send one message
/// - GET /messages/{id}   - Read back a recorded message
pub fn message_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(send_message))
        .routes(routes!(get_message))
}

/// POST /api/messages - Send a message
///
/// Routes the message to the provider registered for its channel and waits
/// for the delivery attempt. The message is recorded either way; failures
/// carry its id in `details.message_id`.
#[utoipa::path(
    post,
    path = "/messages",
    tag = MESSAGE_TAG,
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Message sent", body = SendMessageResponse),
        (status = 400, description = "Invalid request, invalid recipient or no provider for the channel", body = ErrorResponse),
        (status = 429, description = "Provider rate limited the send", body = ErrorResponse),
        (status = 500, description = "Provider failure", body = ErrorResponse),
        (status = 504, description = "Send deadline exceeded", body = ErrorResponse)
    )
)]
async fn send_message(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SendMessageRequest>,
) -> AppResult<Json<SendMessageResponse>> {
    let message = state.services.messages.send(Message::from(payload)).await?;
    Ok(Json(SendMessageResponse::from(&message)))
}

/// GET /api/messages/{id} - Get a recorded message
#[utoipa::path(
    get,
    path = "/messages/{id}",
    tag = MESSAGE_TAG,
    params(
        ("id" = Uuid, Path, description = "Message id")
    ),
    responses(
        (status = 200, description = "Recorded message", body = MessageResponse),
        (status = 404, description = "Unknown message id", body = ErrorResponse)
    )
)]
async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let message = state.services.messages.find(id).await?;
    Ok(Json(MessageResponse::from(message)))
}
