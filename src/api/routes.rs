//! Router configuration for the API.

use std::time::Duration;

use axum::{Router, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{
    error_response_middleware, logging_middleware, request_id_middleware,
};
use crate::state::AppState;

/// Creates the main application router with all routes and middleware.
///
/// # Middleware Order
/// Layers run outermost first:
/// 1. Request ID - generates/propagates `x-request-id`
/// 2. Logging - `http_request` span carrying the request id
/// 3. Error responses - uniform error bodies stamped with the request id
///
/// # Routes
/// - `/api/health`, `/api/health/live`
/// - `/api/messages`, `/api/messages/{id}`
/// - `/api/providers`
/// - `/swagger-ui` and `/api-docs/openapi.json`
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let api_routes = OpenApiRouter::new()
        .merge(handlers::health::health_routes())
        .merge(handlers::messages::message_routes())
        .merge(handlers::providers::provider_routes());

    let (router, openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", api_routes)
        .split_for_parts();

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(error_response_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
