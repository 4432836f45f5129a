//! Health check endpoint handlers.
//!
//! Both probes are stateless: they report that the process is serving HTTP
//! and never touch providers or the lifecycle store.

use axum::Json;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::HEALTH_TAG;
use crate::api::dto::HealthResponse;
use crate::state::AppState;

/// Creates health check routes.
///
/// # Routes
/// - `GET /health` - Basic health check
/// - `GET /health/live` - Liveness probe
pub fn health_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health_check))
        .routes(routes!(liveness_check))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = HEALTH_TAG
)]
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Liveness probe endpoint.
#[utoipa::path(
    get,
    path = "/health/live",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    ),
    tag = HEALTH_TAG
)]
async fn liveness_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
