use axum::{Json, extract::State};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::PROVIDER_TAG;
use crate::api::dto::ProviderResponse;
use crate::state::AppState;

pub fn provider_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(list_providers))
}

/// GET /api/providers - Active channel to provider mapping
#[utoipa::path(
    get,
    path = "/providers",
    tag = PROVIDER_TAG,
    responses(
        (status = 200, description = "Registered providers in channel order", body = Vec<ProviderResponse>)
    )
)]
async fn list_providers(State(state): State<AppState>) -> Json<Vec<ProviderResponse>> {
    let providers = state
        .services
        .messages
        .providers()
        .into_iter()
        .map(ProviderResponse::from)
        .collect();
    Json(providers)
}
