use utoipa::OpenApi;

pub const HEALTH_TAG: &str = "Health";
pub const MESSAGE_TAG: &str = "Messages";
pub const PROVIDER_TAG: &str = "Providers";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MessageHub",
        description = "Notification gateway routing SMS and email to configured providers",
    ),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
            crate::error::ValidationFieldError,
            crate::services::messaging::ErrorKind,
        )
    ),
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = MESSAGE_TAG, description = "Send messages and read back their lifecycle"),
        (name = PROVIDER_TAG, description = "Registered providers"),
    )
)]
pub struct ApiDoc;
