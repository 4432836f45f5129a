//! Data Transfer Objects for API requests and responses.

mod error;
mod health;
mod message;

pub use error::ErrorResponse;
pub use health::HealthResponse;
pub use message::{MessageResponse, ProviderResponse, SendMessageRequest, SendMessageResponse};
