use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use messagehub::AppState;
use messagehub::api::routes::create_router;
use messagehub::models::{ChannelType, Message};
use messagehub::services::messaging::{
    ConsoleProvider, Dispatcher, InMemoryLifecycleStore, MessageProvider, ProviderError,
    ProviderRegistry,
};

/// SMS provider that never answers.
struct StalledProvider;

#[async_trait]
impl MessageProvider for StalledProvider {
    async fn send(&self, _message: &Message) -> Result<(), ProviderError> {
        std::future::pending().await
    }

    fn name(&self) -> &str {
        "stalled"
    }

    fn channel(&self) -> ChannelType {
        ChannelType::Sms
    }
}

fn stalled_app(send_timeout: Option<Duration>, request_timeout: Duration) -> Router {
    let registry = ProviderRegistry::new();
    registry.register(Arc::new(StalledProvider));
    let dispatcher = Dispatcher::new(Arc::new(registry), Arc::new(InMemoryLifecycleStore::new()))
        .with_send_timeout(send_timeout);
    create_router(AppState::new(Arc::new(dispatcher)), request_timeout)
}

fn app(with_email: bool) -> Router {
    let registry = ProviderRegistry::new();
    registry.register(Arc::new(ConsoleProvider::new("console-sms", ChannelType::Sms)));
    if with_email {
        registry.register(Arc::new(ConsoleProvider::new("console-email", ChannelType::Email)));
    }
    let dispatcher = Dispatcher::new(Arc::new(registry), Arc::new(InMemoryLifecycleStore::new()));
    create_router(AppState::new(Arc::new(dispatcher)), Duration::from_secs(30))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoints_report_ok() {
    let app = app(true);
    for uri in ["/api/health", "/api/health/live"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(json_body(response).await["status"], "ok");
    }
}

#[tokio::test]
async fn send_then_read_back() {
    let app = app(true);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/messages",
            json!({"channel": "sms", "recipient": "+15550001111", "body": "hi"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let sent = json_body(response).await;
    assert_eq!(sent["status"], "sent");
    assert_eq!(sent["provider_name"], "console-sms");

    let id = sent["id"].as_str().unwrap();
    let response = app
        .oneshot(get(&format!("/api/messages/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let record = json_body(response).await;
    assert_eq!(record["id"], id);
    assert_eq!(record["status"], "sent");
    assert_eq!(record["recipient"], "+15550001111");
}

#[tokio::test]
async fn missing_provider_is_a_client_error_with_message_id() {
    let app = app(false);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/messages",
            json!({"channel": "email", "recipient": "a@b.com", "body": "x"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = json_body(response).await;
    assert_eq!(error["code"], "NO_PROVIDER_AVAILABLE");

    // The failed attempt is still recorded.
    let id = error["details"]["message_id"].as_str().unwrap();
    let response = app
        .oneshot(get(&format!("/api/messages/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let record = json_body(response).await;
    assert_eq!(record["status"], "failed");
    assert_eq!(record["provider_name"], "");
}

#[tokio::test]
async fn invalid_recipient_is_rejected() {
    let response = app(true)
        .oneshot(post_json(
            "/api/messages",
            json!({"channel": "email", "recipient": "not-an-email", "body": "x"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "INVALID_RECIPIENT");
}

#[tokio::test]
async fn blank_fields_fail_validation_with_request_id() {
    let response = app(true)
        .oneshot(post_json(
            "/api/messages",
            json!({"channel": "sms", "recipient": "   ", "body": ""}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let header_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("request id header");
    let error = json_body(response).await;
    assert_eq!(error["code"], "VALIDATION_ERROR");
    assert_eq!(error["request_id"], header_id.as_str());

    let fields: Vec<&str> = error["details"]["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["body", "recipient"]);
}

#[tokio::test]
async fn unknown_message_is_not_found() {
    let response = app(true)
        .oneshot(get("/api/messages/00000000-0000-4000-8000-000000000000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn providers_are_listed_in_channel_order() {
    let response = app(true).oneshot(get("/api/providers")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!([
            {"channel": "sms", "name": "console-sms"},
            {"channel": "email", "name": "console-email"}
        ])
    );
}

#[tokio::test]
async fn openapi_document_lists_message_routes() {
    let response = app(true)
        .oneshot(get("/api-docs/openapi.json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let doc = json_body(response).await;
    assert!(doc["paths"]["/api/messages"].is_object());
    assert!(doc["paths"]["/api/messages/{id}"].is_object());
    assert!(doc["paths"]["/api/providers"].is_object());
}

#[tokio::test]
async fn send_deadline_is_a_gateway_timeout() {
    let app = stalled_app(Some(Duration::from_millis(50)), Duration::from_secs(5));

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/messages",
            json!({"channel": "sms", "recipient": "+15550001111", "body": "hi"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let error = json_body(response).await;
    assert_eq!(error["code"], "CANCELLED");
    assert_eq!(error["details"]["provider"], "stalled");

    let id = error["details"]["message_id"].as_str().unwrap();
    let record = json_body(
        app.oneshot(get(&format!("/api/messages/{id}")))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(record["status"], "failed");
    assert_eq!(record["provider_name"], "stalled");
    assert!(
        record["error_detail"]
            .as_str()
            .is_some_and(|d| d.contains("deadline of 50ms exceeded")),
        "{record}"
    );
}

#[tokio::test]
async fn request_timeout_has_its_own_code() {
    let response = stalled_app(None, Duration::from_millis(50))
        .oneshot(post_json(
            "/api/messages",
            json!({"channel": "sms", "recipient": "+15550001111", "body": "hi"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    assert_eq!(json_body(response).await["code"], "REQUEST_TIMEOUT");
}
