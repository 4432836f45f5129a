//! In-process vendor API stub for provider tests.

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::IntoResponse;

/// A request as the stub received it.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

struct StubState {
    status: StatusCode,
    body: String,
    captured: Mutex<Vec<CapturedRequest>>,
}

/// Handle to a running stub server.
pub struct VendorStub {
    pub base_url: String,
    state: Arc<StubState>,
}

impl VendorStub {
    /// Starts a server on `127.0.0.1:0` that answers every request with
    /// `status` and a JSON `body`.
    pub async fn spawn(status: u16, body: &str) -> Self {
        let state = Arc::new(StubState {
            status: StatusCode::from_u16(status).expect("valid status"),
            body: body.to_string(),
            captured: Mutex::new(Vec::new()),
        });

        let app = Router::new().fallback(respond).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.captured.lock().expect("stub lock").clone()
    }
}

async fn respond(
    State(state): State<Arc<StubState>>,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    state
        .captured
        .lock()
        .expect("stub lock")
        .push(CapturedRequest {
            path: uri.path().to_string(),
            authorization: header_value(header::AUTHORIZATION),
            content_type: header_value(header::CONTENT_TYPE),
            body,
        });

    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body.clone(),
    )
}

/// Plain HTTP client without the shared client's pooling, one per test.
pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}
