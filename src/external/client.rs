use std::sync::LazyLock;
use std::time::Duration;

/// User-Agent sent to every vendor API.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client used by the vendor message providers.
///
/// Initialized lazily on first access and reused across the application so
/// every provider shares one connection pool.
///
/// # Features
/// - **Timeouts**: 30s request timeout, 10s connect timeout (providers
///   override the request timeout per call from their config)
/// - **HTTP/2**: adaptive window sizing and keep-alive
/// - **TLS**: Rustls
///
/// # Example
/// ```ignore
/// use crate::external::client::HTTP_CLIENT;
///
/// let response = HTTP_CLIENT
///     .post("https://api.sendgrid.com/v3/mail/send")
///     .bearer_auth(api_key)
///     .json(&payload)
///     .send()
///     .await?;
/// ```
pub static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    build_client().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build tuned HTTP client, using defaults");
        reqwest::Client::new()
    })
});

fn build_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        // Timeouts
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        // Connection pooling
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        // HTTP/2 settings
        .http2_adaptive_window(true)
        .http2_keep_alive_interval(Duration::from_secs(10))
        .http2_keep_alive_timeout(Duration::from_secs(20))
        .tls_backend_rustls()
        .user_agent(USER_AGENT)
        .build()
}
