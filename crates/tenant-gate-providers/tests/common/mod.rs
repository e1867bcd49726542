// crates/tenant-gate-providers/tests/common/mod.rs
// ============================================================================
// Module: Provider Test Fixtures
// Description: Scripted in-process HTTP servers for provider tests.
// Purpose: Capture outbound requests and replay canned responses.
// Dependencies: axum, tokio
// ============================================================================

//! ## Overview
//! Spawns an axum server on `127.0.0.1:0` that records every request it sees
//! and answers with a fixed status and body. Servers shut down when the
//! returned handle is dropped.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only helpers use unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use tenant_gate_providers::HttpClientSettings;
use tokio::sync::oneshot;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// One request observed by the scripted server.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// HTTP method.
    pub method: Method,
    /// Raw, still percent-encoded path.
    pub path: String,
    /// Authorization header value.
    pub authorization: Option<String>,
    /// Correlation header value.
    pub correlation: Option<String>,
    /// Request body.
    pub body: String,
}

/// Canned response and request log.
struct ScriptState {
    /// Status returned for every request.
    status: StatusCode,
    /// Body returned for every request.
    body: String,
    /// Delay before answering.
    delay: Option<Duration>,
    /// Requests received.
    captured: Mutex<Vec<CapturedRequest>>,
}

/// Running scripted server.
pub struct ScriptedServer {
    /// Base URL (`http://127.0.0.1:port`).
    pub base_url: String,
    /// Shared state.
    state: Arc<ScriptState>,
    /// Shutdown trigger; dropping it stops the server.
    _shutdown: oneshot::Sender<()>,
}

impl ScriptedServer {
    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.captured.lock().unwrap().clone()
    }
}

async fn scripted_handler(
    State(state): State<Arc<ScriptState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, [(axum::http::HeaderName, &'static str); 1], String) {
    let header = |name: &str| {
        headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
    };
    state.captured.lock().unwrap().push(CapturedRequest {
        method,
        path: uri.path().to_string(),
        authorization: header(AUTHORIZATION.as_str()),
        correlation: header("x-correlation-id"),
        body,
    });
    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }
    (state.status, [(CONTENT_TYPE, "application/json")], state.body.clone())
}

/// Spawns a server answering every request with `status` and `body`.
pub async fn spawn_scripted(status: StatusCode, body: &str) -> ScriptedServer {
    spawn_scripted_with_delay(status, body, None).await
}

/// Spawns a scripted server that waits `delay` before answering.
pub async fn spawn_scripted_with_delay(
    status: StatusCode,
    body: &str,
    delay: Option<Duration>,
) -> ScriptedServer {
    let state = Arc::new(ScriptState {
        status,
        body: body.to_string(),
        delay,
        captured: Mutex::new(Vec::new()),
    });
    let app = Router::new().fallback(scripted_handler).with_state(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await;
    });
    ScriptedServer {
        base_url: format!("http://{addr}"),
        state,
        _shutdown: shutdown_tx,
    }
}

/// Returns a base URL nothing listens on.
pub async fn unused_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}

/// Transport settings for local cleartext test servers.
pub fn local_settings() -> HttpClientSettings {
    HttpClientSettings {
        connect_timeout: Duration::from_millis(250),
        request_timeout: Duration::from_millis(1_000),
        allow_http: true,
        ..HttpClientSettings::default()
    }
}
