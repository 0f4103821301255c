//! Round-robin HTTP load balancer.
//!
//! Every request, whatever its method or path, is forwarded to the next
//! worker port in a fixed rotation. The rotation is blind: it advances on
//! every request, never skips a slot, and never retries. If the chosen
//! worker cannot be reached (most likely mid-respawn), the client gets an
//! opaque 500 and the next request moves on to the next slot.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tracing::{debug, error};

use crate::common::{Error, Result};

/// Shared rotation position. Each pick takes the counter modulo the pool
/// size, so slots are visited in order regardless of request outcomes.
#[derive(Debug, Default)]
pub struct RotationCursor(AtomicUsize);

impl RotationCursor {
    pub fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    /// Index of the next target in a pool of `len`. `len` must be nonzero.
    pub fn next(&self, len: usize) -> usize {
        self.0.fetch_add(1, Ordering::Relaxed) % len
    }
}

/// Shared state for the proxy handler.
#[derive(Clone)]
pub struct BalancerState {
    targets: Arc<[u16]>,
    cursor: Arc<RotationCursor>,
    client: reqwest::Client,
}

impl BalancerState {
    /// `targets` are worker ports in slot order.
    pub fn new(targets: Vec<u16>) -> Self {
        Self {
            targets: targets.into(),
            cursor: Arc::new(RotationCursor::new()),
            client: reqwest::Client::new(),
        }
    }

    fn next_target(&self) -> Option<u16> {
        if self.targets.is_empty() {
            return None;
        }
        self.targets
            .get(self.cursor.next(self.targets.len()))
            .copied()
    }
}

/// Build the balancer router: one catch-all route that proxies everything.
pub fn router(state: BalancerState) -> Router {
    Router::new().fallback(proxy).with_state(state)
}

async fn proxy(State(state): State<BalancerState>, request: Request<Body>) -> Response {
    let Some(port) = state.next_target() else {
        error!("no worker targets configured");
        return proxy_failure();
    };
    debug!(port, path = request.uri().path(), "forwarding request to worker");

    match forward(&state.client, port, request).await {
        Ok(response) => response,
        Err(e) => {
            error!(port, "proxy error: {}", e);
            proxy_failure()
        }
    }
}

/// The balancer's only error shape: an opaque 500. No retry, no failover.
fn proxy_failure() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

/// Stream the request to the worker and the worker's response back out,
/// preserving method, path, query, headers, status, everything.
async fn forward(client: &reqwest::Client, port: u16, request: Request<Body>) -> Result<Response> {
    let (parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("http://127.0.0.1:{port}{path_and_query}");

    let upstream = client
        .request(parts.method, &url)
        .headers(parts.headers)
        .body(reqwest::Body::wrap_stream(body.into_data_stream()))
        .send()
        .await
        .map_err(|e| Error::Proxy(e.to_string()))?;

    let status = upstream.status();
    let headers = upstream.headers().clone();
    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}
