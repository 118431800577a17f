//! Request logging.

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use tracing::info;

use crate::ApiState;

/// Log one line per request with method, path, status, latency and client.
pub async fn log_requests(State(state): State<ApiState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_addr(req.headers(), peer, state.config.real_ip);

    let started = Instant::now();
    let resp = next.run(req).await;

    info!(
        %method,
        %path,
        status = resp.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        client = client.as_deref().unwrap_or("-"),
        "request"
    );
    resp
}

/// The address to attribute a request to.
///
/// With `trust_proxy` set, `X-Real-IP` wins, then the first
/// `X-Forwarded-For` hop; otherwise only the socket peer is used.
pub fn client_addr(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy: bool,
) -> Option<String> {
    if trust_proxy {
        let header_value = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };
        if let Some(ip) = header_value("x-real-ip") {
            return Some(ip.to_string());
        }
        if let Some(first) = header_value("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return Some(first.to_string());
        }
    }
    peer.map(|addr| addr.ip().to_string())
}
