//! tinypaste-api — HTTP surface for tinypaste.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Landing page (the configured index asset) |
//! | GET | `/{name}` | Reserved static asset, or the paste with that id |
//! | POST | `/` | Create a paste from a urlencoded, multipart or query field, redirect to it |

pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tinypaste_core::PasteConfig;
use tinypaste_store::PasteStore;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<PasteStore>,
    pub config: Arc<PasteConfig>,
}

impl ApiState {
    pub fn new(store: PasteStore, config: PasteConfig) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }
}

/// Build the complete router with request logging and the body size limit.
pub fn build_router(state: ApiState) -> Router {
    let body_limit = state.config.max_paste_bytes;

    Router::new()
        .route("/", get(handlers::index).post(handlers::create_paste))
        .route("/{name}", get(handlers::get_by_name))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::log_requests,
        ))
        .with_state(state)
}
