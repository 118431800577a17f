//! Request handlers.
//!
//! Each handler goes through `PasteStore` and maps its outcome onto a
//! status code. Error bodies only ever carry the canonical status text.
//! Store calls touch the filesystem, so they run on the blocking pool and
//! bodies are streamed from the opened file.

use std::collections::HashMap;
use std::fmt::Display;
use std::fs::File;

use axum::body::Body;
use axum::extract::{Form, FromRequest, Multipart, Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, warn};

use tinypaste_store::{PasteStore, ResolvedTarget, StoreError, StoreResult};

use crate::ApiState;

const PASTE_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
const INDEX_CONTENT_TYPE: &str = "text/html";

fn status_response(status: StatusCode) -> Response {
    let text = status.canonical_reason().unwrap_or("Error");
    (status, text).into_response()
}

/// Map a store error onto a response, logging only operator-facing faults.
fn error_response(err: StoreError) -> Response {
    let status = match &err {
        StoreError::Validation(_) => StatusCode::BAD_REQUEST,
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Storage { .. } | StoreError::Exhausted { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if err.is_fault() {
        error!(error = %err, "storage fault");
    }
    status_response(status)
}

fn stream_response(content_type: &str, file: File) -> Response {
    let body = Body::from_stream(ReaderStream::new(tokio::fs::File::from_std(file)));
    ([(header::CONTENT_TYPE, content_type.to_string())], body).into_response()
}

/// Run a store operation on the blocking pool.
///
/// A panicked or cancelled task surfaces as a storage fault.
async fn with_store<T, F>(state: &ApiState, op: F) -> StoreResult<T>
where
    T: Send + 'static,
    F: FnOnce(&PasteStore) -> StoreResult<T> + Send + 'static,
{
    let store = state.store.clone();
    match tokio::task::spawn_blocking(move || op(&store)).await {
        Ok(result) => result,
        Err(e) => Err(StoreError::Storage {
            context: "store task".into(),
            source: std::io::Error::other(e),
        }),
    }
}

/// GET /
pub async fn index(State(state): State<ApiState>) -> Response {
    let name = state.config.index_file.clone();
    let lookup = name.clone();
    match with_store(&state, move |store| store.read_static(&lookup)).await {
        Ok(asset) => {
            let content_type = asset.content_type.as_deref().unwrap_or(INDEX_CONTENT_TYPE);
            stream_response(content_type, asset.file)
        }
        Err(StoreError::NotFound(_)) => {
            warn!(%name, "landing page is missing from the data directory");
            status_response(StatusCode::NOT_FOUND)
        }
        Err(e) => error_response(e),
    }
}

/// GET /{name}
pub async fn get_by_name(State(state): State<ApiState>, Path(name): Path<String>) -> Response {
    match state.store.resolve(&name) {
        ResolvedTarget::StaticAsset(name) => {
            match with_store(&state, move |store| store.read_static(&name)).await {
                Ok(asset) => {
                    let content_type = asset
                        .content_type
                        .as_deref()
                        .unwrap_or(FALLBACK_CONTENT_TYPE);
                    stream_response(content_type, asset.file)
                }
                Err(e) => error_response(e),
            }
        }
        ResolvedTarget::PasteLookup(id) => {
            match with_store(&state, move |store| store.read(&id)).await {
                Ok(file) => stream_response(PASTE_CONTENT_TYPE, file),
                Err(e) => error_response(e),
            }
        }
    }
}

/// POST /
///
/// The text is taken from the configured field of a urlencoded or
/// multipart body, falling back to the query string. A missing, empty or
/// unreadable submission is `400`; only an oversized body keeps its `413`.
///
/// Responds `303 See Other` to `/{id}`, with `{host}/{id}` in the body for
/// clients that do not follow redirects.
pub async fn create_paste(State(state): State<ApiState>, request: Request) -> Response {
    let field = state.config.form_field.as_str();
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let from_query = Query::<HashMap<String, String>>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(mut params)| params.remove(field));

    let text = match body_field(request, field).await {
        Ok(from_body) => from_body.or(from_query).unwrap_or_default(),
        Err(status) => return status_response(status),
    };

    let content = text.into_bytes();
    match with_store(&state, move |store| store.create(&content)).await {
        Ok(id) => (
            StatusCode::SEE_OTHER,
            [(header::LOCATION, format!("/{id}"))],
            format!("{host}/{id}\n"),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Value of `field` in the request body, if the body carries it.
async fn body_field(request: Request, field: &str) -> Result<Option<String>, StatusCode> {
    if is_multipart(request.headers()) {
        let mut multipart = match Multipart::from_request(request, &()).await {
            Ok(multipart) => multipart,
            Err(rejection) => return unreadable(rejection.status(), rejection),
        };
        loop {
            match multipart.next_field().await {
                Ok(Some(part)) if part.name() == Some(field) => {
                    return match part.text().await {
                        Ok(text) => Ok(Some(text)),
                        Err(e) => unreadable(e.status(), e),
                    };
                }
                Ok(Some(_)) => continue,
                Ok(None) => return Ok(None),
                Err(e) => return unreadable(e.status(), e),
            }
        }
    }

    match Form::<HashMap<String, String>>::from_request(request, &()).await {
        Ok(Form(mut fields)) => Ok(fields.remove(field)),
        Err(rejection) => unreadable(rejection.status(), rejection),
    }
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| {
            v.get(..19)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("multipart/form-data"))
        })
}

/// An unreadable body counts as carrying no field, unless it was too large.
fn unreadable(status: StatusCode, reason: impl Display) -> Result<Option<String>, StatusCode> {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return Err(status);
    }
    debug!(%reason, "ignoring unreadable submission body");
    Ok(None)
}
