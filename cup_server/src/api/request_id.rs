//! Per-request correlation IDs.
//!
//! Every request carries an `x-request-id`: the caller's own when it sent a
//! usable one, a fresh UUID otherwise. The ID is echoed on the response,
//! attached to the request log lines, and available to handlers through the
//! [`RequestId`] extractor. The same middleware records the HTTP metrics.

use super::{ApiError, ErrorResponse};
use crate::{logging, metrics};
use axum::{
    Json,
    extract::{FromRequestParts, MatchedPath, Request},
    http::{HeaderMap, HeaderValue, StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};
use std::fmt;
use std::time::Instant;
use uuid::Uuid;

/// Header name for request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied ID that is passed through
pub const MAX_REQUEST_ID_LEN: usize = 64;

/// Correlation ID of the request being handled
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// Reuse the caller's ID when it is short printable ASCII, else mint one
    fn from_headers(headers: &HeaderMap) -> Self {
        let supplied = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|s| {
                !s.is_empty()
                    && s.len() <= MAX_REQUEST_ID_LEN
                    && s.bytes().all(|b| b.is_ascii_graphic())
            });

        match supplied {
            Some(id) => Self(id.to_string()),
            None => Self(Uuid::new_v4().to_string()),
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tag the request, echo the ID on the response, then log and count it.
///
/// Paths are recorded by route template (`/api/v1/matches/{match_id}`) when
/// the router matched one, so metric labels stay bounded.
///
/// ```no_run
/// use axum::{Router, middleware, routing::get};
/// use cup_server::api::request_id::request_id_middleware;
///
/// let app: Router = Router::new()
///     .route("/", get(|| async { "ok" }))
///     .layer(middleware::from_fn(request_id_middleware));
/// ```
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_headers(request.headers());
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let started = Instant::now();

    tracing::info!(request_id = %request_id, method = %method, uri = %request.uri(), "Request started");
    request.extensions_mut().insert(request_id.clone());

    let mut response = next.run(request).await;

    // Only IDs that were valid header values get this far
    if let Ok(value) = HeaderValue::from_str(&request_id.0) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let elapsed = started.elapsed();
    let status = response.status().as_u16();
    logging::log_api_request(
        &request_id.0,
        &method,
        &path,
        status,
        elapsed.as_millis() as u64,
    );
    metrics::http_requests_total(&method, &path, status);
    metrics::http_request_duration_ms(&method, &path, elapsed.as_secs_f64() * 1000.0);

    response
}

impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<RequestId>().cloned().ok_or_else(|| {
            tracing::error!("Handler asked for a request ID outside the middleware");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal server error".to_string(),
                    fields: Vec::new(),
                }),
            )
        })
    }
}
