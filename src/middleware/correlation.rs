//! Correlation and request logging middleware.
//!
//! # Behavior
//!
//! For every request the middleware:
//! 1. Generates a fresh UUIDv4 correlation id (client-supplied ids are ignored)
//! 2. Stores a [`RequestContext`] in the request extensions
//! 3. Opens a `request` span carrying the id; every event emitted downstream
//!    is recorded inside it
//! 4. Logs `Request started` with method, path, query string and client address
//! 5. On a response: adds `X-Correlation-ID` and `X-Process-Time`, stamps the
//!    id into error envelopes, logs `Request completed`
//! 6. On a service error: logs `Request failed` and returns the error unchanged
//!
//! # Client Usage
//!
//! ```bash
//! curl -i http://localhost:8000/health
//! # x-correlation-id: 1b4e28ba-2fa1-41d2-883f-0016d3cca427
//! # x-process-time: 0.000183
//! ```

use std::fmt::Display;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::FromRequestParts;
use axum::http::header::{self, HeaderValue};
use axum::http::request::Parts;
use axum::http::{Request, Response};
use tower::{Layer, Service};
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use super::client_ip::client_ip;
use crate::error::{AppError, ErrorEnvelope};
use crate::metrics;

/// Response header carrying the correlation id.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Response header carrying the elapsed processing time in seconds.
pub const PROCESS_TIME_HEADER: &str = "x-process-time";

/// Fallback header value when the id cannot be encoded.
static UNKNOWN_CORRELATION_ID: HeaderValue = HeaderValue::from_static("unknown");

/// Per-request scope created by [`CorrelationLayer`].
///
/// Read-only after creation. Handlers take it as an extractor.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub correlation_id: String,
    pub started_at: Instant,
}

impl RequestContext {
    pub fn new(correlation_id: String) -> Self {
        Self {
            correlation_id,
            started_at: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| AppError::Internal("request context missing".to_string()))
    }
}

/// Correlation layer for the Tower middleware stack. Must be the outermost
/// layer so every response, including auth rejections, carries the headers.
#[derive(Clone, Default)]
pub struct CorrelationLayer;

impl CorrelationLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for CorrelationLayer {
    type Service = CorrelationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationService { inner }
    }
}

/// Correlation service wrapper.
#[derive(Clone)]
pub struct CorrelationService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for CorrelationService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Display,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let ctx = RequestContext::new(Uuid::new_v4().to_string());
        let correlation_id = ctx.correlation_id.clone();

        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let query = req.uri().query().unwrap_or_default().to_string();
        let client = client_ip(&req).unwrap_or_else(|| "unknown".to_string());

        req.extensions_mut().insert(ctx.clone());

        let span = info_span!(
            "request",
            correlation_id = %correlation_id,
            method = %method,
            path = %path,
        );

        let mut inner = self.inner.clone();

        Box::pin(
            async move {
                info!(
                    correlation_id = %correlation_id,
                    method = %method,
                    path = %path,
                    query_params = %query,
                    client_ip = %client,
                    "Request started: {method} {path}"
                );

                match inner.call(req).await {
                    Ok(response) => {
                        let elapsed = ctx.elapsed();
                        let response = finalize_response(response, &correlation_id, elapsed);
                        let status = response.status();

                        metrics::record_request(method.as_str(), status.as_u16(), elapsed);

                        if status.is_server_error() {
                            error!(
                                correlation_id = %correlation_id,
                                status_code = status.as_u16(),
                                process_time = %format_seconds(elapsed),
                                "Request completed with server error: {method} {path}"
                            );
                        } else {
                            info!(
                                correlation_id = %correlation_id,
                                status_code = status.as_u16(),
                                process_time = %format_seconds(elapsed),
                                "Request completed: {method} {path}"
                            );
                        }

                        Ok(response)
                    }
                    Err(err) => {
                        let elapsed = ctx.elapsed();
                        error!(
                            correlation_id = %correlation_id,
                            error = %err,
                            process_time = %format_seconds(elapsed),
                            "Request failed: {method} {path}"
                        );
                        Err(err)
                    }
                }
            }
            .instrument(span),
        )
    }
}

/// Add correlation headers and stamp the id into an error envelope, if any.
fn finalize_response(
    response: Response<Body>,
    correlation_id: &str,
    elapsed: Duration,
) -> Response<Body> {
    let mut response = match response.extensions().get::<ErrorEnvelope>().cloned() {
        Some(envelope) => restamp_error_body(response, envelope.with_correlation_id(correlation_id)),
        None => response,
    };

    let headers = response.headers_mut();
    headers.insert(
        CORRELATION_ID_HEADER,
        HeaderValue::from_str(correlation_id).unwrap_or_else(|_| UNKNOWN_CORRELATION_ID.clone()),
    );
    if let Ok(value) = HeaderValue::from_str(&elapsed.as_secs_f64().to_string()) {
        headers.insert(PROCESS_TIME_HEADER, value);
    }

    response
}

/// Replace the body of an error response with the stamped envelope.
fn restamp_error_body(response: Response<Body>, envelope: ErrorEnvelope) -> Response<Body> {
    let (mut parts, body) = response.into_parts();
    match serde_json::to_vec(&envelope) {
        Ok(bytes) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            parts.extensions.insert(envelope);
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(e) => {
            warn!(error = %e, "Failed to re-render error envelope");
            Response::from_parts(parts, body)
        }
    }
}

fn format_seconds(elapsed: Duration) -> String {
    format!("{:.4}s", elapsed.as_secs_f64())
}
