//! API key authentication middleware.
//!
//! # Security Features
//!
//! - **Constant-time comparison**: key checks do not leak timing information
//! - **Header only**: the key is read from `X-API-Key`, never from the URL
//! - **Selective protection**: configured public paths bypass the check
//!
//! # Usage
//!
//! ```bash
//! curl -H "X-API-Key: your-secret-key" \
//!      -F "file=@face.jpg;type=image/jpeg" \
//!      http://localhost:8000/api/v1/upload
//! ```
//!
//! # Public Paths
//!
//! Public paths use **exact string matching** against `request.uri().path()`:
//! `/health` is public, `/health/` and `/HEALTH` are not. Query strings are
//! not part of the path, so `/health?probe=1` is public.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, Response};
use axum::response::IntoResponse;
use subtle::ConstantTimeEq;
use tower::{Layer, Service};
use tracing::{debug, warn};

use super::client_ip::client_ip;
use crate::error::AppError;
use crate::metrics;

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

const MISSING_KEY_MESSAGE: &str = "Missing API key. Include X-API-Key header.";
const INVALID_KEY_MESSAGE: &str = "Invalid API key";

/// API key authentication layer.
///
/// Every request whose path is not in `public_paths` must carry the expected
/// key in `X-API-Key`. Rejections are rendered through [`AppError`], so they
/// share the error envelope of every other failure.
#[derive(Clone)]
pub struct ApiKeyAuth {
    expected_key: Arc<String>,
    public_paths: Arc<Vec<String>>,
}

impl ApiKeyAuth {
    /// Create a new API key auth layer.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Expected API key
    /// * `public_paths` - Exact paths reachable without a key
    pub fn new(api_key: String, public_paths: Vec<String>) -> Self {
        Self {
            expected_key: Arc::new(api_key),
            public_paths: Arc::new(public_paths),
        }
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| p == path)
    }
}

impl<S> Layer<S> for ApiKeyAuth {
    type Service = ApiKeyAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ApiKeyAuthService {
            inner,
            auth: self.clone(),
        }
    }
}

/// API key authentication service wrapper.
#[derive(Clone)]
pub struct ApiKeyAuthService<S> {
    inner: S,
    auth: ApiKeyAuth,
}

impl<S> Service<Request<Body>> for ApiKeyAuthService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let auth = self.auth.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let path = req.uri().path();
            if auth.is_public(path) {
                debug!(path, "Public path, skipping auth");
                return inner.call(req).await;
            }

            match check_api_key(&req, &auth.expected_key) {
                KeyCheck::Valid => {
                    debug!("API key authentication successful");
                    inner.call(req).await
                }
                KeyCheck::Missing => {
                    metrics::record_auth_failure("missing");
                    warn!(
                        path = %req.uri().path(),
                        client_ip = %client_ip(&req).unwrap_or_default(),
                        "Request without API key"
                    );
                    Ok(AppError::Unauthorized(MISSING_KEY_MESSAGE.to_string()).into_response())
                }
                KeyCheck::Invalid => {
                    metrics::record_auth_failure("invalid");
                    warn!(
                        path = %req.uri().path(),
                        client_ip = %client_ip(&req).unwrap_or_default(),
                        "Invalid API key attempt"
                    );
                    Ok(AppError::Unauthorized(INVALID_KEY_MESSAGE.to_string()).into_response())
                }
            }
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
enum KeyCheck {
    Valid,
    Missing,
    Invalid,
}

/// Compare the `X-API-Key` header against the expected key.
///
/// An empty header counts as missing. A header that is not valid UTF-8 is
/// compared as raw bytes and so can only ever be invalid.
fn check_api_key<B>(req: &Request<B>, expected: &str) -> KeyCheck {
    match req.headers().get(API_KEY_HEADER) {
        None => KeyCheck::Missing,
        Some(value) if value.is_empty() => KeyCheck::Missing,
        Some(value) if constant_time_eq(value.as_bytes(), expected.as_bytes()) => KeyCheck::Valid,
        Some(_) => KeyCheck::Invalid,
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
