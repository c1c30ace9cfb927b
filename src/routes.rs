//! Application routing configuration with middleware stack.
//!
//! # Middleware Stack (outermost first)
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │   Correlation    │ ← X-Correlation-ID, X-Process-Time, request span
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │      CORS        │ ← Cross-origin headers, answers preflight
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │  Authentication  │ ← 401 if missing/invalid (bypassed for public paths)
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │   Catch Panic    │ ← 500 INTERNAL envelope
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │   Body Limit     │ ← FILE_TOO_LARGE for oversized uploads
//! └────────┬─────────┘
//!          │
//!          ▼
//!      Handler
//! ```
//!
//! # Routes
//!
//! - `GET /`, `GET /health` - Service status (public)
//! - `POST {prefix}/upload` - Multipart image upload
//! - `POST {prefix}/analyze` - Analysis of an uploaded image
//!
//! Unknown paths and unsupported methods answer with the error envelope
//! (`NOT_FOUND` / `METHOD_NOT_ALLOWED`).

use std::any::Any;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderName;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tracing::{error, info};

use crate::error::AppError;
use crate::handlers;
use crate::middleware::{ApiKeyAuth, CORRELATION_ID_HEADER, CorrelationLayer, PROCESS_TIME_HEADER};
use crate::state::AppState;

/// Build the application router with all routes and middleware configured.
pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    let cors = build_cors_layer(&config.cors_origins);
    let auth = ApiKeyAuth::new(config.api_key.clone(), config.public_paths.clone());

    let router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route(&config.api_path("/upload"), post(handlers::upload_image))
        .route(&config.api_path("/analyze"), post(handlers::analyze_image))
        .fallback(handlers::route_not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed);

    info!(
        max_body_bytes = config.max_request_body_size(),
        max_file_bytes = config.max_file_size,
        "Request body size limit configured"
    );
    info!(public_paths = ?config.public_paths, "API key authentication enabled");

    // Router::layer wraps everything added before it, so the last layer is
    // the outermost one.
    router
        .layer(DefaultBodyLimit::max(config.max_request_body_size()))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(auth)
        .layer(cors)
        .layer(CorrelationLayer::new())
        .with_state(state)
}

/// Render a handler panic as an `INTERNAL` error envelope.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");

    error!(panic = detail, "Handler panicked");
    AppError::Internal(format!("handler panicked: {detail}")).into_response()
}

/// Build CORS layer from configuration.
///
/// `*` allows any origin; otherwise only the listed origins are allowed.
/// The correlation and timing headers are exposed to browser clients.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let exposed = [
        HeaderName::from_static(CORRELATION_ID_HEADER),
        HeaderName::from_static(PROCESS_TIME_HEADER),
    ];

    let layer = if allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(AnyOrigin)
    } else {
        let origins: Vec<_> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    };

    layer
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin)
        .expose_headers(exposed)
}
