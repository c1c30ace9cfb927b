//! Service status endpoints.
//!
//! - `GET /` - Service banner (`status: "running"`)
//! - `GET /health` - Health check (`status: "healthy"`)
//!
//! Both are public by default so load balancers can probe without a key.

use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::models::HealthResponse;
use crate::state::AppState;

/// Root endpoint.
#[instrument(skip(state))]
pub async fn root(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::new(
        "running",
        &state.config.app_name,
        &state.config.app_version,
    ))
}

/// Health check endpoint.
///
/// # Response Body
///
/// ```json
/// {
///   "success": true,
///   "timestamp": "2024-01-15T10:30:00.000000Z",
///   "status": "healthy",
///   "service": "Image Analysis API",
///   "version": "0.1.0"
/// }
/// ```
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::new(
        "healthy",
        &state.config.app_name,
        &state.config.app_version,
    ))
}
