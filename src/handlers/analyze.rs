//! Image analysis handler.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use tracing::{info, instrument, warn};

use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::middleware::RequestContext;
use crate::models::{AnalysisRequest, AnalysisResponse};
use crate::state::AppState;
use crate::validation::validate_image_id;

/// Analyze a previously uploaded image.
///
/// # Request Body
///
/// ```json
/// { "image_id": "550e8400-e29b-41d4-a716-446655440000" }
/// ```
///
/// # Responses
///
/// - `200` with the analysis result
/// - `400` `INVALID_REQUEST` for malformed JSON or an empty `image_id`
/// - `404` `NOT_FOUND` when no stored image has that identifier
/// - `500` `INTERNAL` when the stored file cannot be read or decoded
#[instrument(skip_all)]
pub async fn analyze_image(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> AppResult<Json<AnalysisResponse>> {
    let result = run_analysis(&state, &ctx, payload).await;

    let outcome = match &result {
        Ok(_) => "completed",
        Err(AppError::NotFound(_)) => "not_found",
        Err(e) if e.status().is_client_error() => "rejected",
        Err(_) => "failed",
    };
    metrics::record_analysis(outcome);

    result.map(Json)
}

async fn run_analysis(
    state: &AppState,
    ctx: &RequestContext,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> AppResult<AnalysisResponse> {
    let Json(request) = payload?;
    validate_image_id(&request.image_id)?;

    info!(
        correlation_id = %ctx.correlation_id,
        image_id = %request.image_id,
        "Analysis requested"
    );

    let Some(path) = state.store.resolve(&request.image_id).await? else {
        warn!(
            correlation_id = %ctx.correlation_id,
            image_id = %request.image_id,
            "Image not found"
        );
        return Err(AppError::NotFound(format!(
            "Image not found for ID: {}",
            request.image_id
        )));
    };

    let result = state.engine.analyze(&request.image_id, &path).await?;

    info!(
        correlation_id = %ctx.correlation_id,
        image_id = %request.image_id,
        skin_type = result.skin_type.label,
        issues = result.issues.len(),
        confidence = result.confidence,
        "Analysis completed"
    );

    Ok(result.into())
}
