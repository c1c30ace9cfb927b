//! Image upload handler.
//!
//! `POST {prefix}/upload` takes a `multipart/form-data` body with a single
//! file field named `file`. The file is validated against the upload policy,
//! assigned a fresh identifier and written to the image store.

use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use tracing::{info, instrument};

use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::middleware::RequestContext;
use crate::models::{UploadResponse, UploadedFile};
use crate::services::ImageStore;
use crate::state::AppState;
use crate::validation::UploadPolicy;

/// Name of the multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

/// Upload an image.
///
/// # Responses
///
/// - `201` with `{success, timestamp, image_id, filename, file_size, message}`
/// - `400` `INVALID_FILE_TYPE` / `FILE_TOO_LARGE` / `EMPTY_FILE` for policy violations
/// - `400` `INVALID_REQUEST` for a malformed body or a missing `file` field
/// - `500` `INTERNAL` when the file cannot be stored
#[instrument(skip_all)]
pub async fn upload_image(
    State(state): State<AppState>,
    ctx: RequestContext,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<UploadResponse>)> {
    let result = store_upload(&state, &ctx, multipart).await;

    let outcome = match &result {
        Ok(_) => "stored",
        Err(e) if e.status().is_client_error() => "rejected",
        Err(_) => "failed",
    };
    metrics::record_upload(outcome, result.as_ref().ok().map(|r| r.file_size));

    result.map(|response| (StatusCode::CREATED, Json(response)))
}

async fn store_upload(
    state: &AppState,
    ctx: &RequestContext,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<UploadResponse> {
    let mut multipart = multipart.map_err(|rejection| {
        AppError::bad_request(format!("Invalid multipart request: {}", rejection.body_text()))
    })?;

    let upload = read_file_field(&mut multipart, &state.policy)
        .await?
        .ok_or_else(|| {
            AppError::bad_request_field(
                "No file provided. Include a multipart field named 'file'.",
                FILE_FIELD,
            )
        })?;

    info!(
        correlation_id = %ctx.correlation_id,
        filename = upload.display_name(),
        content_type = upload.content_type.as_deref().unwrap_or("none"),
        size = upload.len(),
        "Upload received"
    );

    state.policy.validate(&upload)?;

    let image_id = ImageStore::generate_id();
    state
        .store
        .save(&image_id, upload.file_name.as_deref(), &upload.data)
        .await?;

    info!(
        correlation_id = %ctx.correlation_id,
        image_id = %image_id,
        filename = upload.display_name(),
        file_size = upload.len(),
        "Image uploaded successfully"
    );

    Ok(UploadResponse::new(
        image_id,
        upload.display_name().to_string(),
        upload.len(),
    ))
}

/// Read the first `file` field of the body into memory.
///
/// Other fields are skipped. Returns `None` if the body has no `file` field.
async fn read_file_field(
    multipart: &mut Multipart,
    policy: &UploadPolicy,
) -> AppResult<Option<UploadedFile>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, policy))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(|e| multipart_error(e, policy))?;

        return Ok(Some(UploadedFile::new(file_name, content_type, data)));
    }

    Ok(None)
}

/// A body cut off by the request size limit is a too-large file; anything
/// else is a malformed request.
fn multipart_error(err: MultipartError, policy: &UploadPolicy) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        policy.too_large(None)
    } else {
        AppError::bad_request_field(
            format!("Invalid multipart body: {}", err.body_text()),
            FILE_FIELD,
        )
    }
}
