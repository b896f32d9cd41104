use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::{info, instrument};

use common::media::is_accepted_image;
use common::staging::{StagingError, UploadBatch};

use crate::error::{AppError, ErrorBody};
use crate::models::upload::UploadResponse;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/uploads",
    tag = "Uploads",
    operation_id = "uploadBatch",
    summary = "Upload a batch of meal photographs",
    description = "Replaces the staged batch with the uploaded files. Every `files` multipart \
        field must carry a filename with an accepted photographic extension (jpg, jpeg, png, \
        webp, heic, heif); any other type is rejected before staging. The previous batch is \
        cleared first, so after this call the staging area holds exactly this batch.",
    request_body(content_type = "multipart/form-data", description = "One or more image files"),
    responses(
        (status = 201, description = "Batch staged", body = UploadResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 415, description = "Rejected file type (UNSUPPORTED_MEDIA_TYPE)", body = ErrorBody),
        (status = 500, description = "Staging failure (UPLOAD_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_batch(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut batch = UploadBatch::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("files") {
            continue; // Ignore unknown fields.
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;

        if !is_accepted_image(&filename) {
            return Err(AppError::UnsupportedMediaType(filename));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read '{filename}': {e}")))?;

        batch.push(&filename, bytes.to_vec()).map_err(|e| match e {
            StagingError::InvalidFilename(_) | StagingError::DuplicateFilename(_) => {
                AppError::Validation(e.to_string())
            }
            other => AppError::Internal(other.to_string()),
        })?;
    }

    if batch.is_empty() {
        return Err(AppError::Validation(
            "No files provided; expected at least one 'files' field".into(),
        ));
    }

    // One logical Empty -> Staged transition under the staging lock.
    let mut staging = state.staging.lock().await;
    staging
        .reset()
        .await
        .map_err(|e| AppError::UploadFailed(e.to_string()))?;
    let staged = staging
        .stage(&batch)
        .await
        .map_err(|e| AppError::UploadFailed(e.to_string()))?;

    info!(count = staged.len(), "Batch staged");

    Ok((StatusCode::CREATED, Json(UploadResponse::from_staged(staged))))
}

#[utoipa::path(
    get,
    path = "/uploads",
    tag = "Uploads",
    operation_id = "listUploads",
    summary = "List the currently staged batch",
    description = "Returns the staged files of the most recent upload, in upload order.",
    responses(
        (status = 200, description = "Staged batch", body = UploadResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_uploads(State(state): State<AppState>) -> Json<UploadResponse> {
    let staging = state.staging.lock().await;
    Json(UploadResponse::from_staged(staging.staged()))
}
