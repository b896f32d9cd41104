use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use common::pipeline::PipelineError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`,
    /// `UNSUPPORTED_MEDIA_TYPE`, `NO_IMAGES`, `UPLOAD_FAILED`,
    /// `ANALYSIS_IN_FLIGHT`, `ANALYSIS_FAILED`, `INTERNAL_ERROR`.
    #[schema(example = "NO_IMAGES")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "No images to analyze")]
    pub message: String,
    /// Wall-clock time already spent on the failed analysis, when relevant,
    /// so a slow partial failure is not silently swallowed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// Upload rejected before staging: not an accepted photographic format.
    UnsupportedMediaType(String),
    /// Nothing staged; the gateway is never called.
    NoImages,
    /// Staging the batch to disk failed; the batch is considered not staged.
    UploadFailed(String),
    /// An analysis call is already in flight for this staging area.
    AnalysisInFlight,
    /// The analysis ran and failed. The message is already sanitized; the
    /// failure classification lives in the diagnostic logs only.
    AnalysisFailed { message: String, elapsed_ms: u64 },
    Internal(String),
}

impl AppError {
    /// Map a pipeline failure to a user-renderable error, attaching the
    /// elapsed time already spent.
    pub fn from_pipeline(err: PipelineError, elapsed_ms: u64) -> Self {
        match err {
            PipelineError::EmptyBatch => AppError::NoImages,
            PipelineError::Load(e) => AppError::AnalysisFailed {
                message: format!("Analysis aborted: could not read {}", e.filename),
                elapsed_ms,
            },
            PipelineError::AllUnreadable(count) => AppError::AnalysisFailed {
                message: format!("Analysis aborted: none of the {count} staged files could be read"),
                elapsed_ms,
            },
            PipelineError::Gateway(e) => {
                tracing::error!(
                    classification = e.classification(),
                    error = %e,
                    "Gateway failure"
                );
                AppError::AnalysisFailed {
                    message: "Analysis failed, please retry".into(),
                    elapsed_ms,
                }
            }
        }
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                    elapsed_ms: None,
                },
            ),
            AppError::UnsupportedMediaType(filename) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                ErrorBody {
                    code: "UNSUPPORTED_MEDIA_TYPE",
                    message: format!(
                        "'{filename}' is not an accepted image format (jpg, jpeg, png, webp, heic, heif)"
                    ),
                    elapsed_ms: None,
                },
            ),
            AppError::NoImages => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "NO_IMAGES",
                    message: "No images to analyze".into(),
                    elapsed_ms: None,
                },
            ),
            AppError::UploadFailed(detail) => {
                tracing::error!("Staging failure: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "UPLOAD_FAILED",
                        message: "Upload failed".into(),
                        elapsed_ms: None,
                    },
                )
            }
            AppError::AnalysisInFlight => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "ANALYSIS_IN_FLIGHT",
                    message: "An analysis is already running, please wait".into(),
                    elapsed_ms: None,
                },
            ),
            AppError::AnalysisFailed {
                message,
                elapsed_ms,
            } => (
                StatusCode::BAD_GATEWAY,
                ErrorBody {
                    code: "ANALYSIS_FAILED",
                    message,
                    elapsed_ms: Some(elapsed_ms),
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                        elapsed_ms: None,
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}
