use std::time::Instant;

use axum::Json;
use axum::extract::State;
use tracing::instrument;

use common::pipeline;
use common::request::MEAL_ANALYSIS_INSTRUCTION;

use crate::error::{AppError, ErrorBody};
use crate::models::analysis::AnalysisResponse;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/analysis",
    tag = "Analysis",
    operation_id = "runAnalysis",
    summary = "Analyze the staged batch",
    description = "Runs the full pipeline for the currently staged batch: loads every staged \
        file in upload order, builds one request (instruction followed by every image) and \
        issues exactly one call to the inference service. While a call is in flight, further \
        triggers are rejected rather than firing a second billable request.",
    responses(
        (status = 200, description = "Analysis report", body = AnalysisResponse),
        (status = 400, description = "Nothing staged (NO_IMAGES)", body = ErrorBody),
        (status = 409, description = "Already running (ANALYSIS_IN_FLIGHT)", body = ErrorBody),
        (status = 502, description = "Analysis failed (ANALYSIS_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn run_analysis(
    State(state): State<AppState>,
) -> Result<Json<AnalysisResponse>, AppError> {
    // Single-flight: held until this invocation reaches a terminal state.
    let _gate = state
        .analysis_gate
        .try_lock()
        .map_err(|_| AppError::AnalysisInFlight)?;

    let started = Instant::now();

    // Snapshot the batch under the staging lock, then release it before the
    // slow gateway call so unrelated requests are not frozen behind it.
    let collected = {
        let staging = state.staging.lock().await;
        pipeline::collect_parts(&staging, state.config.analysis.load_policy).await
    }
    .map_err(|e| AppError::from_pipeline(e, started.elapsed().as_millis() as u64))?;

    let result = pipeline::analyze(
        state.gateway.as_ref(),
        MEAL_ANALYSIS_INSTRUCTION,
        collected,
    )
    .await;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match result.outcome {
        Ok(report) => Ok(Json(AnalysisResponse {
            report: report.text,
            elapsed_ms,
            skipped_files: report.skipped,
        })),
        Err(e) => Err(AppError::from_pipeline(e, elapsed_ms)),
    }
}
