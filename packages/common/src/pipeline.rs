//! The upload-ingest-analyze pipeline for one analysis invocation.
//!
//! Stages run strictly in sequence: load every staged file, build the
//! request, issue exactly one gateway call. The caller holds the staging
//! lock across [`collect_parts`] so a concurrent re-upload cannot be read
//! half-cleared, and releases it before the (potentially slow) gateway call.

use std::time::{Duration, Instant};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::gateway::{GatewayError, VisionGateway};
use crate::media::{self, LoadError, MediaPart};
use crate::request::{AnalysisRequest, RequestError};
use crate::staging::StagingStore;

/// What to do when one staged file cannot be read.
///
/// Strict is the default: the instruction promises to cover every image, so
/// silently dropping one would break that promise. Lenient is an explicit
/// opt-in and surfaces the skipped filenames in the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPolicy {
    #[default]
    Strict,
    Lenient,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no images to analyze")]
    EmptyBatch,

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("none of the {0} staged files could be read")]
    AllUnreadable(usize),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl From<RequestError> for PipelineError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::NoMedia => Self::EmptyBatch,
        }
    }
}

/// Media parts loaded from the staged batch, in batch order, plus the files
/// skipped under the lenient policy.
#[derive(Debug)]
pub struct CollectedParts {
    pub parts: Vec<MediaPart>,
    pub skipped: Vec<String>,
}

/// Successful analysis: the report text plus any lenient-mode skips.
#[derive(Debug)]
pub struct AnalysisReport {
    pub text: String,
    pub skipped: Vec<String>,
}

/// Terminal state of one analysis invocation, with the wall-clock duration
/// of the gateway call (up to the failure point on failure).
#[derive(Debug)]
pub struct AnalysisResult {
    pub outcome: Result<AnalysisReport, PipelineError>,
    pub elapsed: Duration,
}

/// Load every staged file into memory, in batch order.
///
/// The caller must hold the staging lock for the duration of this call.
/// An empty batch is rejected here, before any network activity.
pub async fn collect_parts(
    store: &StagingStore,
    policy: LoadPolicy,
) -> Result<CollectedParts, PipelineError> {
    let staged = store.staged();
    if staged.is_empty() {
        return Err(PipelineError::EmptyBatch);
    }

    let mut parts = Vec::with_capacity(staged.len());
    let mut skipped = Vec::new();

    for file in staged {
        match media::load(&store.path_of(&file.filename)).await {
            Ok(part) => parts.push(part),
            Err(e) if policy == LoadPolicy::Lenient => {
                warn!(filename = %e.filename, error = %e.source, "Skipping unreadable staged file");
                skipped.push(e.filename);
            }
            Err(e) => return Err(e.into()),
        }
    }

    if parts.is_empty() {
        return Err(PipelineError::AllUnreadable(skipped.len()));
    }

    Ok(CollectedParts { parts, skipped })
}

/// Build the request and issue the single gateway call.
///
/// Never panics across this boundary; every failure is a typed outcome the
/// caller can render, always paired with the elapsed duration.
pub async fn analyze(
    gateway: &dyn VisionGateway,
    instruction: &str,
    collected: CollectedParts,
) -> AnalysisResult {
    let CollectedParts { parts, skipped } = collected;
    let media_count = parts.len();

    let request = match AnalysisRequest::build(instruction, parts) {
        Ok(request) => request,
        Err(e) => {
            return AnalysisResult {
                outcome: Err(e.into()),
                elapsed: Duration::ZERO,
            };
        }
    };

    let started = Instant::now();
    let outcome = match gateway.analyze(&request).await {
        Ok(text) => {
            info!(
                media_count,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Analysis completed"
            );
            Ok(AnalysisReport { text, skipped })
        }
        Err(e) => {
            warn!(
                media_count,
                classification = e.classification(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %e,
                "Analysis failed"
            );
            Err(e.into())
        }
    };

    AnalysisResult {
        outcome,
        elapsed: started.elapsed(),
    }
}
