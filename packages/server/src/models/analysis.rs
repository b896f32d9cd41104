use serde::Serialize;

/// Response DTO for a completed analysis.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AnalysisResponse {
    /// Report text generated by the inference service, rendered verbatim.
    pub report: String,
    /// Wall-clock duration of the whole analysis action in milliseconds.
    #[schema(example = 8421)]
    pub elapsed_ms: u64,
    /// Files skipped under the lenient load policy. Empty in strict mode;
    /// never silently omitted.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_files: Vec<String>,
}
