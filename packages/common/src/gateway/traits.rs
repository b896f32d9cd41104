use async_trait::async_trait;

use super::error::GatewayError;
use crate::request::AnalysisRequest;

/// The one network call per analysis to the external vision/text generation
/// service.
///
/// `analyze` submits the full request (instruction + media) as a single call
/// and resolves once a response or a classified failure is available. There
/// is no streaming or partial-result path; the service's handling of the
/// combined instruction-plus-images set is entirely delegated.
#[async_trait]
pub trait VisionGateway: Send + Sync {
    /// Submit the request and return the generated report text.
    ///
    /// All failures are converted to a [`GatewayError`]; nothing panics
    /// across this boundary.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String, GatewayError>;
}
