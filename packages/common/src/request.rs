//! Assembling one inference request from the instruction and media parts.

use thiserror::Error;

use crate::media::MediaPart;

/// Fixed instruction sent with every analysis request.
pub const MEAL_ANALYSIS_INSTRUCTION: &str = "\
You are a professional nutritionist. Analyze the attached photographs of meals \
eaten during the day and produce a comprehensive nutritional report. Cover every \
image provided, without omission.

For each meal photograph:
1. Food item identification: identify and list the individual food items present.
2. Nutritional breakdown per item: calories; fat (total, saturated, unsaturated); \
energy; carbohydrates (%); protein (%); other key components such as fiber, sugar \
and sodium (%).
3. Total calories and macronutrient analysis: calculate and report the total \
calories and the carbohydrate/protein/fat breakdown for the entire meal.
4. Health rating: assign a rating from 1-10 considering nutrient balance, calorie \
density and the presence of essential vitamins and minerals, with a justification.
5. Recommendations: suggest specific replacements or additions to improve the \
meal's nutritional quality, and estimate the revised health rating if applied.

Present the analysis as a clear, concise report.";

/// One element of an [`AnalysisRequest`].
#[derive(Debug, Clone)]
pub enum RequestPart {
    Text(String),
    Media(MediaPart),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("no images to analyze")]
    NoMedia,
}

/// An ordered inference request: exactly one instruction element followed by
/// N media elements, N >= 1, in batch order.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    parts: Vec<RequestPart>,
}

impl AnalysisRequest {
    /// Build a request from the instruction and the batch's media parts.
    ///
    /// Pure and deterministic. An empty media list is a caller error and is
    /// rejected here, before any network call.
    pub fn build(instruction: &str, media: Vec<MediaPart>) -> Result<Self, RequestError> {
        if media.is_empty() {
            return Err(RequestError::NoMedia);
        }

        let mut parts = Vec::with_capacity(media.len() + 1);
        parts.push(RequestPart::Text(instruction.to_string()));
        parts.extend(media.into_iter().map(RequestPart::Media));

        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[RequestPart] {
        &self.parts
    }

    /// Number of media elements (excludes the instruction).
    pub fn media_count(&self) -> usize {
        self.parts.len() - 1
    }
}
