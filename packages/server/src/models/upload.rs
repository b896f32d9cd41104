use serde::Serialize;

use common::staging::StagedFile;

/// Response DTO for one staged file.
#[derive(Serialize, utoipa::ToSchema)]
pub struct StagedFileResponse {
    /// Original upload filename.
    #[schema(example = "breakfast.jpg")]
    pub filename: String,
    /// Content type detected from the filename extension.
    #[schema(example = "image/jpeg")]
    pub content_type: String,
    /// File size in bytes.
    #[schema(example = 142857)]
    pub size: u64,
}

/// Response DTO for the current staged batch, in upload order.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    pub files: Vec<StagedFileResponse>,
    pub total: u64,
}

impl From<&StagedFile> for StagedFileResponse {
    fn from(file: &StagedFile) -> Self {
        Self {
            filename: file.filename.clone(),
            content_type: file.content_type.clone(),
            size: file.size,
        }
    }
}

impl UploadResponse {
    pub fn from_staged(staged: &[StagedFile]) -> Self {
        Self {
            total: staged.len() as u64,
            files: staged.iter().map(StagedFileResponse::from).collect(),
        }
    }
}
