//! Loading staged files into typed media parts.
//!
//! Content types are classified from the filename extension, not from the
//! file contents; an unknown extension is carried through as
//! `application/octet-stream` and left to the inference service to reject.

use std::path::Path;

use thiserror::Error;
use tokio::fs;

/// Extensions accepted for upload: common photographic image formats.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "heic", "heif"];

/// Loaded bytes plus detected content type for one staged file.
///
/// Owned by the single analysis invocation that created it; never cached.
#[derive(Debug, Clone)]
pub struct MediaPart {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A staged file could not be read.
#[derive(Debug, Error)]
#[error("failed to read {filename}: {source}")]
pub struct LoadError {
    pub filename: String,
    #[source]
    pub source: std::io::Error,
}

/// Whether the filename carries an accepted photographic extension.
pub fn is_accepted_image(filename: &str) -> bool {
    extension(filename)
        .map(|ext| ACCEPTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Classify a content type from the filename extension.
///
/// HEIC/HEIF are mapped explicitly since the `mime_guess` database predates
/// them; anything unknown falls back to `application/octet-stream`.
pub fn detect_content_type(filename: &str) -> String {
    match extension(filename).map(|e| e.to_ascii_lowercase()) {
        Some(ext) if ext == "heic" => "image/heic".to_string(),
        Some(ext) if ext == "heif" => "image/heif".to_string(),
        _ => mime_guess::from_path(filename)
            .first()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string()),
    }
}

/// Read the full byte content of `path` and classify it as a [`MediaPart`].
pub async fn load(path: &Path) -> Result<MediaPart, LoadError> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = fs::read(path).await.map_err(|source| LoadError {
        filename: filename.clone(),
        source,
    })?;

    Ok(MediaPart {
        content_type: detect_content_type(&filename),
        filename,
        bytes,
    })
}

fn extension(filename: &str) -> Option<&str> {
    Path::new(filename).extension()?.to_str()
}
