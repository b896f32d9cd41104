//! Validation for user-supplied upload filenames.
//!
//! Staged files are written under the staging directory using the client's
//! filename, so anything that could escape the directory or smuggle control
//! characters into headers is rejected up front.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilenameError {
    #[error("Filename cannot be empty")]
    Empty,
    #[error("Invalid filename: path separators are not allowed")]
    PathSeparator,
    #[error("Invalid filename: '..' is not allowed")]
    PathTraversal,
    #[error("Invalid filename: null bytes are not allowed")]
    NullByte,
    #[error("Invalid filename: hidden files (starting with '.') are not allowed")]
    Hidden,
    #[error("Invalid filename: control characters are not allowed")]
    ControlCharacter,
}

/// Validates a flat filename (no directory components allowed).
///
/// Returns the trimmed filename on success.
pub fn validate_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    // CR/LF in a filename could end up reflected into response headers.
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::PathSeparator);
    }

    if trimmed == ".." {
        return Err(FilenameError::PathTraversal);
    }

    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    Ok(trimmed)
}
