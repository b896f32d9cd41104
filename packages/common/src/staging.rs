//! Transient on-disk staging area for the current upload batch.
//!
//! The store holds exactly the files of the most recent batch. Accepting a
//! new batch is one logical `reset` + `stage` transition; callers serialize
//! those transitions (the server keeps the store behind a single mutex).
//! Batch order is recorded in the store itself and is the only source of
//! truth for ordering; the directory listing is never consulted for it.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::warn;

use crate::filename::{FilenameError, validate_filename};
use crate::media::detect_content_type;

/// Errors from staging a batch to disk.
#[derive(Debug, Error)]
pub enum StagingError {
    #[error(transparent)]
    InvalidFilename(#[from] FilenameError),

    #[error("duplicate filename in batch: {0}")]
    DuplicateFilename(String),

    #[error("staging IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to stage {filename}: {source}")]
    Write {
        filename: String,
        source: std::io::Error,
    },
}

/// One uploaded batch: an ordered sequence of (filename, bytes) pairs.
///
/// Filenames are validated and unique within the batch; insertion order is
/// preserved end to end because the final report must cover every image.
#[derive(Debug, Default)]
pub struct UploadBatch {
    entries: Vec<(String, Vec<u8>)>,
}

impl UploadBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file to the batch, validating the filename and rejecting
    /// duplicates.
    pub fn push(&mut self, filename: &str, bytes: Vec<u8>) -> Result<(), StagingError> {
        let name = validate_filename(filename)?;
        if self.entries.iter().any(|(existing, _)| existing == name) {
            return Err(StagingError::DuplicateFilename(name.to_string()));
        }
        self.entries.push((name.to_string(), bytes));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

/// A staged file record, derived 1:1 from an [`UploadBatch`] entry.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub filename: String,
    pub content_type: String,
    pub size: u64,
}

/// Filesystem-backed staging store for the current batch.
pub struct StagingStore {
    dir: PathBuf,
    staged: Vec<StagedFile>,
}

impl StagingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            staged: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Staged files of the current batch, in upload order.
    pub fn staged(&self) -> &[StagedFile] {
        &self.staged
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// On-disk path of a staged file.
    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// Clear the staging directory, creating it if it does not exist.
    ///
    /// Individual deletion failures are logged and skipped so the rest of the
    /// cleanup proceeds; calling `reset` twice in a row leaves the directory
    /// empty both times.
    pub async fn reset(&mut self) -> Result<(), StagingError> {
        self.staged.clear();
        fs::create_dir_all(&self.dir).await?;

        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let result = match entry.file_type().await {
                Ok(ft) if ft.is_dir() => fs::remove_dir_all(&path).await,
                Ok(_) => fs::remove_file(&path).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                warn!(path = %path.display(), error = %e, "Failed to delete staged entry, skipping");
            }
        }

        Ok(())
    }

    /// Write every file of the batch to the staging directory, overwriting
    /// same-named files.
    ///
    /// After a successful call the store's contents equal the batch exactly.
    /// On failure the store reports itself as not staged; any files already
    /// written remain on disk until the next `reset`.
    pub async fn stage(&mut self, batch: &UploadBatch) -> Result<&[StagedFile], StagingError> {
        self.staged.clear();
        fs::create_dir_all(&self.dir).await?;

        let mut staged = Vec::with_capacity(batch.len());
        for (filename, bytes) in &batch.entries {
            self.write_file(filename, bytes)
                .await
                .map_err(|source| StagingError::Write {
                    filename: filename.clone(),
                    source,
                })?;
            staged.push(StagedFile {
                filename: filename.clone(),
                content_type: detect_content_type(filename),
                size: bytes.len() as u64,
            });
        }

        self.staged = staged;
        Ok(&self.staged)
    }

    /// Write via a temp file and rename, so a same-named file is replaced
    /// atomically and a failed write never leaves a truncated staged file.
    async fn write_file(&self, filename: &str, bytes: &[u8]) -> Result<(), std::io::Error> {
        let temp_path = self.dir.join(format!(".tmp-{}", uuid::Uuid::new_v4()));
        if let Err(e) = fs::write(&temp_path, bytes).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }
        if let Err(e) = fs::rename(&temp_path, self.dir.join(filename)).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }
        Ok(())
    }
}
