//! Object storage for uploaded assets
//!
//! Files arrive as multipart uploads, are staged on local disk, and are then
//! forwarded to the object store which hands back a public URL. The staged copy
//! is always removed once the upload attempt is over.

mod cloudinary;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

pub use cloudinary::CloudinaryUploader;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Destination of an upload; decides folder and naming rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFolder {
    /// Level cover images
    LevelImages,
    /// Module documents; keep their original file name
    ModuleFiles,
}

impl UploadFolder {
    pub fn name(&self) -> &'static str {
        match self {
            UploadFolder::LevelImages => "jenjang_images",
            UploadFolder::ModuleFiles => "modul_files",
        }
    }
}

/// A file received from a client and written to the upload directory
#[derive(Debug)]
pub struct StagedFile {
    pub path: PathBuf,
    /// Name the client sent, e.g. `materi.pdf`
    pub original_name: String,
    pub content_type: Option<String>,
    pub size: u64,
    removed: bool,
}

impl StagedFile {
    pub fn new(path: PathBuf, original_name: String, content_type: Option<String>, size: u64) -> Self {
        Self {
            path,
            original_name,
            content_type,
            size,
            removed: false,
        }
    }

    /// Remove the staged copy without uploading it
    pub async fn discard(mut self) {
        remove_staged(&self.path).await;
        self.removed = true;
    }
}

/// Covers requests dropped before `discard` ran, e.g. when the client disconnects mid-upload
impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Failed to delete staged upload");
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedAsset {
    pub secure_url: String,
    pub public_id: String,
}

#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, file: &StagedFile, folder: UploadFolder) -> Result<UploadedAsset, UploadError>;
}

/// Upload `file` and delete the staged copy whatever the outcome. Not retried.
pub async fn upload_and_discard(
    uploader: &dyn Uploader,
    file: StagedFile,
    folder: UploadFolder,
) -> Result<UploadedAsset, UploadError> {
    let result = uploader.upload(&file, folder).await;
    file.discard().await;
    result
}

async fn remove_staged(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to delete staged upload");
        }
    }
}
