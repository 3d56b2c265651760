//! Cloudinary upload API client
//!
//! Uses the signed REST upload endpoint
//! (`POST {api_base}/{cloud_name}/{resource_type}/upload`) with SHA-256
//! request signatures.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{error, info, instrument};

use super::{StagedFile, UploadError, UploadFolder, UploadedAsset, Uploader};
use crate::config::StorageConfig;

pub struct CloudinaryUploader {
    client: reqwest::Client,
    config: StorageConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl CloudinaryUploader {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, folder: UploadFolder) -> String {
        format!(
            "{}/{}/{}/upload",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            resource_type(folder)
        )
    }

    /// `key=value` pairs of the signed request, sorted by key
    fn upload_params(file: &StagedFile, folder: UploadFolder, timestamp: i64) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("folder", folder.name().to_string()),
            ("timestamp", timestamp.to_string()),
        ];
        if folder == UploadFolder::ModuleFiles {
            params.push(("access_mode", "public".to_string()));
            params.push(("public_id", document_public_id(&file.original_name)));
            params.push(("unique_filename", "false".to_string()));
            params.push(("use_filename", "true".to_string()));
        }
        params.sort_by(|a, b| a.0.cmp(b.0));
        params
    }

    fn sign(params: &[(&'static str, String)], secret: &str) -> String {
        let to_sign = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(secret.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[async_trait]
impl Uploader for CloudinaryUploader {
    #[instrument(skip(self, file), fields(name = %file.original_name, size = file.size))]
    async fn upload(&self, file: &StagedFile, folder: UploadFolder) -> Result<UploadedAsset, UploadError> {
        let timestamp = chrono::Utc::now().timestamp();
        let params = Self::upload_params(file, folder, timestamp);
        let signature = Self::sign(&params, &self.config.api_secret);

        let handle = tokio::fs::File::open(&file.path).await?;
        let mut part = Part::stream_with_length(handle, file.size).file_name(file.original_name.clone());
        if let Some(mime) = &file.content_type {
            part = part.mime_str(mime)?;
        }

        let mut form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (k, v) in params {
            form = form.text(k, v);
        }

        let response = self.client.post(self.endpoint(folder)).multipart(form).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(status = status.as_u16(), %message, "Cloudinary upload failed");
            return Err(UploadError::Rejected { status: status.as_u16(), message });
        }

        let body: UploadResponse = response.json().await?;
        info!(public_id = %body.public_id, "Uploaded to Cloudinary");
        Ok(UploadedAsset {
            secure_url: body.secure_url,
            public_id: body.public_id,
        })
    }
}

fn resource_type(folder: UploadFolder) -> &'static str {
    match folder {
        UploadFolder::LevelImages => "image",
        UploadFolder::ModuleFiles => "raw",
    }
}

/// Base name plus extension of the client's file, `.pdf` when it has none.
/// Raw resources keep the extension in their public id.
fn document_public_id(original_name: &str) -> String {
    let path = Path::new(original_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("file");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("pdf");
    format!("{}.{}", stem, ext)
}
