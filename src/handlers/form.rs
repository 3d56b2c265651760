use axum::extract::multipart::{Field, Multipart, MultipartError};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::storage::StagedFile;

/// Name of the multipart field carrying the upload
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Multipart(#[from] MultipartError),

    #[error("file exceeds {limit} bytes")]
    FileTooLarge { limit: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text fields of a multipart form plus the staged `file`, if one was sent
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    file: Option<StagedFile>,
}

impl FormData {
    /// Non-blank value of a text field
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.as_str()).filter(|s| !s.trim().is_empty())
    }

    pub fn take_file(&mut self) -> Option<StagedFile> {
        self.file.take()
    }

    /// Drop the form, deleting any staged file nobody took
    pub async fn discard(mut self) {
        if let Some(file) = self.file.take() {
            file.discard().await;
        }
    }

    #[cfg(test)]
    pub fn from_parts(fields: &[(&str, &str)], file: Option<StagedFile>) -> Self {
        Self {
            fields: fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            file,
        }
    }
}

/// Read every field; the first non-empty `file` part is streamed into `upload_dir`.
/// Any staged file is removed again if reading fails part-way.
pub async fn parse_form(
    mut multipart: Multipart,
    upload_dir: &Path,
    max_file_bytes: usize,
) -> Result<FormData, FormError> {
    let mut form = FormData::default();
    match read_fields(&mut multipart, &mut form, upload_dir, max_file_bytes).await {
        Ok(()) => Ok(form),
        Err(e) => {
            form.discard().await;
            Err(e)
        }
    }
}

async fn read_fields(
    multipart: &mut Multipart,
    form: &mut FormData,
    upload_dir: &Path,
    max_file_bytes: usize,
) -> Result<(), FormError> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == FILE_FIELD {
            if form.file.is_some() {
                continue;
            }
            form.file = stage_file(field, upload_dir, max_file_bytes).await?;
        } else {
            let value = field.text().await?;
            form.fields.insert(name, value);
        }
    }
    Ok(())
}

async fn stage_file(
    mut field: Field<'_>,
    upload_dir: &Path,
    max_file_bytes: usize,
) -> Result<Option<StagedFile>, FormError> {
    let original_name = match field.file_name() {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => return Ok(None),
    };
    let content_type = field.content_type().map(|s| s.to_string());

    tokio::fs::create_dir_all(upload_dir).await?;
    let path = upload_dir.join(Uuid::new_v4().simple().to_string());
    let written = write_chunks(&mut field, &path, max_file_bytes).await;

    let size = match written {
        Ok(size) => size,
        Err(e) => {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e);
        }
    };
    let staged = StagedFile::new(path, original_name, content_type, size);

    // An empty file input still sends a part with a name but no bytes
    if staged.size == 0 {
        staged.discard().await;
        return Ok(None);
    }

    Ok(Some(staged))
}

async fn write_chunks(field: &mut Field<'_>, path: &Path, max_file_bytes: usize) -> Result<u64, FormError> {
    let mut out = tokio::fs::File::create(path).await?;
    let mut size: u64 = 0;
    while let Some(chunk) = field.chunk().await? {
        size += chunk.len() as u64;
        if size > max_file_bytes as u64 {
            return Err(FormError::FileTooLarge { limit: max_file_bytes });
        }
        out.write_all(&chunk).await?;
    }
    out.flush().await?;
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, extract::FromRequest, http::Request};

    const BOUNDARY: &str = "XBOUNDARYX";

    fn multipart_body(text: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (k, v) in text {
            body.extend_from_slice(
                format!("--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n", BOUNDARY, k, v).as_bytes(),
            );
        }
        if let Some((name, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
                     Content-Type: application/pdf\r\n\r\n",
                    BOUNDARY, name
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    async fn multipart(body: Vec<u8>) -> Multipart {
        let req = Request::builder()
            .method("POST")
            .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(req, &()).await.unwrap()
    }

    fn upload_dir() -> std::path::PathBuf {
        std::env::temp_dir().join("pai-berbagi-form-tests")
    }

    #[tokio::test]
    async fn reads_text_fields_and_stages_file() {
        let body = multipart_body(&[("title", "Thaharah"), ("idKategori", "3")], Some(("materi.pdf", &b"%PDF-1.4 body"[..])));
        let mut form = parse_form(multipart(body).await, &upload_dir(), 1024).await.unwrap();

        assert_eq!(form.text("title"), Some("Thaharah"));
        assert_eq!(form.text("idKategori"), Some("3"));
        assert_eq!(form.text("missing"), None);

        let file = form.take_file().expect("file staged");
        assert_eq!(file.original_name, "materi.pdf");
        assert_eq!(file.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(file.size, 13);
        assert_eq!(tokio::fs::read(&file.path).await.unwrap(), b"%PDF-1.4 body");
        file.discard().await;
    }

    #[tokio::test]
    async fn blank_text_counts_as_missing() {
        let body = multipart_body(&[("link", "   ")], None);
        let form = parse_form(multipart(body).await, &upload_dir(), 1024).await.unwrap();
        assert_eq!(form.text("link"), None);
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let big = vec![b'a'; 64];
        let body = multipart_body(&[], Some(("big.pdf", big.as_slice())));
        let err = parse_form(multipart(body).await, &upload_dir(), 16).await.unwrap_err();
        assert!(matches!(err, FormError::FileTooLarge { limit: 16 }));
    }

    #[tokio::test]
    async fn empty_file_part_is_no_file() {
        let body = multipart_body(&[("jenjang", "SD")], Some(("empty.png", &b""[..])));
        let mut form = parse_form(multipart(body).await, &upload_dir(), 1024).await.unwrap();
        assert!(form.take_file().is_none());
    }

    #[tokio::test]
    async fn discard_removes_untaken_file() {
        let body = multipart_body(&[], Some(("x.pdf", &b"data"[..])));
        let form = parse_form(multipart(body).await, &upload_dir(), 1024).await.unwrap();
        let path = form.file.as_ref().unwrap().path.clone();
        assert!(path.exists());
        form.discard().await;
        assert!(!path.exists());
    }
}
