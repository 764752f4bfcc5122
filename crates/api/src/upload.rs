//! Streaming multipart parser for shop forms.
//!
//! Text fields are collected in memory. File fields are spooled to temporary
//! files chunk by chunk, with a hard per-file cap enforced while the bytes
//! arrive. Only the `image` file is kept; other files are discarded.

use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use axum::extract::multipart::{Field, MultipartError};
use axum::http::StatusCode;
use domain::{FileDescriptor, IMAGE_FIELD, UploadResult};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Failures while reading a multipart body.
#[derive(Debug, Error)]
pub enum UploadError {
    /// A file grew past the per-file cap mid-transfer.
    #[error("maxFileSize exceeded: field '{field}' is larger than {limit} bytes")]
    FileTooLarge { field: String, limit: u64 },

    /// The multipart stream itself was malformed or cut short.
    #[error("Failed to read multipart body: {0}")]
    Multipart(#[from] MultipartError),

    /// A temporary file could not be created or written.
    #[error("Failed to spool upload: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::FileTooLarge { .. } => StatusCode::BAD_REQUEST,
            UploadError::Multipart(err) => err.status(),
            UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Where and how large uploads may be spooled.
#[derive(Debug, Clone)]
pub struct SpoolOptions {
    pub max_file_bytes: u64,
    pub upload_dir: Option<PathBuf>,
}

/// Reads every part of a multipart body into an [`UploadResult`].
pub async fn parse_multipart(
    mut multipart: Multipart,
    options: &SpoolOptions,
) -> Result<UploadResult, UploadError> {
    let mut upload = UploadResult::default();

    while let Some(mut field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            while field.chunk().await?.is_some() {}
            continue;
        };

        if field.file_name().is_none() {
            let value = field.text().await?;
            upload.fields.insert(name, value);
            continue;
        }

        let file = spool_field(&name, &mut field, options).await?;
        if name == IMAGE_FIELD {
            upload.image = Some(file);
        } else {
            tracing::debug!(field = %name, "discarding unexpected file field");
        }
    }

    Ok(upload)
}

async fn spool_field(
    name: &str,
    field: &mut Field<'_>,
    options: &SpoolOptions,
) -> Result<FileDescriptor, UploadError> {
    let file_name = field.file_name().map(str::to_string);
    let mime_type = field.content_type().map(str::to_string);
    let suffix = extension_suffix(file_name.as_deref());

    let mut builder = tempfile::Builder::new();
    builder.prefix("upload-").suffix(&suffix);
    let temp = match options.upload_dir.as_deref() {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    let (file, path) = temp.into_parts();
    let mut file = tokio::fs::File::from_std(file);

    let mut size: u64 = 0;
    while let Some(chunk) = field.chunk().await? {
        size += chunk.len() as u64;
        if size > options.max_file_bytes {
            tracing::warn!(field = %name, limit = options.max_file_bytes, "upload exceeded file cap");
            return Err(UploadError::FileTooLarge {
                field: name.to_string(),
                limit: options.max_file_bytes,
            });
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(FileDescriptor {
        path: Some(path),
        size,
        mime_type,
        file_name,
    })
}

/// Keeps the uploaded file's extension on the temporary file.
fn extension_suffix(file_name: Option<&str>) -> String {
    file_name
        .map(Path::new)
        .and_then(Path::extension)
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}
