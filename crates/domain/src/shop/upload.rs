//! Validation of parsed multipart uploads.
//!
//! Transport code parses the request body into an [`UploadResult`]; this
//! module decides whether that result is acceptable and turns the optional
//! `image` file into an [`Image`] attachment.

use std::collections::HashMap;

use shop_store::Image;
use tempfile::TempPath;

use crate::error::{Result, ShopError};

/// One mebibyte.
pub const MIB: u64 = 1024 * 1024;

/// Name of the only file field the shop form accepts.
pub const IMAGE_FIELD: &str = "image";

/// Size caps applied to uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    /// Hard cap on any single file while the body is being parsed.
    pub max_file_bytes: u64,
    /// Cap on the `image` file once parsing has finished.
    pub max_image_bytes: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: 2 * MIB,
            max_image_bytes: MIB,
        }
    }
}

/// Ensures the declared request content type is multipart form data.
///
/// JSON and url-encoded bodies are refused: image-bearing writes are
/// multipart only.
pub fn require_multipart(content_type: Option<&str>) -> Result<()> {
    let is_form = content_type
        .and_then(|ct| ct.parse::<mime::Mime>().ok())
        .is_some_and(|m| m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA);

    if is_form {
        Ok(())
    } else {
        Err(ShopError::InvalidForm)
    }
}

/// A file received in a multipart body, spooled to a temporary file.
///
/// The temporary file is removed when the descriptor is dropped, whichever
/// way the request ends.
#[derive(Debug)]
pub struct FileDescriptor {
    pub path: Option<TempPath>,
    pub size: u64,
    pub mime_type: Option<String>,
    pub file_name: Option<String>,
}

/// Result of parsing a multipart shop form.
#[derive(Debug, Default)]
pub struct UploadResult {
    /// Non-file fields, last value wins.
    pub fields: HashMap<String, String>,
    /// The `image` file, if one was sent.
    pub image: Option<FileDescriptor>,
}

impl UploadResult {
    /// Builds a result with text fields only.
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: FileDescriptor) -> Self {
        self.image = Some(image);
        self
    }

    /// Returns a text field by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Validates the image file, if any, and reads it into memory.
    ///
    /// Checks run in order: reported size, then metadata completeness.
    /// The temporary file is released before this returns.
    pub async fn into_parts(
        self,
        limits: &UploadLimits,
    ) -> Result<(HashMap<String, String>, Option<Image>)> {
        let image = match self.image {
            Some(file) => Some(read_image(file, limits).await?),
            None => None,
        };
        Ok((self.fields, image))
    }
}

async fn read_image(file: FileDescriptor, limits: &UploadLimits) -> Result<Image> {
    if file.size > limits.max_image_bytes {
        return Err(ShopError::ImageTooLarge {
            size: file.size,
            max: limits.max_image_bytes,
        });
    }

    let (Some(path), Some(content_type)) = (file.path, file.mime_type) else {
        return Err(ShopError::IncompleteImage);
    };

    let data = tokio::fs::read(&path).await?;
    tracing::debug!(bytes = data.len(), %content_type, "read uploaded image");

    Ok(Image { data, content_type })
}
