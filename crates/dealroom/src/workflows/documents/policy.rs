use std::time::Duration;

use mime::Mime;

use super::domain::DocumentUpload;
use super::error::DocumentServiceError;

/// PDF, Word, Excel and PowerPoint, legacy and OOXML.
pub const ALLOWED_MEDIA_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
];

const DEFAULT_MAX_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Limits applied to every upload before any encryption or storage work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: usize,
    pub storage_timeout: Duration,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
        }
    }
}

impl UploadPolicy {
    /// Validate media type and size; returns the normalised media type.
    pub fn check(&self, upload: &DocumentUpload) -> Result<String, DocumentServiceError> {
        let media_type = allowed_media_type(&upload.media_type)?;

        if upload.bytes.is_empty() {
            return Err(DocumentServiceError::Empty);
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(DocumentServiceError::TooLarge {
                size: upload.bytes.len(),
                max: self.max_bytes,
            });
        }

        Ok(media_type)
    }
}

/// Parameters such as `; charset=binary` are ignored; only the essence is matched.
pub fn allowed_media_type(raw: &str) -> Result<String, DocumentServiceError> {
    let parsed: Mime = raw
        .trim()
        .parse()
        .map_err(|_| DocumentServiceError::UnsupportedMediaType(raw.to_string()))?;
    let essence = parsed.essence_str().to_ascii_lowercase();

    if ALLOWED_MEDIA_TYPES.contains(&essence.as_str()) {
        Ok(essence)
    } else {
        Err(DocumentServiceError::UnsupportedMediaType(essence))
    }
}
