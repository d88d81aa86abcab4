use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::custody::CipherError;
use super::storage::BlobStoreError;
use crate::workflows::error::LifecycleError;
use crate::workflows::repository::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum DocumentServiceError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error("media type {0} is not accepted; upload PDF, Word, Excel or PowerPoint files")]
    UnsupportedMediaType(String),
    #[error("file is {size} bytes, the limit is {max} bytes")]
    TooLarge { size: usize, max: usize },
    #[error("file is empty")]
    Empty,
    #[error(transparent)]
    Cipher(#[from] CipherError),
    #[error(transparent)]
    Storage(#[from] BlobStoreError),
    #[error("document storage did not finish within {0:?}")]
    StorageTimeout(Duration),
    #[error("document worker failed: {0}")]
    Task(String),
}

impl From<RepositoryError> for DocumentServiceError {
    fn from(value: RepositoryError) -> Self {
        Self::Lifecycle(LifecycleError::Repository(value))
    }
}

impl DocumentServiceError {
    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StorageTimeout(_) | Self::Storage(BlobStoreError::Unavailable(_))
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Lifecycle(err) => err.code(),
            Self::UnsupportedMediaType(_) => "unsupported_media_type",
            Self::TooLarge { .. } => "too_large",
            Self::Empty => "empty",
            Self::Cipher(_) => "cipher",
            Self::Storage(_) => "storage",
            Self::StorageTimeout(_) => "timeout",
            Self::Task(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Lifecycle(err) => err.status_code(),
            Self::UnsupportedMediaType(_) | Self::TooLarge { .. } | Self::Empty => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::StorageTimeout(_) | Self::Storage(BlobStoreError::Unavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Cipher(_) | Self::Storage(_) | Self::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for DocumentServiceError {
    fn into_response(self) -> Response {
        if let Self::Lifecycle(err) = self {
            return err.into_response();
        }
        let payload = json!({
            "error": self.to_string(),
            "code": self.code(),
            "retryable": self.is_retryable(),
        });
        (self.status_code(), Json(payload)).into_response()
    }
}
