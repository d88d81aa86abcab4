//! Encrypted transaction documents with role-gated access and an append-only access trail.

pub mod custody;
pub mod domain;
pub mod error;
pub mod policy;
pub mod repository;
pub mod router;
pub mod service;
pub mod storage;

#[cfg(test)]
mod tests;

pub use custody::{CipherError, DocumentCipher, EncryptionKey, KeyError, SealedBlob};
pub use domain::{
    AccessAction, AccessLogEntry, Document, DocumentMeta, DocumentStatus, DocumentUpload,
    DownloadedDocument, EncryptionMetadata,
};
pub use error::DocumentServiceError;
pub use policy::{allowed_media_type, UploadPolicy, ALLOWED_MEDIA_TYPES};
pub use repository::{AccessAuditLog, DocumentRepository};
pub use router::{document_router, document_router_with_guesser, MediaTypeGuesser};
pub use service::DocumentService;
pub use storage::{BlobStore, BlobStoreError, StorageRef};
