use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::storage::StorageRef;
use crate::workflows::ids::{AccessLogId, DocumentId, PartyId, TransactionId};
use crate::workflows::transactions::TransactionRole;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    #[default]
    Draft,
    Final,
}

/// Parameters needed to decrypt a stored blob. The key itself is process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionMetadata {
    pub iv: String,
    pub encrypted_size: u64,
}

/// Stored document record. Only [`DocumentMeta`] is ever handed to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub transaction_id: TransactionId,
    pub title: String,
    pub filename: String,
    pub size_bytes: u64,
    pub media_type: String,
    pub storage_ref: StorageRef,
    pub status: DocumentStatus,
    pub uploaded_by: PartyId,
    pub uploader_role: TransactionRole,
    pub uploaded_at: DateTime<Utc>,
    pub encryption: EncryptionMetadata,
}

impl Document {
    pub fn meta(&self) -> DocumentMeta {
        DocumentMeta {
            id: self.id.clone(),
            title: self.title.clone(),
            filename: self.filename.clone(),
            size_bytes: self.size_bytes,
            media_type: self.media_type.clone(),
            status: self.status,
            uploaded_by: self.uploaded_by.clone(),
            uploader_role: self.uploader_role,
            uploaded_at: self.uploaded_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub id: DocumentId,
    pub title: String,
    pub filename: String,
    pub size_bytes: u64,
    pub media_type: String,
    pub status: DocumentStatus,
    pub uploaded_by: PartyId,
    pub uploader_role: TransactionRole,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessAction {
    List,
    Upload,
    Download,
    UnauthorizedAttempt,
}

impl AccessAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Upload => "upload",
            Self::Download => "download",
            Self::UnauthorizedAttempt => "unauthorized_attempt",
        }
    }
}

/// Immutable audit trail entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    pub id: AccessLogId,
    pub transaction_id: TransactionId,
    pub document_id: Option<DocumentId>,
    pub actor_id: PartyId,
    pub action: AccessAction,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Raw upload as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub title: Option<String>,
    pub filename: String,
    pub media_type: String,
    pub status: DocumentStatus,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedDocument {
    pub meta: DocumentMeta,
    pub bytes: Vec<u8>,
}
