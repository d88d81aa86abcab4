use super::domain::{AccessLogEntry, Document};
use crate::workflows::ids::{DocumentId, TransactionId};
use crate::workflows::repository::RepositoryError;

/// Storage port for document metadata.
pub trait DocumentRepository: Send + Sync {
    fn insert_document(&self, document: Document) -> Result<Document, RepositoryError>;
    fn fetch_document(&self, id: &DocumentId) -> Result<Option<Document>, RepositoryError>;
    fn documents_for(&self, transaction: &TransactionId) -> Result<Vec<Document>, RepositoryError>;
}

/// Append-only access trail; exposes no update or delete.
pub trait AccessAuditLog: Send + Sync {
    fn append_access(&self, entry: AccessLogEntry) -> Result<(), RepositoryError>;
    fn access_entries(
        &self,
        transaction: &TransactionId,
    ) -> Result<Vec<AccessLogEntry>, RepositoryError>;
}
