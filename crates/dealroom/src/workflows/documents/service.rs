use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::custody::DocumentCipher;
use super::domain::{
    AccessAction, AccessLogEntry, Document, DocumentMeta, DocumentUpload, DownloadedDocument,
    EncryptionMetadata,
};
use super::error::DocumentServiceError;
use super::policy::UploadPolicy;
use super::repository::{AccessAuditLog, DocumentRepository};
use super::storage::BlobStore;
use crate::workflows::clock::{Clock, SystemClock};
use crate::workflows::error::{EntityKind, LifecycleError};
use crate::workflows::identity::CallerContext;
use crate::workflows::ids::{AccessLogId, DocumentId, TransactionId};
use crate::workflows::transactions::{
    resolve_role, Activity, ActivityKind, TransactionRecord, TransactionRepository,
    TransactionRole,
};

/// Role-gated, encrypted document custody scoped to one transaction, with a full access trail.
pub struct DocumentService<S, B> {
    store: Arc<S>,
    blobs: Arc<B>,
    cipher: Arc<DocumentCipher>,
    policy: UploadPolicy,
    clock: Arc<dyn Clock>,
}

impl<S, B> DocumentService<S, B>
where
    S: TransactionRepository + DocumentRepository + AccessAuditLog + 'static,
    B: BlobStore + 'static,
{
    pub fn new(store: Arc<S>, blobs: Arc<B>, cipher: DocumentCipher, policy: UploadPolicy) -> Self {
        Self {
            store,
            blobs,
            cipher: Arc::new(cipher),
            policy,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> UploadPolicy {
        self.policy
    }

    /// Resolve the caller's role on the transaction.
    ///
    /// Unknown transactions fail without an audit entry. Strangers are recorded in the access
    /// trail and the activity log before the refusal is returned.
    pub fn authorize(
        &self,
        caller: &CallerContext,
        transaction_id: &TransactionId,
        attempted: AccessAction,
    ) -> Result<(TransactionRecord, TransactionRole), DocumentServiceError> {
        let record = self
            .store
            .fetch_transaction(transaction_id)?
            .ok_or_else(|| LifecycleError::not_found(EntityKind::Transaction, transaction_id))?;
        let team = self.store.team_members(transaction_id)?;

        match resolve_role(&record.transaction, &team, &caller.actor_id) {
            Some(role) => Ok((record, role)),
            None => {
                self.record_refusal(
                    caller,
                    transaction_id,
                    format!("{} refused: not a participant", attempted.label()),
                )?;
                Err(LifecycleError::unauthorized("not a participant in this transaction").into())
            }
        }
    }

    /// Document metadata for the transaction. Ciphertext details never leave the service.
    pub fn list(
        &self,
        caller: &CallerContext,
        transaction_id: &TransactionId,
    ) -> Result<Vec<DocumentMeta>, DocumentServiceError> {
        self.authorize(caller, transaction_id, AccessAction::List)?;

        let mut documents: Vec<DocumentMeta> = self
            .store
            .documents_for(transaction_id)?
            .iter()
            .map(Document::meta)
            .collect();
        documents.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));

        self.log_access(caller, transaction_id, None, AccessAction::List, None)?;
        Ok(documents)
    }

    pub async fn upload(
        &self,
        caller: &CallerContext,
        transaction_id: &TransactionId,
        upload: DocumentUpload,
    ) -> Result<DocumentMeta, DocumentServiceError> {
        let (_, role) = self.authorize(caller, transaction_id, AccessAction::Upload)?;
        if !role.may_upload() {
            self.record_refusal(
                caller,
                transaction_id,
                format!("upload refused for {} role", role.label()),
            )?;
            return Err(LifecycleError::unauthorized(
                "only the seller or advisor may upload documents",
            )
            .into());
        }

        let filename = upload.filename.trim().to_string();
        if filename.is_empty() {
            return Err(LifecycleError::validation(["filename"]).into());
        }
        let media_type = self.policy.check(&upload)?;
        let title = upload
            .title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .unwrap_or(&filename)
            .to_string();

        let document_id = DocumentId::next();
        let size_bytes = upload.bytes.len() as u64;
        let key = format!("transactions/{transaction_id}/{document_id}.enc");
        let cipher = Arc::clone(&self.cipher);
        let blobs = Arc::clone(&self.blobs);
        let plaintext = upload.bytes;
        // Set once the request stops waiting; a write landing after that is removed again.
        let abandoned = Arc::new(AtomicBool::new(false));
        let task_abandoned = Arc::clone(&abandoned);
        let task_key = key.clone();

        let stored = self
            .bounded(move || {
                let sealed = cipher.seal(&plaintext)?;
                let encryption = EncryptionMetadata {
                    iv: sealed.iv_hex(),
                    encrypted_size: sealed.ciphertext.len() as u64,
                };
                let storage_ref = blobs.put(&task_key, sealed.ciphertext)?;
                if task_abandoned.load(Ordering::SeqCst) {
                    discard_blob(blobs.as_ref(), &task_key);
                }
                Ok((storage_ref, encryption))
            })
            .await;
        let (storage_ref, encryption) = match stored {
            Err(err @ DocumentServiceError::StorageTimeout(_)) => {
                abandoned.store(true, Ordering::SeqCst);
                let blobs = Arc::clone(&self.blobs);
                tokio::task::spawn_blocking(move || discard_blob(blobs.as_ref(), &key));
                return Err(err);
            }
            other => other?,
        };

        let now = self.clock.now();
        let document = self.store.insert_document(Document {
            id: document_id,
            transaction_id: transaction_id.clone(),
            title,
            filename,
            size_bytes,
            media_type,
            storage_ref,
            status: upload.status,
            uploaded_by: caller.actor_id.clone(),
            uploader_role: role,
            uploaded_at: now,
            encryption,
        })?;

        self.log_access(
            caller,
            transaction_id,
            Some(&document.id),
            AccessAction::Upload,
            Some(document.filename.clone()),
        )?;
        self.store.append_activity(Activity::record(
            transaction_id,
            ActivityKind::DocumentUploaded,
            &caller.actor_id,
            format!("Document \"{}\" uploaded", document.title),
            now,
        ))?;
        info!(transaction = %transaction_id, document = %document.id, size = size_bytes, "document uploaded");

        Ok(document.meta())
    }

    pub async fn download(
        &self,
        caller: &CallerContext,
        transaction_id: &TransactionId,
        document_id: &DocumentId,
    ) -> Result<DownloadedDocument, DocumentServiceError> {
        self.authorize(caller, transaction_id, AccessAction::Download)?;

        let document = self
            .store
            .fetch_document(document_id)?
            .filter(|document| &document.transaction_id == transaction_id)
            .ok_or_else(|| LifecycleError::not_found(EntityKind::Document, document_id))?;

        let cipher = Arc::clone(&self.cipher);
        let blobs = Arc::clone(&self.blobs);
        let storage_ref = document.storage_ref.clone();
        let iv = document.encryption.iv.clone();
        let bytes = self
            .bounded(move || {
                let ciphertext = blobs.get(&storage_ref)?;
                Ok(cipher.open(&ciphertext, &iv)?)
            })
            .await?;

        self.log_access(
            caller,
            transaction_id,
            Some(&document.id),
            AccessAction::Download,
            None,
        )?;

        Ok(DownloadedDocument {
            meta: document.meta(),
            bytes,
        })
    }

    /// The access trail, oldest first.
    pub fn access_log(
        &self,
        caller: &CallerContext,
        transaction_id: &TransactionId,
    ) -> Result<Vec<AccessLogEntry>, DocumentServiceError> {
        self.authorize(caller, transaction_id, AccessAction::List)?;
        let mut entries = self.store.access_entries(transaction_id)?;
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(entries)
    }

    /// Run cipher and blob work on the blocking pool under the storage timeout.
    async fn bounded<T, F>(&self, work: F) -> Result<T, DocumentServiceError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, DocumentServiceError> + Send + 'static,
    {
        let limit: Duration = self.policy.storage_timeout;
        match tokio::time::timeout(limit, tokio::task::spawn_blocking(work)).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(DocumentServiceError::Task(join.to_string())),
            Err(_) => {
                warn!(timeout = ?limit, "document storage timed out");
                Err(DocumentServiceError::StorageTimeout(limit))
            }
        }
    }

    fn record_refusal(
        &self,
        caller: &CallerContext,
        transaction_id: &TransactionId,
        detail: String,
    ) -> Result<(), DocumentServiceError> {
        warn!(transaction = %transaction_id, actor = %caller.actor_id, %detail, "document access refused");
        let now = self.clock.now();
        self.log_access(
            caller,
            transaction_id,
            None,
            AccessAction::UnauthorizedAttempt,
            Some(detail.clone()),
        )?;
        self.store.append_activity(Activity::record(
            transaction_id,
            ActivityKind::UnauthorizedAccess,
            &caller.actor_id,
            detail,
            now,
        ))?;
        Ok(())
    }

    fn log_access(
        &self,
        caller: &CallerContext,
        transaction_id: &TransactionId,
        document_id: Option<&DocumentId>,
        action: AccessAction,
        detail: Option<String>,
    ) -> Result<(), DocumentServiceError> {
        self.store.append_access(AccessLogEntry {
            id: AccessLogId::next(),
            transaction_id: transaction_id.clone(),
            document_id: document_id.cloned(),
            actor_id: caller.actor_id.clone(),
            action,
            detail,
            created_at: self.clock.now(),
        })?;
        Ok(())
    }
}

fn discard_blob<B: BlobStore + ?Sized>(blobs: &B, key: &str) {
    match blobs.delete(key) {
        Ok(()) => info!(%key, "abandoned upload removed from blob storage"),
        Err(err) => warn!(%key, error = %err, "abandoned upload left in blob storage"),
    }
}
