use super::common::*;

use std::time::Duration;

use crate::workflows::documents::{
    AccessAction, AccessAuditLog, DocumentRepository, DocumentServiceError, DocumentStatus,
    UploadPolicy,
};
use crate::workflows::error::LifecycleError;
use crate::workflows::ids::DocumentId;
use crate::workflows::transactions::{ActivityKind, TransactionRepository, TransactionRole};

const REPORT: &[u8] = b"%PDF-1.7 quarterly figures";

#[tokio::test]
async fn seller_upload_is_encrypted_at_rest_and_round_trips() {
    let h = harness();
    let id = &h.transaction.id;

    let meta = h
        .service
        .upload(&seller(), id, upload("q3-report.pdf", PDF, REPORT))
        .await
        .expect("upload succeeds");

    assert_eq!(meta.title, "q3-report.pdf");
    assert_eq!(meta.size_bytes, REPORT.len() as u64);
    assert_eq!(meta.uploader_role, TransactionRole::Seller);
    assert_eq!(meta.status, DocumentStatus::Draft);

    let stored = h
        .store
        .fetch_document(&meta.id)
        .expect("read")
        .expect("document stored");
    let at_rest = h.blobs.raw(&stored.storage_ref).expect("blob stored");
    assert_ne!(at_rest.as_slice(), REPORT);
    assert_eq!(stored.encryption.encrypted_size, at_rest.len() as u64);
    assert_eq!(stored.encryption.iv.len(), 24);
    assert!(stored
        .storage_ref
        .0
        .starts_with(&format!("transactions/{id}/")));

    let downloaded = h
        .service
        .download(&buyer(), id, &meta.id)
        .await
        .expect("buyer downloads");
    assert_eq!(downloaded.bytes, REPORT);
    assert_eq!(downloaded.meta, meta);

    let actions: Vec<AccessAction> = h
        .store
        .access_entries(id)
        .expect("trail")
        .into_iter()
        .map(|entry| entry.action)
        .collect();
    assert_eq!(actions, vec![AccessAction::Upload, AccessAction::Download]);

    let activity = h.store.activities(id).expect("activity");
    assert!(activity
        .iter()
        .any(|entry| entry.kind == ActivityKind::DocumentUploaded));
}

#[tokio::test]
async fn advisor_may_upload_with_title() {
    let h = harness();
    let mut payload = upload(
        "valuation.xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        b"PK-sheet",
    );
    payload.title = Some("Valuation model".to_string());
    payload.status = DocumentStatus::Final;

    let meta = h
        .service
        .upload(&advisor(), &h.transaction.id, payload)
        .await
        .expect("advisor uploads");

    assert_eq!(meta.title, "Valuation model");
    assert_eq!(meta.uploader_role, TransactionRole::Advisor);
    assert_eq!(meta.status, DocumentStatus::Final);
}

#[tokio::test]
async fn buyer_upload_is_refused_and_audited() {
    let h = harness();
    let id = &h.transaction.id;

    let err = h
        .service
        .upload(&buyer(), id, upload("offer.pdf", PDF, REPORT))
        .await
        .expect_err("buyers cannot upload");

    assert!(matches!(
        err,
        DocumentServiceError::Lifecycle(LifecycleError::Unauthorized(_))
    ));
    let trail = h.store.access_entries(id).expect("trail");
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].action, AccessAction::UnauthorizedAttempt);
    assert_eq!(trail[0].actor_id, buyer().actor_id);
    assert!(h.store.documents_for(id).expect("documents").is_empty());
    assert!(h
        .store
        .activities(id)
        .expect("activity")
        .iter()
        .any(|entry| entry.kind == ActivityKind::UnauthorizedAccess));
}

#[tokio::test]
async fn team_member_reads_but_cannot_upload() {
    let h = harness();
    let id = &h.transaction.id;
    h.service
        .upload(&seller(), id, upload("articles.pdf", PDF, REPORT))
        .await
        .expect("seller uploads");

    assert_eq!(h.service.list(&member(), id).expect("member lists").len(), 1);
    let err = h
        .service
        .upload(&member(), id, upload("notes.pdf", PDF, REPORT))
        .await
        .expect_err("members cannot upload");
    assert_eq!(err.code(), "unauthorized");
}

#[test]
fn stranger_listing_is_refused_and_audited() {
    let h = harness();
    let id = &h.transaction.id;

    let err = h.service.list(&stranger(), id).expect_err("stranger refused");

    assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    let trail = h.store.access_entries(id).expect("trail");
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].action, AccessAction::UnauthorizedAttempt);
    assert_eq!(trail[0].actor_id, stranger().actor_id);
    assert!(trail[0]
        .detail
        .as_deref()
        .is_some_and(|detail| detail.starts_with("list refused")));
}

#[test]
fn unknown_transaction_is_not_found_without_audit() {
    let h = harness();
    let err = h
        .service
        .list(&seller(), &unknown_transaction())
        .expect_err("missing transaction");
    assert_eq!(err.code(), "not_found");
    assert!(h
        .store
        .access_entries(&unknown_transaction())
        .expect("trail")
        .is_empty());
}

#[tokio::test]
async fn disallowed_media_type_is_rejected_before_storage() {
    let h = harness();
    let id = &h.transaction.id;

    let err = h
        .service
        .upload(&seller(), id, upload("photo.png", "image/png", b"\x89PNG"))
        .await
        .expect_err("png refused");

    assert!(matches!(err, DocumentServiceError::UnsupportedMediaType(_)));
    assert_eq!(err.status_code(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    assert!(h.store.documents_for(id).expect("documents").is_empty());
    assert!(h.store.access_entries(id).expect("trail").is_empty());
}

#[tokio::test]
async fn media_type_parameters_are_ignored() {
    let h = harness();
    let meta = h
        .service
        .upload(
            &seller(),
            &h.transaction.id,
            upload("deck.pdf", "Application/PDF; charset=binary", REPORT),
        )
        .await
        .expect("parameters ignored");
    assert_eq!(meta.media_type, PDF);
}

#[tokio::test]
async fn oversized_and_empty_files_are_rejected() {
    let h = harness();
    let id = &h.transaction.id;

    let err = h
        .service
        .upload(&seller(), id, upload("big.pdf", PDF, &vec![0u8; 1025]))
        .await
        .expect_err("too large");
    assert!(matches!(
        err,
        DocumentServiceError::TooLarge { size: 1025, max: 1024 }
    ));

    let err = h
        .service
        .upload(&seller(), id, upload("empty.pdf", PDF, b""))
        .await
        .expect_err("empty");
    assert_eq!(err.code(), "empty");

    let err = h
        .service
        .upload(&seller(), id, upload("  ", PDF, REPORT))
        .await
        .expect_err("filename required");
    assert_eq!(err.code(), "validation");
}

#[tokio::test]
async fn documents_from_other_transactions_are_not_found() {
    let h = harness();
    let err = h
        .service
        .download(&seller(), &h.transaction.id, &DocumentId::from("doc-elsewhere"))
        .await
        .expect_err("unknown document");
    assert_eq!(err.code(), "not_found");
}

#[tokio::test]
async fn storage_timeout_is_retryable() {
    let h = harness_with(
        StalledBlobStore::new(Duration::from_millis(400)),
        UploadPolicy {
            max_bytes: 1024,
            storage_timeout: Duration::from_millis(20),
        },
    );
    let id = &h.transaction.id;

    let err = h
        .service
        .upload(&seller(), id, upload("slow.pdf", PDF, REPORT))
        .await
        .expect_err("timed out");

    assert!(matches!(err, DocumentServiceError::StorageTimeout(_)));
    assert!(err.is_retryable());
    assert_eq!(err.status_code(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
    assert!(h.store.documents_for(id).expect("documents").is_empty());
}

#[tokio::test]
async fn write_landing_after_timeout_is_removed() {
    let h = harness_with(
        StalledBlobStore::new(Duration::from_millis(100)),
        UploadPolicy {
            max_bytes: 1024,
            storage_timeout: Duration::from_millis(10),
        },
    );
    let id = &h.transaction.id;

    let err = h
        .service
        .upload(&seller(), id, upload("late.pdf", PDF, REPORT))
        .await
        .expect_err("timed out");
    assert!(matches!(err, DocumentServiceError::StorageTimeout(_)));

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(h.blobs.landed.is_empty());
    assert!(h.store.documents_for(id).expect("documents").is_empty());
}

#[tokio::test]
async fn unavailable_storage_is_retryable() {
    let h = harness_with(OfflineBlobStore, policy());

    let err = h
        .service
        .upload(&seller(), &h.transaction.id, upload("a.pdf", PDF, REPORT))
        .await
        .expect_err("offline");

    assert_eq!(err.code(), "storage");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn access_log_is_oldest_first_and_party_only() {
    let h = harness();
    let id = &h.transaction.id;
    h.service.list(&seller(), id).expect("seller lists");
    h.service.list(&buyer(), id).expect("buyer lists");

    let trail = h.service.access_log(&advisor(), id).expect("advisor reads trail");
    let actors: Vec<_> = trail.iter().map(|entry| entry.actor_id.clone()).collect();
    assert_eq!(actors, vec![seller().actor_id, buyer().actor_id]);

    assert!(h.service.access_log(&stranger(), id).is_err());
}
