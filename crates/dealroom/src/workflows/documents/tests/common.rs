use std::sync::Arc;
use std::time::Duration;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::clock::FixedClock;
use crate::workflows::documents::{
    BlobStore, BlobStoreError, DocumentCipher, DocumentService, DocumentStatus, DocumentUpload,
    EncryptionKey, StorageRef, UploadPolicy,
};
use crate::workflows::identity::CallerContext;
use crate::workflows::ids::{ListingId, LoiId, TransactionId};
use crate::workflows::listings::{ConfidentialDetails, Listing, ListingStatus};
use crate::workflows::loi::{Loi, LoiStatus, LoiTerms};
use crate::workflows::memory::{InMemoryBlobStore, InMemoryDealStore};
use crate::workflows::transactions::{
    generate, ScheduleBlueprint, TeamMember, TeamMemberStatus, Transaction, TransactionRepository,
};

pub(super) const PDF: &str = "application/pdf";

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 7, 7, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn seller() -> CallerContext {
    CallerContext::new("seller-1")
}

pub(super) fn buyer() -> CallerContext {
    CallerContext::new("buyer-1")
}

pub(super) fn advisor() -> CallerContext {
    CallerContext::new("advisor-1")
}

pub(super) fn member() -> CallerContext {
    CallerContext::new("lawyer-1")
}

pub(super) fn stranger() -> CallerContext {
    CallerContext::new("stranger-1")
}

pub(super) fn key() -> EncryptionKey {
    EncryptionKey::from_bytes([7u8; 32])
}

pub(super) fn policy() -> UploadPolicy {
    UploadPolicy {
        max_bytes: 1024,
        storage_timeout: Duration::from_secs(5),
    }
}

pub(super) fn upload(filename: &str, media_type: &str, bytes: &[u8]) -> DocumentUpload {
    DocumentUpload {
        title: None,
        filename: filename.to_string(),
        media_type: media_type.to_string(),
        status: DocumentStatus::Draft,
        bytes: bytes.to_vec(),
    }
}

pub(super) struct Harness<B> {
    pub(super) service: Arc<DocumentService<InMemoryDealStore, B>>,
    pub(super) store: Arc<InMemoryDealStore>,
    pub(super) blobs: Arc<B>,
    pub(super) transaction: Transaction,
}

pub(super) fn harness() -> Harness<InMemoryBlobStore> {
    harness_with(InMemoryBlobStore::new(), policy())
}

/// Document service over one transaction with an advisor and an accepted team member.
pub(super) fn harness_with<B>(blobs: B, policy: UploadPolicy) -> Harness<B>
where
    B: BlobStore + 'static,
{
    let store = Arc::new(InMemoryDealStore::new());
    let blobs = Arc::new(blobs);
    let transaction = seed_transaction(&store);
    let service = DocumentService::new(
        store.clone(),
        blobs.clone(),
        DocumentCipher::new(key()),
        policy,
    )
    .with_clock(Arc::new(FixedClock::at(now())));

    Harness {
        service: Arc::new(service),
        store,
        blobs,
        transaction,
    }
}

fn seed_transaction(store: &InMemoryDealStore) -> Transaction {
    let listing = Listing {
        id: ListingId::from("lst-docs"),
        owner_id: seller().actor_id,
        confidential: ConfidentialDetails::default(),
        anonymized_title: Some("Etablerad grossist".to_string()),
        business_type: Some("wholesale".to_string()),
        region: Some("Örebro".to_string()),
        industry: Some("Wholesale".to_string()),
        revenue_band: None,
        description: "Regional wholesaler.".to_string(),
        price_min: Some(20_000_000),
        price_max: None,
        revenue: None,
        ebitda: None,
        employees: None,
        status: ListingStatus::Active,
        created_at: now(),
        published_at: Some(now()),
        expires_at: None,
    };
    let loi = Loi {
        id: LoiId::from("loi-docs"),
        listing_id: listing.id.clone(),
        buyer_id: buyer().actor_id,
        seller_id: seller().actor_id,
        terms: LoiTerms {
            proposed_price: 20_000_000,
            ..LoiTerms::default()
        },
        status: LoiStatus::Signed,
        version: 1,
        revisions: Vec::new(),
        created_at: now(),
        signed_at: Some(now()),
        rejected_at: None,
        rejection_reason: None,
    };

    let mut draft = generate(&ScheduleBlueprint::standard(), &loi, &listing, now());
    draft.transaction.advisor_id = Some(advisor().actor_id);
    let record = store.create_with_schedule(draft).expect("transaction stored");
    store
        .upsert_team_member(TeamMember {
            transaction_id: record.transaction.id.clone(),
            party_id: member().actor_id,
            title: Some("Counsel".to_string()),
            invited_by: buyer().actor_id,
            status: TeamMemberStatus::Accepted,
            invited_at: now(),
            responded_at: Some(now()),
        })
        .expect("team member stored");
    record.transaction
}

/// Blob store that answers only after `delay`, then keeps what it was given in `landed`.
pub(super) struct StalledBlobStore {
    pub(super) delay: Duration,
    pub(super) landed: InMemoryBlobStore,
}

impl StalledBlobStore {
    pub(super) fn new(delay: Duration) -> Self {
        Self {
            delay,
            landed: InMemoryBlobStore::new(),
        }
    }
}

impl BlobStore for StalledBlobStore {
    fn put(&self, key: &str, bytes: Vec<u8>) -> Result<StorageRef, BlobStoreError> {
        std::thread::sleep(self.delay);
        self.landed.put(key, bytes)
    }

    fn get(&self, reference: &StorageRef) -> Result<Vec<u8>, BlobStoreError> {
        std::thread::sleep(self.delay);
        self.landed.get(reference)
    }

    fn delete(&self, key: &str) -> Result<(), BlobStoreError> {
        self.landed.delete(key)
    }
}

/// Blob store whose backend is down.
pub(super) struct OfflineBlobStore;

impl BlobStore for OfflineBlobStore {
    fn put(&self, _key: &str, _bytes: Vec<u8>) -> Result<StorageRef, BlobStoreError> {
        Err(BlobStoreError::Unavailable("bucket offline".to_string()))
    }

    fn get(&self, _reference: &StorageRef) -> Result<Vec<u8>, BlobStoreError> {
        Err(BlobStoreError::Unavailable("bucket offline".to_string()))
    }

    fn delete(&self, _key: &str) -> Result<(), BlobStoreError> {
        Err(BlobStoreError::Unavailable("bucket offline".to_string()))
    }
}

pub(super) fn unknown_transaction() -> TransactionId {
    TransactionId::from("txn-missing")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&body).expect("valid json")
}
