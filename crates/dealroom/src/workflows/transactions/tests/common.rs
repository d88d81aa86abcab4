use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::clock::FixedClock;
use crate::workflows::identity::CallerContext;
use crate::workflows::ids::{ListingId, LoiId, PartyId};
use crate::workflows::listings::{ConfidentialDetails, Listing, ListingStatus};
use crate::workflows::loi::{DealSide, Loi, LoiRevision, LoiStatus, LoiTerms};
use crate::workflows::memory::{InMemoryDealStore, RecordingNotifier};
use crate::workflows::transactions::{
    generate, ScheduleBlueprint, TransactionRecord, TransactionRepository, TransactionService,
};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn seller() -> CallerContext {
    CallerContext::new("seller-1")
}

pub(super) fn buyer() -> CallerContext {
    CallerContext::new("buyer-1")
}

pub(super) fn listing() -> Listing {
    Listing {
        id: ListingId::from("lst-txn"),
        owner_id: PartyId::from("seller-1"),
        confidential: ConfidentialDetails::default(),
        anonymized_title: None,
        business_type: Some("restaurant".to_string()),
        region: Some("Uppsala".to_string()),
        industry: Some("Hospitality".to_string()),
        revenue_band: None,
        description: "Lunch restaurant near the university.".to_string(),
        price_min: Some(45_000_000),
        price_max: Some(55_000_000),
        revenue: None,
        ebitda: None,
        employees: None,
        status: ListingStatus::Active,
        created_at: now(),
        published_at: Some(now()),
        expires_at: None,
    }
}

pub(super) fn signed_loi(price: u64) -> Loi {
    Loi {
        id: LoiId::from("loi-txn"),
        listing_id: ListingId::from("lst-txn"),
        buyer_id: PartyId::from("buyer-1"),
        seller_id: PartyId::from("seller-1"),
        terms: LoiTerms {
            proposed_price: price,
            ..LoiTerms::default()
        },
        status: LoiStatus::Signed,
        version: 1,
        revisions: vec![LoiRevision {
            version: 1,
            author_id: PartyId::from("buyer-1"),
            author_role: DealSide::Buyer,
            change_description: "Initial offer".to_string(),
            created_at: now(),
        }],
        created_at: now(),
        signed_at: Some(now()),
        rejected_at: None,
        rejection_reason: None,
    }
}

pub(super) struct Harness {
    pub(super) service: Arc<TransactionService<InMemoryDealStore, RecordingNotifier>>,
    pub(super) store: Arc<InMemoryDealStore>,
    pub(super) notifier: Arc<RecordingNotifier>,
    pub(super) clock: Arc<FixedClock>,
    pub(super) record: TransactionRecord,
}

/// Transaction service over a store holding one freshly opened 50M deal.
pub(super) fn harness() -> Harness {
    let store = Arc::new(InMemoryDealStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let clock = Arc::new(FixedClock::at(now()));

    let draft = generate(
        &ScheduleBlueprint::standard(),
        &signed_loi(50_000_000),
        &listing(),
        now(),
    );
    let record = store.create_with_schedule(draft).expect("transaction stored");
    let service = TransactionService::new(store.clone(), notifier.clone()).with_clock(clock.clone());

    Harness {
        service: Arc::new(service),
        store,
        notifier,
        clock,
        record,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&body).expect("valid json")
}
