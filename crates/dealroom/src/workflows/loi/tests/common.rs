use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::config::LifecycleConfig;
use crate::workflows::clock::FixedClock;
use crate::workflows::identity::CallerContext;
use crate::workflows::listings::{Listing, ListingService, NewListing};
use crate::workflows::loi::{LoiService, LoiTerms};
use crate::workflows::memory::{InMemoryDealStore, RecordingNotifier};
use crate::workflows::nda::{NdaDecision, NdaService, NewNdaRequest};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 12, 10, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn seller() -> CallerContext {
    CallerContext::new("seller-1")
}

pub(super) fn buyer() -> CallerContext {
    CallerContext::new("buyer-1")
}

pub(super) struct Harness {
    pub(super) service: Arc<LoiService<InMemoryDealStore, RecordingNotifier>>,
    pub(super) nda: NdaService<InMemoryDealStore, RecordingNotifier>,
    pub(super) store: Arc<InMemoryDealStore>,
    pub(super) notifier: Arc<RecordingNotifier>,
    pub(super) clock: Arc<FixedClock>,
    pub(super) listing: Listing,
}

impl Harness {
    /// Run the confidentiality handshake up to approval for `caller`.
    pub(super) fn approve_nda(&self, caller: &CallerContext) {
        let request = self
            .nda
            .request(caller, &self.listing.id, NewNdaRequest::default())
            .expect("nda requested");
        self.nda
            .decide(&seller(), &request.id, NdaDecision::Approve)
            .expect("nda approved");
    }
}

pub(super) fn harness() -> Harness {
    let store = Arc::new(InMemoryDealStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let clock = Arc::new(FixedClock::at(now()));
    let config = LifecycleConfig::default();

    let listing = ListingService::new(store.clone(), notifier.clone(), &config)
        .with_clock(clock.clone())
        .create(
            &seller(),
            NewListing {
                business_type: Some("manufacturing".to_string()),
                region: Some("Västra Götaland".to_string()),
                industry: Some("Manufacturing".to_string()),
                description: Some("Contract manufacturer of precision parts.".to_string()),
                price_min: Some(45_000_000),
                price_max: Some(55_000_000),
                publish: true,
                ..NewListing::default()
            },
        )
        .expect("listing created");
    let nda = NdaService::new(store.clone(), notifier.clone(), &config).with_clock(clock.clone());
    let service = LoiService::new(store.clone(), notifier.clone()).with_clock(clock.clone());

    Harness {
        service: Arc::new(service),
        nda,
        store,
        notifier,
        clock,
        listing,
    }
}

pub(super) fn terms(price: u64) -> LoiTerms {
    LoiTerms {
        proposed_price: price,
        cash_at_closing_pct: Some(80),
        escrow_holdback_pct: Some(10),
        escrow_period_months: Some(18),
        ..LoiTerms::default()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&body).expect("valid json")
}
