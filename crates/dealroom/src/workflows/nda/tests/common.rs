use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::config::LifecycleConfig;
use crate::workflows::clock::FixedClock;
use crate::workflows::identity::CallerContext;
use crate::workflows::listings::{Listing, ListingService, NewListing};
use crate::workflows::memory::{InMemoryDealStore, RecordingNotifier};
use crate::workflows::nda::NdaService;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 1, 8, 30, 0)
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
    pub(super) service: Arc<NdaService<InMemoryDealStore, RecordingNotifier>>,
    pub(super) listings: ListingService<InMemoryDealStore, RecordingNotifier>,
    pub(super) notifier: Arc<RecordingNotifier>,
    pub(super) clock: Arc<FixedClock>,
    pub(super) listing: Listing,
}

/// NDA service over a store holding one published listing owned by `seller-1`.
pub(super) fn harness() -> Harness {
    let store = Arc::new(InMemoryDealStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let clock = Arc::new(FixedClock::at(now()));
    let config = LifecycleConfig::default();

    let listings = ListingService::new(store.clone(), notifier.clone(), &config)
        .with_clock(clock.clone());
    let listing = listings
        .create(&seller(), published_listing())
        .expect("listing created");
    let service = NdaService::new(store, notifier.clone(), &config).with_clock(clock.clone());

    Harness {
        service: Arc::new(service),
        listings,
        notifier,
        clock,
        listing,
    }
}

pub(super) fn published_listing() -> NewListing {
    NewListing {
        anonymized_title: Some("Växande e-handel inom sport".to_string()),
        business_type: Some("ecommerce".to_string()),
        region: Some("Skåne".to_string()),
        industry: Some("E-commerce".to_string()),
        description: Some("Profitable online store with its own brand.".to_string()),
        price_min: Some(8_000_000),
        price_max: Some(12_000_000),
        revenue: Some(20_000_000),
        publish: true,
        ..NewListing::default()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&body).expect("valid json")
}
