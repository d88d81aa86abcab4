use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::config::LifecycleConfig;
use crate::workflows::clock::FixedClock;
use crate::workflows::identity::CallerContext;
use crate::workflows::ids::{ListingId, NdaRequestId, PartyId};
use crate::workflows::listings::{
    BuyerPreferences, BuyerProfile, ConfidentialDetails, Listing, ListingService, ListingStatus,
    NewListing, RegionPreference,
};
use crate::workflows::memory::{InMemoryDealStore, RecordingNotifier};
use crate::workflows::nda::{BuyerProfileSnapshot, NdaRepository, NdaRequest, NdaStatus};

pub(super) type Service = ListingService<InMemoryDealStore, RecordingNotifier>;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0)
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
    pub(super) service: Arc<Service>,
    pub(super) store: Arc<InMemoryDealStore>,
    pub(super) notifier: Arc<RecordingNotifier>,
    pub(super) clock: Arc<FixedClock>,
}

pub(super) fn harness() -> Harness {
    let store = Arc::new(InMemoryDealStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let clock = Arc::new(FixedClock::at(now()));
    let service = ListingService::new(store.clone(), notifier.clone(), &LifecycleConfig::default())
        .with_clock(clock.clone());
    Harness {
        service: Arc::new(service),
        store,
        notifier,
        clock,
    }
}

/// Stockholm IT consultancy asking 40M to 60M on 30M revenue.
pub(super) fn stockholm_it_listing() -> NewListing {
    NewListing {
        confidential: ConfidentialDetails {
            company_name: Some("Nordkod Konsult AB".to_string()),
            registry_number: Some("556677-8899".to_string()),
            address: Some("Sveavägen 12, Stockholm".to_string()),
            website: Some("https://nordkod.example".to_string()),
        },
        anonymized_title: Some("Lönsamt IT-konsultbolag".to_string()),
        business_type: Some("it_consulting".to_string()),
        region: Some("Stockholm".to_string()),
        industry: Some("IT".to_string()),
        revenue_band: Some("25-50M".to_string()),
        description: Some("Established consultancy with recurring public sector clients.".to_string()),
        price_min: Some(40_000_000),
        price_max: Some(60_000_000),
        revenue: Some(30_000_000),
        ebitda: Some(6_000_000),
        employees: Some(24),
        publish: true,
    }
}

pub(super) fn stockholm_it_preferences() -> BuyerPreferences {
    BuyerPreferences {
        preferred_regions: RegionPreference::Only(vec!["Stockholm".to_string()]),
        preferred_industries: vec!["IT".to_string()],
        price_min: Some(45_000_000),
        price_max: Some(55_000_000),
        revenue_min: Some(25_000_000),
        revenue_max: Some(35_000_000),
    }
}

pub(super) fn profile(buyer: &str, preferences: BuyerPreferences) -> BuyerProfile {
    BuyerProfile {
        buyer_id: PartyId::from(buyer),
        preferences,
        updated_at: now(),
    }
}

/// Stored listing without going through the service, for pure scoring tests.
pub(super) fn listing_record(payload: NewListing) -> Listing {
    Listing {
        id: ListingId::from("lst-fixture"),
        owner_id: PartyId::from("seller-1"),
        confidential: payload.confidential,
        anonymized_title: payload.anonymized_title,
        business_type: payload.business_type,
        region: payload.region,
        industry: payload.industry,
        revenue_band: payload.revenue_band,
        description: payload.description.unwrap_or_default(),
        price_min: payload.price_min,
        price_max: payload.price_max,
        revenue: payload.revenue,
        ebitda: payload.ebitda,
        employees: payload.employees,
        status: ListingStatus::Active,
        created_at: now(),
        published_at: Some(now()),
        expires_at: None,
    }
}

/// Record a request in `status` directly, bypassing the handshake.
pub(super) fn grant_disclosure(
    store: &InMemoryDealStore,
    listing: &Listing,
    buyer: &CallerContext,
    status: NdaStatus,
) {
    let request = NdaRequest {
        id: NdaRequestId::from(format!("nda-{}-{}", listing.id, buyer.actor_id)),
        listing_id: listing.id.clone(),
        buyer_id: buyer.actor_id.clone(),
        seller_id: listing.owner_id.clone(),
        message: None,
        profile_snapshot: BuyerProfileSnapshot::capture(None, now()),
        status,
        created_at: now(),
        viewed_at: Some(now()),
        approved_at: Some(now()),
        rejected_at: None,
        signed_at: None,
        expires_at: now() + chrono::Duration::days(30),
    };
    store
        .insert_request(request, now())
        .expect("request stored");
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&body).expect("valid json")
}
