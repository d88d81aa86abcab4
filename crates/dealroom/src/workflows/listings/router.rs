use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::warn;

use super::domain::{BuyerPreferences, ListingAction, ListingFilters, NewListing};
use super::repository::{BuyerProfileRepository, ListingRepository};
use super::service::ListingService;
use crate::workflows::identity::CallerContext;
use crate::workflows::ids::ListingId;
use crate::workflows::nda::NdaRepository;
use crate::workflows::notify::Notifier;

/// Router exposing listing search, listing management, and buyer preferences.
pub fn listing_router<S, N>(service: Arc<ListingService<S, N>>) -> Router
where
    S: ListingRepository + BuyerProfileRepository + NdaRepository + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/listings",
            get(list_handler::<S, N>).post(create_handler::<S, N>),
        )
        .route("/api/v1/listings/:listing_id", get(detail_handler::<S, N>))
        .route(
            "/api/v1/listings/:listing_id/status",
            post(status_handler::<S, N>),
        )
        .route(
            "/api/v1/buyer-profile",
            get(profile_handler::<S, N>).put(save_profile_handler::<S, N>),
        )
        .route("/api/v1/matches", get(matches_handler::<S, N>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusChange {
    pub action: ListingAction,
}

pub(crate) async fn list_handler<S, N>(
    State(service): State<Arc<ListingService<S, N>>>,
    viewer: Option<CallerContext>,
    Query(filters): Query<ListingFilters>,
) -> Response
where
    S: ListingRepository + BuyerProfileRepository + NdaRepository + 'static,
    N: Notifier + 'static,
{
    match service.list(&filters, viewer.as_ref()) {
        Ok(listings) => (StatusCode::OK, Json(listings)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn detail_handler<S, N>(
    State(service): State<Arc<ListingService<S, N>>>,
    viewer: Option<CallerContext>,
    Path(listing_id): Path<String>,
) -> Response
where
    S: ListingRepository + BuyerProfileRepository + NdaRepository + 'static,
    N: Notifier + 'static,
{
    match service.get(viewer.as_ref(), &ListingId(listing_id)) {
        Ok(listing) => (StatusCode::OK, Json(listing)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn create_handler<S, N>(
    State(service): State<Arc<ListingService<S, N>>>,
    caller: CallerContext,
    Json(payload): Json<NewListing>,
) -> Response
where
    S: ListingRepository + BuyerProfileRepository + NdaRepository + 'static,
    N: Notifier + 'static,
{
    match service.create(&caller, payload) {
        Ok(listing) => {
            if listing.published_at.is_some() {
                spawn_match_fanout(service.clone(), listing.id.clone());
            }
            (StatusCode::CREATED, Json(listing)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn status_handler<S, N>(
    State(service): State<Arc<ListingService<S, N>>>,
    caller: CallerContext,
    Path(listing_id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Response
where
    S: ListingRepository + BuyerProfileRepository + NdaRepository + 'static,
    N: Notifier + 'static,
{
    match service.change_status(&caller, &ListingId(listing_id), change.action) {
        Ok(listing) => {
            if change.action == ListingAction::Publish {
                spawn_match_fanout(service.clone(), listing.id.clone());
            }
            (StatusCode::OK, Json(listing)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn profile_handler<S, N>(
    State(service): State<Arc<ListingService<S, N>>>,
    caller: CallerContext,
) -> Response
where
    S: ListingRepository + BuyerProfileRepository + NdaRepository + 'static,
    N: Notifier + 'static,
{
    match service.profile(&caller) {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn save_profile_handler<S, N>(
    State(service): State<Arc<ListingService<S, N>>>,
    caller: CallerContext,
    Json(preferences): Json<BuyerPreferences>,
) -> Response
where
    S: ListingRepository + BuyerProfileRepository + NdaRepository + 'static,
    N: Notifier + 'static,
{
    match service.save_profile(&caller, preferences) {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn matches_handler<S, N>(
    State(service): State<Arc<ListingService<S, N>>>,
    caller: CallerContext,
) -> Response
where
    S: ListingRepository + BuyerProfileRepository + NdaRepository + 'static,
    N: Notifier + 'static,
{
    match service.matches_for(&caller) {
        Ok(matches) => (StatusCode::OK, Json(matches)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Score the published listing against every buyer profile off the request path.
fn spawn_match_fanout<S, N>(service: Arc<ListingService<S, N>>, listing_id: ListingId)
where
    S: ListingRepository + BuyerProfileRepository + NdaRepository + 'static,
    N: Notifier + 'static,
{
    tokio::task::spawn_blocking(move || {
        if let Err(err) = service.notify_matching_buyers(&listing_id) {
            warn!(listing = %listing_id, error = %err, "match fan-out failed");
        }
    });
}
