use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{NdaTransition, NewNdaRequest};
use super::repository::NdaRepository;
use super::service::NdaService;
use crate::workflows::identity::CallerContext;
use crate::workflows::ids::{ListingId, NdaRequestId};
use crate::workflows::listings::{BuyerProfileRepository, ListingRepository};
use crate::workflows::notify::Notifier;

pub fn nda_router<S, N>(service: Arc<NdaService<S, N>>) -> Router
where
    S: ListingRepository + BuyerProfileRepository + NdaRepository + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/listings/:listing_id/nda-requests",
            post(create_handler::<S, N>),
        )
        .route(
            "/api/v1/nda-requests/:request_id",
            get(detail_handler::<S, N>),
        )
        .route(
            "/api/v1/nda-requests/:request_id/transition",
            post(transition_handler::<S, N>),
        )
        .route(
            "/api/v1/me/nda-requests/incoming",
            get(incoming_handler::<S, N>),
        )
        .route(
            "/api/v1/me/nda-requests/outgoing",
            get(outgoing_handler::<S, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransitionRequest {
    pub status: NdaTransition,
}

pub(crate) async fn create_handler<S, N>(
    State(service): State<Arc<NdaService<S, N>>>,
    caller: CallerContext,
    Path(listing_id): Path<String>,
    payload: Option<Json<NewNdaRequest>>,
) -> Response
where
    S: ListingRepository + BuyerProfileRepository + NdaRepository + 'static,
    N: Notifier + 'static,
{
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();
    match service.request(&caller, &ListingId(listing_id), payload) {
        Ok(request) => (StatusCode::CREATED, Json(request)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn detail_handler<S, N>(
    State(service): State<Arc<NdaService<S, N>>>,
    caller: CallerContext,
    Path(request_id): Path<String>,
) -> Response
where
    S: ListingRepository + BuyerProfileRepository + NdaRepository + 'static,
    N: Notifier + 'static,
{
    match service.get(&caller, &NdaRequestId(request_id)) {
        Ok(request) => (StatusCode::OK, Json(request)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn transition_handler<S, N>(
    State(service): State<Arc<NdaService<S, N>>>,
    caller: CallerContext,
    Path(request_id): Path<String>,
    Json(body): Json<TransitionRequest>,
) -> Response
where
    S: ListingRepository + BuyerProfileRepository + NdaRepository + 'static,
    N: Notifier + 'static,
{
    match service.transition(&caller, &NdaRequestId(request_id), body.status) {
        Ok(request) => (StatusCode::OK, Json(request)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn incoming_handler<S, N>(
    State(service): State<Arc<NdaService<S, N>>>,
    caller: CallerContext,
) -> Response
where
    S: ListingRepository + BuyerProfileRepository + NdaRepository + 'static,
    N: Notifier + 'static,
{
    match service.incoming(&caller) {
        Ok(requests) => (StatusCode::OK, Json(requests)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn outgoing_handler<S, N>(
    State(service): State<Arc<NdaService<S, N>>>,
    caller: CallerContext,
) -> Response
where
    S: ListingRepository + BuyerProfileRepository + NdaRepository + 'static,
    N: Notifier + 'static,
{
    match service.outgoing(&caller) {
        Ok(requests) => (StatusCode::OK, Json(requests)).into_response(),
        Err(err) => err.into_response(),
    }
}
