use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use super::domain::{LoiDecision, LoiOutcome, LoiRevisionRequest, LoiTerms};
use super::repository::LoiRepository;
use super::service::LoiService;
use crate::workflows::identity::CallerContext;
use crate::workflows::ids::{ListingId, LoiId};
use crate::workflows::listings::ListingRepository;
use crate::workflows::nda::NdaRepository;
use crate::workflows::notify::Notifier;
use crate::workflows::transactions::TransactionRepository;

pub fn loi_router<S, N>(service: Arc<LoiService<S, N>>) -> Router
where
    S: ListingRepository + NdaRepository + LoiRepository + TransactionRepository + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/listings/:listing_id/lois",
            post(propose_handler::<S, N>),
        )
        .route("/api/v1/lois/:loi_id", get(detail_handler::<S, N>))
        .route(
            "/api/v1/lois/:loi_id/decision",
            post(decision_handler::<S, N>),
        )
        .route(
            "/api/v1/lois/:loi_id/revisions",
            post(revision_handler::<S, N>),
        )
        .route("/api/v1/me/lois", get(list_handler::<S, N>))
        .with_state(service)
}

pub(crate) async fn propose_handler<S, N>(
    State(service): State<Arc<LoiService<S, N>>>,
    caller: CallerContext,
    Path(listing_id): Path<String>,
    Json(terms): Json<LoiTerms>,
) -> Response
where
    S: ListingRepository + NdaRepository + LoiRepository + TransactionRepository + 'static,
    N: Notifier + 'static,
{
    match service.propose(&caller, &ListingId(listing_id), terms) {
        Ok(loi) => (StatusCode::CREATED, Json(loi)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn detail_handler<S, N>(
    State(service): State<Arc<LoiService<S, N>>>,
    caller: CallerContext,
    Path(loi_id): Path<String>,
) -> Response
where
    S: ListingRepository + NdaRepository + LoiRepository + TransactionRepository + 'static,
    N: Notifier + 'static,
{
    match service.get(&caller, &LoiId(loi_id)) {
        Ok(loi) => (StatusCode::OK, Json(loi)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn decision_handler<S, N>(
    State(service): State<Arc<LoiService<S, N>>>,
    caller: CallerContext,
    Path(loi_id): Path<String>,
    Json(decision): Json<LoiDecision>,
) -> Response
where
    S: ListingRepository + NdaRepository + LoiRepository + TransactionRepository + 'static,
    N: Notifier + 'static,
{
    match service.respond(&caller, &LoiId(loi_id), decision) {
        Ok(outcome @ LoiOutcome::Signed(_)) => (StatusCode::CREATED, Json(outcome)).into_response(),
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn revision_handler<S, N>(
    State(service): State<Arc<LoiService<S, N>>>,
    caller: CallerContext,
    Path(loi_id): Path<String>,
    Json(request): Json<LoiRevisionRequest>,
) -> Response
where
    S: ListingRepository + NdaRepository + LoiRepository + TransactionRepository + 'static,
    N: Notifier + 'static,
{
    match service.revise(&caller, &LoiId(loi_id), request) {
        Ok(loi) => (StatusCode::OK, Json(loi)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn list_handler<S, N>(
    State(service): State<Arc<LoiService<S, N>>>,
    caller: CallerContext,
) -> Response
where
    S: ListingRepository + NdaRepository + LoiRepository + TransactionRepository + 'static,
    N: Notifier + 'static,
{
    match service.for_party(&caller) {
        Ok(lois) => (StatusCode::OK, Json(lois)).into_response(),
        Err(err) => err.into_response(),
    }
}
