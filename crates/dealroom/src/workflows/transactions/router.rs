use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{TeamInvitation, TransactionStage};
use super::repository::TransactionRepository;
use super::service::TransactionService;
use crate::workflows::identity::CallerContext;
use crate::workflows::ids::{MilestoneId, PartyId, TransactionId};
use crate::workflows::notify::Notifier;

pub fn transaction_router<S, N>(service: Arc<TransactionService<S, N>>) -> Router
where
    S: TransactionRepository + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route("/api/v1/me/transactions", get(list_handler::<S, N>))
        .route(
            "/api/v1/transactions/:transaction_id",
            get(detail_handler::<S, N>),
        )
        .route(
            "/api/v1/transactions/:transaction_id/milestones/:milestone_id/complete",
            post(complete_milestone_handler::<S, N>),
        )
        .route(
            "/api/v1/transactions/:transaction_id/stage",
            post(advance_stage_handler::<S, N>),
        )
        .route(
            "/api/v1/transactions/:transaction_id/advisor",
            post(assign_advisor_handler::<S, N>),
        )
        .route(
            "/api/v1/transactions/:transaction_id/team",
            post(invite_handler::<S, N>),
        )
        .route(
            "/api/v1/transactions/:transaction_id/team/accept",
            post(accept_handler::<S, N>),
        )
        .route(
            "/api/v1/transactions/:transaction_id/team/decline",
            post(decline_handler::<S, N>),
        )
        .route(
            "/api/v1/transactions/:transaction_id/activity",
            get(activity_handler::<S, N>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StageChange {
    #[serde(default)]
    pub stage: Option<TransactionStage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdvisorAssignment {
    pub advisor_id: String,
}

pub(crate) async fn list_handler<S, N>(
    State(service): State<Arc<TransactionService<S, N>>>,
    caller: CallerContext,
) -> Response
where
    S: TransactionRepository + 'static,
    N: Notifier + 'static,
{
    match service.list(&caller) {
        Ok(transactions) => (StatusCode::OK, Json(transactions)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn detail_handler<S, N>(
    State(service): State<Arc<TransactionService<S, N>>>,
    caller: CallerContext,
    Path(transaction_id): Path<String>,
) -> Response
where
    S: TransactionRepository + 'static,
    N: Notifier + 'static,
{
    match service.get(&caller, &TransactionId(transaction_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn complete_milestone_handler<S, N>(
    State(service): State<Arc<TransactionService<S, N>>>,
    caller: CallerContext,
    Path((transaction_id, milestone_id)): Path<(String, String)>,
) -> Response
where
    S: TransactionRepository + 'static,
    N: Notifier + 'static,
{
    match service.complete_milestone(
        &caller,
        &TransactionId(transaction_id),
        &MilestoneId(milestone_id),
    ) {
        Ok(milestone) => (StatusCode::OK, Json(milestone)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn advance_stage_handler<S, N>(
    State(service): State<Arc<TransactionService<S, N>>>,
    caller: CallerContext,
    Path(transaction_id): Path<String>,
    change: Option<Json<StageChange>>,
) -> Response
where
    S: TransactionRepository + 'static,
    N: Notifier + 'static,
{
    let change = change.map(|Json(change)| change).unwrap_or_default();
    match service.advance_stage(&caller, &TransactionId(transaction_id), change.stage) {
        Ok(transaction) => (StatusCode::OK, Json(transaction)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn assign_advisor_handler<S, N>(
    State(service): State<Arc<TransactionService<S, N>>>,
    caller: CallerContext,
    Path(transaction_id): Path<String>,
    Json(body): Json<AdvisorAssignment>,
) -> Response
where
    S: TransactionRepository + 'static,
    N: Notifier + 'static,
{
    match service.assign_advisor(
        &caller,
        &TransactionId(transaction_id),
        PartyId(body.advisor_id),
    ) {
        Ok(transaction) => (StatusCode::OK, Json(transaction)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn invite_handler<S, N>(
    State(service): State<Arc<TransactionService<S, N>>>,
    caller: CallerContext,
    Path(transaction_id): Path<String>,
    Json(invitation): Json<TeamInvitation>,
) -> Response
where
    S: TransactionRepository + 'static,
    N: Notifier + 'static,
{
    match service.invite_team_member(&caller, &TransactionId(transaction_id), invitation) {
        Ok(member) => (StatusCode::CREATED, Json(member)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn accept_handler<S, N>(
    State(service): State<Arc<TransactionService<S, N>>>,
    caller: CallerContext,
    Path(transaction_id): Path<String>,
) -> Response
where
    S: TransactionRepository + 'static,
    N: Notifier + 'static,
{
    match service.accept_invitation(&caller, &TransactionId(transaction_id)) {
        Ok(member) => (StatusCode::OK, Json(member)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn decline_handler<S, N>(
    State(service): State<Arc<TransactionService<S, N>>>,
    caller: CallerContext,
    Path(transaction_id): Path<String>,
) -> Response
where
    S: TransactionRepository + 'static,
    N: Notifier + 'static,
{
    match service.decline_invitation(&caller, &TransactionId(transaction_id)) {
        Ok(member) => (StatusCode::OK, Json(member)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn activity_handler<S, N>(
    State(service): State<Arc<TransactionService<S, N>>>,
    caller: CallerContext,
    Path(transaction_id): Path<String>,
) -> Response
where
    S: TransactionRepository + 'static,
    N: Notifier + 'static,
{
    match service.activity(&caller, &TransactionId(transaction_id)) {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(err) => err.into_response(),
    }
}
