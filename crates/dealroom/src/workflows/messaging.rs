//! Direct buyer/seller messages about a listing, available once disclosure has been granted.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::clock::{Clock, SystemClock};
use super::error::{EntityKind, LifecycleError};
use super::identity::CallerContext;
use super::ids::{ListingId, MessageId, PartyId};
use super::listings::ListingRepository;
use super::nda::{disclosure_unlocked, NdaRepository};
use super::notify::{dispatch, Notification, NotificationChannel, Notifier};
use super::repository::RepositoryError;

const MAX_BODY_CHARS: usize = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub listing_id: ListingId,
    pub sender_id: PartyId,
    pub recipient_id: PartyId,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub recipient_id: String,
    pub body: String,
}

pub trait MessageRepository: Send + Sync {
    fn insert_message(&self, message: Message) -> Result<Message, RepositoryError>;
    /// Messages on `listing` exchanged between `a` and `b`, in either direction.
    fn conversation(
        &self,
        listing: &ListingId,
        a: &PartyId,
        b: &PartyId,
    ) -> Result<Vec<Message>, RepositoryError>;
}

pub struct MessagingService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
}

impl<S, N> MessagingService<S, N>
where
    S: ListingRepository + NdaRepository + MessageRepository + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self {
            store,
            notifier,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn send(
        &self,
        caller: &CallerContext,
        listing_id: &ListingId,
        message: NewMessage,
    ) -> Result<Message, LifecycleError> {
        let body = message.body.trim().to_string();
        let recipient = PartyId(message.recipient_id.trim().to_string());
        let mut invalid = Vec::new();
        if body.is_empty() || body.chars().count() > MAX_BODY_CHARS {
            invalid.push("body");
        }
        if recipient.as_str().is_empty() || caller.is(&recipient) {
            invalid.push("recipient_id");
        }
        if !invalid.is_empty() {
            return Err(LifecycleError::validation(invalid));
        }

        self.require_link(caller, listing_id, &recipient)?;

        let stored = self.store.insert_message(Message {
            id: MessageId::next(),
            listing_id: listing_id.clone(),
            sender_id: caller.actor_id.clone(),
            recipient_id: recipient.clone(),
            body,
            sent_at: self.clock.now(),
        })?;
        info!(listing = %listing_id, message = %stored.id, "message sent");

        dispatch(
            self.notifier.as_ref(),
            Notification::new(recipient, NotificationChannel::InApp, "message_received")
                .with_detail("listing_id", listing_id)
                .with_detail("message_id", &stored.id),
        );
        Ok(stored)
    }

    /// Thread between the caller and `counterpart`, oldest first.
    pub fn conversation(
        &self,
        caller: &CallerContext,
        listing_id: &ListingId,
        counterpart: &PartyId,
    ) -> Result<Vec<Message>, LifecycleError> {
        self.require_link(caller, listing_id, counterpart)?;
        let mut messages = self
            .store
            .conversation(listing_id, &caller.actor_id, counterpart)?;
        messages.sort_by(|a, b| a.sent_at.cmp(&b.sent_at));
        Ok(messages)
    }

    fn require_link(
        &self,
        caller: &CallerContext,
        listing_id: &ListingId,
        counterpart: &PartyId,
    ) -> Result<(), LifecycleError> {
        self.store
            .fetch_listing(listing_id)?
            .ok_or_else(|| LifecycleError::not_found(EntityKind::Listing, listing_id))?;
        let requests = self.store.requests_for_listing(listing_id)?;
        if disclosure_unlocked(&requests, listing_id, &caller.actor_id, counterpart) {
            Ok(())
        } else {
            Err(LifecycleError::unauthorized(
                "messaging requires an approved confidentiality agreement between both parties",
            ))
        }
    }
}

pub fn messaging_router<S, N>(service: Arc<MessagingService<S, N>>) -> Router
where
    S: ListingRepository + NdaRepository + MessageRepository + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/listings/:listing_id/messages",
            post(send_handler::<S, N>),
        )
        .route(
            "/api/v1/listings/:listing_id/messages/:counterpart_id",
            get(conversation_handler::<S, N>),
        )
        .with_state(service)
}

async fn send_handler<S, N>(
    State(service): State<Arc<MessagingService<S, N>>>,
    caller: CallerContext,
    Path(listing_id): Path<String>,
    Json(message): Json<NewMessage>,
) -> Response
where
    S: ListingRepository + NdaRepository + MessageRepository + 'static,
    N: Notifier + 'static,
{
    match service.send(&caller, &ListingId(listing_id), message) {
        Ok(message) => (StatusCode::CREATED, Json(message)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn conversation_handler<S, N>(
    State(service): State<Arc<MessagingService<S, N>>>,
    caller: CallerContext,
    Path((listing_id, counterpart_id)): Path<(String, String)>,
) -> Response
where
    S: ListingRepository + NdaRepository + MessageRepository + 'static,
    N: Notifier + 'static,
{
    match service.conversation(&caller, &ListingId(listing_id), &PartyId(counterpart_id)) {
        Ok(messages) => (StatusCode::OK, Json(messages)).into_response(),
        Err(err) => err.into_response(),
    }
}
