use std::sync::Arc;

use chrono::Duration;
use tracing::info;

use super::domain::{
    disclosure_unlocked, BuyerProfileSnapshot, NdaDecision, NdaRequest, NdaStatus, NdaTransition,
    NewNdaRequest,
};
use super::repository::NdaRepository;
use crate::config::LifecycleConfig;
use crate::workflows::clock::{Clock, SystemClock};
use crate::workflows::error::{stale_as_conflict, ConflictKind, EntityKind, LifecycleError};
use crate::workflows::identity::CallerContext;
use crate::workflows::ids::{ListingId, NdaRequestId, PartyId};
use crate::workflows::listings::{BuyerProfileRepository, ListingRepository};
use crate::workflows::notify::{dispatch, Notification, NotificationChannel, Notifier};
use crate::workflows::repository::RepositoryError;

/// Service coordinating the confidentiality handshake between buyer and seller.
pub struct NdaService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    validity: Duration,
    clock: Arc<dyn Clock>,
}

impl<S, N> NdaService<S, N>
where
    S: ListingRepository + BuyerProfileRepository + NdaRepository + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: &LifecycleConfig) -> Self {
        Self {
            store,
            notifier,
            validity: Duration::days(config.nda_validity_days),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Buyer asks the listing owner for disclosure.
    pub fn request(
        &self,
        caller: &CallerContext,
        listing_id: &ListingId,
        payload: NewNdaRequest,
    ) -> Result<NdaRequest, LifecycleError> {
        let now = self.clock.now();
        let listing = self
            .store
            .fetch_listing(listing_id)?
            .ok_or_else(|| LifecycleError::not_found(EntityKind::Listing, listing_id))?;

        if caller.is(&listing.owner_id) {
            return Err(LifecycleError::unauthorized(
                "sellers cannot request disclosure of their own listing",
            ));
        }
        if !listing.is_live(now) {
            return Err(LifecycleError::invalid_state(
                listing.status.label(),
                "active",
            ));
        }

        let profile = self.store.profile_for(&caller.actor_id)?;
        let request = NdaRequest {
            id: NdaRequestId::next(),
            listing_id: listing.id.clone(),
            buyer_id: caller.actor_id.clone(),
            seller_id: listing.owner_id.clone(),
            message: payload
                .message
                .map(|message| message.trim().to_string())
                .filter(|message| !message.is_empty()),
            profile_snapshot: BuyerProfileSnapshot::capture(profile.as_ref(), now),
            status: NdaStatus::Pending,
            created_at: now,
            viewed_at: None,
            approved_at: None,
            rejected_at: None,
            signed_at: None,
            expires_at: now + self.validity,
        };

        let stored = match self.store.insert_request(request, now) {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict) => {
                return Err(LifecycleError::Conflict(ConflictKind::DuplicateRequest))
            }
            Err(err) => return Err(err.into()),
        };
        info!(request = %stored.id, listing = %stored.listing_id, buyer = %stored.buyer_id, "nda requested");

        for channel in [NotificationChannel::Email, NotificationChannel::InApp] {
            dispatch(
                self.notifier.as_ref(),
                Notification::new(stored.seller_id.clone(), channel, "nda_requested")
                    .with_detail("request_id", &stored.id)
                    .with_detail("listing_id", &stored.listing_id),
            );
        }

        Ok(stored)
    }

    /// Seller approves or rejects a pending request.
    pub fn decide(
        &self,
        caller: &CallerContext,
        request_id: &NdaRequestId,
        decision: NdaDecision,
    ) -> Result<NdaRequest, LifecycleError> {
        let now = self.clock.now();
        let mut request = self.fetch(request_id)?;
        if !caller.is(&request.seller_id) {
            return Err(LifecycleError::unauthorized(
                "only the listing owner decides on disclosure",
            ));
        }

        match request.effective_status(now) {
            NdaStatus::Pending => {}
            NdaStatus::Expired => return Err(LifecycleError::Conflict(ConflictKind::Expired)),
            other => return Err(LifecycleError::invalid_state(other.label(), "pending")),
        }

        request.viewed_at.get_or_insert(now);
        let template = match decision {
            NdaDecision::Approve => {
                request.status = NdaStatus::Approved;
                request.approved_at = Some(now);
                "nda_approved"
            }
            NdaDecision::Reject => {
                request.status = NdaStatus::Rejected;
                request.rejected_at = Some(now);
                "nda_rejected"
            }
        };

        self.store
            .transition_request(request.clone(), NdaStatus::Pending)
            .map_err(stale_as_conflict)?;
        info!(request = %request.id, status = request.status.label(), "nda decided");

        dispatch(
            self.notifier.as_ref(),
            Notification::new(request.buyer_id.clone(), NotificationChannel::InApp, template)
                .with_detail("request_id", &request.id)
                .with_detail("listing_id", &request.listing_id),
        );

        Ok(request)
    }

    /// Buyer countersigns an approved request.
    pub fn sign(
        &self,
        caller: &CallerContext,
        request_id: &NdaRequestId,
    ) -> Result<NdaRequest, LifecycleError> {
        let now = self.clock.now();
        let mut request = self.fetch(request_id)?;
        if !caller.is(&request.buyer_id) {
            return Err(LifecycleError::unauthorized(
                "only the requesting buyer signs the agreement",
            ));
        }

        let current = request.effective_status(now);
        if current != NdaStatus::Approved {
            return Err(LifecycleError::invalid_state(current.label(), "approved"));
        }

        request.status = NdaStatus::Signed;
        request.signed_at = Some(now);
        self.store
            .transition_request(request.clone(), NdaStatus::Approved)
            .map_err(stale_as_conflict)?;
        info!(request = %request.id, "nda signed");

        dispatch(
            self.notifier.as_ref(),
            Notification::new(
                request.seller_id.clone(),
                NotificationChannel::InApp,
                "nda_signed",
            )
            .with_detail("request_id", &request.id),
        );

        Ok(request)
    }

    pub fn transition(
        &self,
        caller: &CallerContext,
        request_id: &NdaRequestId,
        target: NdaTransition,
    ) -> Result<NdaRequest, LifecycleError> {
        match target {
            NdaTransition::Approved => self.decide(caller, request_id, NdaDecision::Approve),
            NdaTransition::Rejected => self.decide(caller, request_id, NdaDecision::Reject),
            NdaTransition::Signed => self.sign(caller, request_id),
        }
    }

    /// Either party reads the request with its effective status.
    pub fn get(
        &self,
        caller: &CallerContext,
        request_id: &NdaRequestId,
    ) -> Result<NdaRequest, LifecycleError> {
        let request = self.fetch(request_id)?;
        if !request.involves(&caller.actor_id) {
            return Err(LifecycleError::unauthorized(
                "only the buyer and seller may read this request",
            ));
        }
        Ok(request.as_of(self.clock.now()))
    }

    /// Requests received by the caller as a listing owner, newest first.
    pub fn incoming(&self, caller: &CallerContext) -> Result<Vec<NdaRequest>, LifecycleError> {
        self.for_party(caller, |request, party| &request.seller_id == party)
    }

    /// Requests the caller sent as a buyer, newest first.
    pub fn outgoing(&self, caller: &CallerContext) -> Result<Vec<NdaRequest>, LifecycleError> {
        self.for_party(caller, |request, party| &request.buyer_id == party)
    }

    /// Whether `a` and `b` may exchange messages about `listing`.
    pub fn may_message(
        &self,
        listing: &ListingId,
        a: &PartyId,
        b: &PartyId,
    ) -> Result<bool, LifecycleError> {
        let requests = self.store.requests_for_listing(listing)?;
        Ok(disclosure_unlocked(&requests, listing, a, b))
    }

    fn for_party(
        &self,
        caller: &CallerContext,
        keep: impl Fn(&NdaRequest, &PartyId) -> bool,
    ) -> Result<Vec<NdaRequest>, LifecycleError> {
        let now = self.clock.now();
        let mut requests: Vec<NdaRequest> = self
            .store
            .requests_for_party(&caller.actor_id)?
            .into_iter()
            .filter(|request| keep(request, &caller.actor_id))
            .map(|request| request.as_of(now))
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    fn fetch(&self, request_id: &NdaRequestId) -> Result<NdaRequest, LifecycleError> {
        self.store
            .fetch_request(request_id)?
            .ok_or_else(|| LifecycleError::not_found(EntityKind::NdaRequest, request_id))
    }
}
