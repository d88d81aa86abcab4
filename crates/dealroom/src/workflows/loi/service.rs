use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{
    DealSide, Loi, LoiAction, LoiApproval, LoiDecision, LoiOutcome, LoiRevision,
    LoiRevisionRequest, LoiStatus, LoiTerms, LoiView,
};
use super::repository::LoiRepository;
use crate::workflows::clock::{Clock, SystemClock};
use crate::workflows::error::{stale_as_conflict, ConflictKind, EntityKind, LifecycleError};
use crate::workflows::identity::CallerContext;
use crate::workflows::ids::{ListingId, LoiId};
use crate::workflows::listings::{Listing, ListingRepository};
use crate::workflows::nda::{disclosure_unlocked, NdaRepository};
use crate::workflows::notify::{dispatch, Notification, NotificationChannel, Notifier};
use crate::workflows::repository::RepositoryError;
use crate::workflows::transactions::{self, ScheduleBlueprint, TransactionRepository};

const DEFAULT_REJECTION_REASON: &str = "rejected by seller";

/// Service driving letters of intent from proposal to a signed deal.
pub struct LoiService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    blueprint: ScheduleBlueprint,
    clock: Arc<dyn Clock>,
}

impl<S, N> LoiService<S, N>
where
    S: ListingRepository + NdaRepository + LoiRepository + TransactionRepository + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self {
            store,
            notifier,
            blueprint: ScheduleBlueprint::standard(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Buyer submits an offer. Requires disclosure to have been granted for the listing.
    pub fn propose(
        &self,
        caller: &CallerContext,
        listing_id: &ListingId,
        terms: LoiTerms,
    ) -> Result<LoiView, LifecycleError> {
        let now = self.clock.now();
        let listing = self.listing(listing_id)?;
        if caller.is(&listing.owner_id) {
            return Err(LifecycleError::unauthorized(
                "sellers cannot make offers on their own listing",
            ));
        }
        if !listing.is_live(now) {
            return Err(LifecycleError::invalid_state(listing.status.label(), "active"));
        }

        let requests = self.store.requests_for_listing(listing_id)?;
        if !disclosure_unlocked(&requests, listing_id, &caller.actor_id, &listing.owner_id) {
            return Err(LifecycleError::unauthorized(
                "an approved confidentiality agreement is required before making an offer",
            ));
        }

        if self
            .store
            .find_by_parties(listing_id, &caller.actor_id, &listing.owner_id)?
            .is_some()
        {
            return Err(LifecycleError::Conflict(ConflictKind::DealExists));
        }
        let has_open_offer = self
            .store
            .lois_for_party(&caller.actor_id)?
            .iter()
            .any(|loi| &loi.listing_id == listing_id && loi.is_open());
        if has_open_offer {
            return Err(LifecycleError::Conflict(ConflictKind::DuplicateRequest));
        }

        let invalid = terms.invalid_fields();
        if !invalid.is_empty() {
            return Err(LifecycleError::validation(invalid));
        }

        let loi = Loi {
            id: LoiId::next(),
            listing_id: listing.id.clone(),
            buyer_id: caller.actor_id.clone(),
            seller_id: listing.owner_id.clone(),
            terms,
            status: LoiStatus::Proposed,
            version: 1,
            revisions: vec![LoiRevision {
                version: 1,
                author_id: caller.actor_id.clone(),
                author_role: DealSide::Buyer,
                change_description: "Initial offer".to_string(),
                created_at: now,
            }],
            created_at: now,
            signed_at: None,
            rejected_at: None,
            rejection_reason: None,
        };

        let stored = self.store.insert_loi(loi)?;
        info!(loi = %stored.id, listing = %stored.listing_id, price = stored.terms.proposed_price, "loi proposed");

        dispatch(
            self.notifier.as_ref(),
            Notification::new(
                stored.seller_id.clone(),
                NotificationChannel::Email,
                "loi_proposed",
            )
            .with_detail("loi_id", &stored.id)
            .with_detail("listing_id", &stored.listing_id),
        );

        Ok(stored.into())
    }

    pub fn respond(
        &self,
        caller: &CallerContext,
        loi_id: &LoiId,
        decision: LoiDecision,
    ) -> Result<LoiOutcome, LifecycleError> {
        match decision.action {
            LoiAction::Approve => self.approve(caller, loi_id).map(LoiOutcome::Signed),
            LoiAction::Reject => self
                .reject(caller, loi_id, decision.reason)
                .map(LoiOutcome::Rejected),
        }
    }

    /// Seller signs the offer and the transaction is opened.
    ///
    /// Safe to retry: a transaction already opened from this offer is reused. A deal opened from
    /// another offer by the same buyer is a conflict.
    pub fn approve(
        &self,
        caller: &CallerContext,
        loi_id: &LoiId,
    ) -> Result<LoiApproval, LifecycleError> {
        let mut loi = self.fetch(loi_id)?;
        self.require_seller(caller, &loi)?;
        if loi.status != LoiStatus::Proposed {
            return Err(LifecycleError::invalid_state(loi.status.label(), "proposed"));
        }

        let listing = self.listing(&loi.listing_id)?;
        let now = self.clock.now();
        let draft = transactions::generate(&self.blueprint, &loi, &listing, now);

        let expected_version = loi.version;
        loi.status = LoiStatus::Signed;
        loi.signed_at = Some(now);
        let (transaction, created) =
            match self.store.sign_and_open(loi.clone(), expected_version, draft) {
                Ok(opened) => opened,
                Err(RepositoryError::Conflict) => {
                    warn!(loi = %loi.id, listing = %loi.listing_id, "deal already open for these parties");
                    return Err(LifecycleError::Conflict(ConflictKind::DealExists));
                }
                Err(err) => return Err(stale_as_conflict(err)),
            };
        info!(loi = %loi.id, transaction = %transaction.transaction.id, created, "loi signed");

        if created {
            for channel in [NotificationChannel::Email, NotificationChannel::InApp] {
                dispatch(
                    self.notifier.as_ref(),
                    Notification::new(loi.buyer_id.clone(), channel, "loi_signed")
                        .with_detail("loi_id", &loi.id)
                        .with_detail("transaction_id", &transaction.transaction.id),
                );
            }
        }

        Ok(LoiApproval {
            loi: loi.into(),
            transaction,
        })
    }

    pub fn reject(
        &self,
        caller: &CallerContext,
        loi_id: &LoiId,
        reason: Option<String>,
    ) -> Result<LoiView, LifecycleError> {
        let mut loi = self.fetch(loi_id)?;
        self.require_seller(caller, &loi)?;
        if loi.status != LoiStatus::Proposed {
            return Err(LifecycleError::invalid_state(loi.status.label(), "proposed"));
        }

        let now = self.clock.now();
        let expected_version = loi.version;
        loi.status = LoiStatus::Rejected;
        loi.rejected_at = Some(now);
        loi.rejection_reason = Some(
            reason
                .map(|reason| reason.trim().to_string())
                .filter(|reason| !reason.is_empty())
                .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string()),
        );
        self.store
            .update_loi_if(loi.clone(), LoiStatus::Proposed, expected_version)
            .map_err(stale_as_conflict)?;
        info!(loi = %loi.id, "loi rejected");

        dispatch(
            self.notifier.as_ref(),
            Notification::new(loi.buyer_id.clone(), NotificationChannel::Email, "loi_rejected")
                .with_detail("loi_id", &loi.id),
        );

        Ok(loi.into())
    }

    /// Either party records a change, optionally replacing the terms. Status is unchanged.
    pub fn revise(
        &self,
        caller: &CallerContext,
        loi_id: &LoiId,
        request: LoiRevisionRequest,
    ) -> Result<LoiView, LifecycleError> {
        let mut loi = self.fetch(loi_id)?;
        let side = loi.side_of(&caller.actor_id).ok_or_else(|| {
            LifecycleError::unauthorized("only the buyer and seller may revise this offer")
        })?;
        if !loi.is_open() {
            return Err(LifecycleError::invalid_state(loi.status.label(), "proposed"));
        }

        let description = request.change_description.trim().to_string();
        let mut invalid = Vec::new();
        if description.is_empty() {
            invalid.push("change_description");
        }
        if let Some(terms) = &request.terms {
            invalid.extend(terms.invalid_fields());
        }
        if !invalid.is_empty() {
            return Err(LifecycleError::validation(invalid));
        }

        let now = self.clock.now();
        let expected_version = loi.version;
        loi.version += 1;
        loi.revisions.push(LoiRevision {
            version: loi.version,
            author_id: caller.actor_id.clone(),
            author_role: side,
            change_description: description,
            created_at: now,
        });
        if let Some(terms) = request.terms {
            loi.terms = terms;
        }

        self.store
            .update_loi_if(loi.clone(), loi.status, expected_version)
            .map_err(stale_as_conflict)?;
        info!(loi = %loi.id, version = loi.version, "loi revised");

        let counterpart = match side {
            DealSide::Buyer => loi.seller_id.clone(),
            DealSide::Seller => loi.buyer_id.clone(),
        };
        dispatch(
            self.notifier.as_ref(),
            Notification::new(counterpart, NotificationChannel::InApp, "loi_revised")
                .with_detail("loi_id", &loi.id)
                .with_detail("version", loi.version),
        );

        Ok(loi.into())
    }

    pub fn get(&self, caller: &CallerContext, loi_id: &LoiId) -> Result<LoiView, LifecycleError> {
        let loi = self.fetch(loi_id)?;
        if loi.side_of(&caller.actor_id).is_none() {
            return Err(LifecycleError::unauthorized(
                "only the buyer and seller may read this offer",
            ));
        }
        Ok(loi.into())
    }

    pub fn for_party(&self, caller: &CallerContext) -> Result<Vec<LoiView>, LifecycleError> {
        let mut lois = self.store.lois_for_party(&caller.actor_id)?;
        lois.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(lois.into_iter().map(LoiView::from).collect())
    }

    fn require_seller(&self, caller: &CallerContext, loi: &Loi) -> Result<(), LifecycleError> {
        if caller.is(&loi.seller_id) {
            Ok(())
        } else {
            Err(LifecycleError::unauthorized(
                "only the listing owner may decide on this offer",
            ))
        }
    }

    fn fetch(&self, loi_id: &LoiId) -> Result<Loi, LifecycleError> {
        self.store
            .fetch_loi(loi_id)?
            .ok_or_else(|| LifecycleError::not_found(EntityKind::Loi, loi_id))
    }

    fn listing(&self, listing_id: &ListingId) -> Result<Listing, LifecycleError> {
        self.store
            .fetch_listing(listing_id)?
            .ok_or_else(|| LifecycleError::not_found(EntityKind::Listing, listing_id))
    }
}
