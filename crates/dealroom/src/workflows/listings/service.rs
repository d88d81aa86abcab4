use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info};

use super::domain::{
    BuyerPreferences, BuyerProfile, Listing, ListingAction, ListingFilters, ListingStatus,
    NewListing,
};
use super::matching::Matcher;
use super::repository::{BuyerProfileRepository, ListingRepository};
use super::visibility::{redact, ListingAccess, PublicListing};
use crate::config::LifecycleConfig;
use crate::workflows::clock::{Clock, SystemClock};
use crate::workflows::error::{EntityKind, LifecycleError};
use crate::workflows::identity::CallerContext;
use crate::workflows::ids::ListingId;
use crate::workflows::nda::{self, NdaRepository};
use crate::workflows::notify::{dispatch, Notification, NotificationChannel, Notifier};

/// Service composing the listing store, the visibility gate, and the matcher.
pub struct ListingService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    matcher: Matcher,
    listing_validity: Duration,
    clock: Arc<dyn Clock>,
}

impl<S, N> ListingService<S, N>
where
    S: ListingRepository + BuyerProfileRepository + NdaRepository + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: &LifecycleConfig) -> Self {
        Self {
            store,
            notifier,
            matcher: Matcher::new(config.matching),
            listing_validity: Duration::days(config.listing_validity_days),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Create a listing owned by the caller, optionally publishing it immediately.
    pub fn create(
        &self,
        caller: &CallerContext,
        payload: NewListing,
    ) -> Result<Listing, LifecycleError> {
        let missing = payload.missing_fields();
        if !missing.is_empty() {
            return Err(LifecycleError::validation(missing));
        }

        let now = self.clock.now();
        let (status, published_at, expires_at) = if payload.publish {
            (
                ListingStatus::Active,
                Some(now),
                Some(now + self.listing_validity),
            )
        } else {
            (ListingStatus::Draft, None, None)
        };

        let listing = Listing {
            id: ListingId::next(),
            owner_id: caller.actor_id.clone(),
            confidential: payload.confidential,
            anonymized_title: trimmed(payload.anonymized_title),
            business_type: trimmed(payload.business_type),
            region: trimmed(payload.region),
            industry: trimmed(payload.industry),
            revenue_band: trimmed(payload.revenue_band),
            description: payload.description.unwrap_or_default().trim().to_string(),
            price_min: payload.price_min,
            price_max: payload.price_max,
            revenue: payload.revenue,
            ebitda: payload.ebitda,
            employees: payload.employees,
            status,
            created_at: now,
            published_at,
            expires_at,
        };

        let stored = self.store.insert_listing(listing)?;
        info!(listing = %stored.id, owner = %stored.owner_id, status = stored.status.label(), "listing created");
        Ok(stored)
    }

    /// Apply an owner-only status change.
    pub fn change_status(
        &self,
        caller: &CallerContext,
        listing_id: &ListingId,
        action: ListingAction,
    ) -> Result<Listing, LifecycleError> {
        let mut listing = self.fetch(listing_id)?;
        if !caller.is(&listing.owner_id) {
            return Err(LifecycleError::unauthorized(
                "only the listing owner may change its status",
            ));
        }

        let next = action
            .apply(listing.status)
            .ok_or_else(|| LifecycleError::invalid_state(listing.status.label(), action.expected()))?;

        let now = self.clock.now();
        if next == ListingStatus::Active && listing.published_at.is_none() {
            listing.published_at = Some(now);
        }
        if next == ListingStatus::Active
            && listing.expires_at.map(|expiry| expiry <= now).unwrap_or(true)
        {
            listing.expires_at = Some(now + self.listing_validity);
        }
        listing.status = next;

        self.store.update_listing(listing.clone())?;
        info!(listing = %listing.id, status = next.label(), "listing status changed");
        Ok(listing)
    }

    /// Fetch one listing through the visibility gate. Non-owners only see live listings.
    pub fn get(
        &self,
        viewer: Option<&CallerContext>,
        listing_id: &ListingId,
    ) -> Result<PublicListing, LifecycleError> {
        let listing = self.fetch(listing_id)?;
        let access = self.access_for(viewer, &listing)?;
        if access != ListingAccess::Owner && !listing.is_live(self.clock.now()) {
            return Err(LifecycleError::not_found(EntityKind::Listing, listing_id));
        }

        let mut view = redact(&listing, access);
        if let Some(profile) = self.profile_of(viewer)? {
            if access != ListingAccess::Owner {
                view.match_score = self.matcher.visible_score(&listing, &profile);
            }
        }
        Ok(view)
    }

    /// Search listings. Buyers with a profile get visible match scores and ranked results.
    pub fn list(
        &self,
        filters: &ListingFilters,
        viewer: Option<&CallerContext>,
    ) -> Result<Vec<PublicListing>, LifecycleError> {
        let now = self.clock.now();
        let status = filters.status.unwrap_or(ListingStatus::Active);
        let unlocked = self.unlocked_for(viewer)?;
        let profile = self.profile_of(viewer)?;

        let mut ranked: Vec<(u8, PublicListing)> = self
            .store
            .list_listings(Some(status))?
            .into_iter()
            .filter(|listing| filters.matches(listing))
            .filter(|listing| {
                // Anything but live listings is only ever shown to its owner.
                let owned = viewer.map(|caller| caller.is(&listing.owner_id)).unwrap_or(false);
                owned || listing.is_live(now)
            })
            .map(|listing| {
                let access = resolve_access(viewer, &listing, &unlocked);
                let mut view = redact(&listing, access);
                let mut rank = 0;
                if let Some(profile) = profile.as_ref().filter(|_| access != ListingAccess::Owner) {
                    let score = self.matcher.score(&listing, profile);
                    rank = score.total;
                    view.match_score = score
                        .exceeds(self.matcher.config().visibility_threshold)
                        .then_some(score.total);
                }
                (rank, view)
            })
            .collect();

        if profile.is_some() {
            ranked.sort_by(|a, b| b.0.cmp(&a.0));
        }

        Ok(ranked.into_iter().map(|(_, view)| view).collect())
    }

    /// Buyer-facing match view: live listings scoring above the visibility threshold.
    pub fn matches_for(
        &self,
        caller: &CallerContext,
    ) -> Result<Vec<PublicListing>, LifecycleError> {
        let profile = self
            .store
            .profile_for(&caller.actor_id)?
            .ok_or_else(|| LifecycleError::not_found(EntityKind::BuyerProfile, &caller.actor_id))?;
        let filters = ListingFilters::default();
        Ok(self
            .list(&filters, Some(caller))?
            .into_iter()
            .filter(|view| view.match_score.is_some())
            .inspect(|view| debug!(listing = %view.id, buyer = %profile.buyer_id, "match surfaced"))
            .collect())
    }

    pub fn save_profile(
        &self,
        caller: &CallerContext,
        preferences: BuyerPreferences,
    ) -> Result<BuyerProfile, LifecycleError> {
        let mut invalid = Vec::new();
        if let (Some(min), Some(max)) = (preferences.price_min, preferences.price_max) {
            if min > max {
                invalid.push("price_max");
            }
        }
        if let (Some(min), Some(max)) = (preferences.revenue_min, preferences.revenue_max) {
            if min > max {
                invalid.push("revenue_max");
            }
        }
        if !invalid.is_empty() {
            return Err(LifecycleError::validation(invalid));
        }

        let profile = BuyerProfile {
            buyer_id: caller.actor_id.clone(),
            preferences,
            updated_at: self.clock.now(),
        };
        Ok(self.store.upsert_profile(profile)?)
    }

    pub fn profile(&self, caller: &CallerContext) -> Result<BuyerProfile, LifecycleError> {
        self.store
            .profile_for(&caller.actor_id)?
            .ok_or_else(|| LifecycleError::not_found(EntityKind::BuyerProfile, &caller.actor_id))
    }

    /// Fan a newly published listing out to every buyer whose profile clears the notification
    /// threshold. Returns the number of buyers notified.
    pub fn notify_matching_buyers(&self, listing_id: &ListingId) -> Result<usize, LifecycleError> {
        let listing = self.fetch(listing_id)?;
        if !listing.is_live(self.clock.now()) {
            return Ok(0);
        }

        let title = redact(&listing, ListingAccess::Public).title;
        let mut notified = 0;
        for profile in self.store.all_profiles()? {
            if profile.buyer_id == listing.owner_id {
                continue;
            }
            let score = self.matcher.score(&listing, &profile);
            if !score.exceeds(self.matcher.config().notification_threshold) {
                continue;
            }
            dispatch(
                self.notifier.as_ref(),
                Notification::new(
                    profile.buyer_id.clone(),
                    NotificationChannel::InApp,
                    "listing_match",
                )
                .with_detail("listing_id", &listing.id)
                .with_detail("title", &title)
                .with_detail("score", score.total),
            );
            notified += 1;
        }

        info!(listing = %listing.id, notified, "match notifications dispatched");
        Ok(notified)
    }

    fn fetch(&self, listing_id: &ListingId) -> Result<Listing, LifecycleError> {
        self.store
            .fetch_listing(listing_id)?
            .ok_or_else(|| LifecycleError::not_found(EntityKind::Listing, listing_id))
    }

    fn access_for(
        &self,
        viewer: Option<&CallerContext>,
        listing: &Listing,
    ) -> Result<ListingAccess, LifecycleError> {
        let unlocked = self.unlocked_for(viewer)?;
        Ok(resolve_access(viewer, listing, &unlocked))
    }

    fn unlocked_for(
        &self,
        viewer: Option<&CallerContext>,
    ) -> Result<HashSet<ListingId>, LifecycleError> {
        match viewer {
            Some(caller) => {
                let requests = self.store.requests_for_party(&caller.actor_id)?;
                Ok(nda::unlocked_listings(&requests, &caller.actor_id))
            }
            None => Ok(HashSet::new()),
        }
    }

    fn profile_of(
        &self,
        viewer: Option<&CallerContext>,
    ) -> Result<Option<BuyerProfile>, LifecycleError> {
        match viewer {
            Some(caller) => Ok(self.store.profile_for(&caller.actor_id)?),
            None => Ok(None),
        }
    }
}

fn resolve_access(
    viewer: Option<&CallerContext>,
    listing: &Listing,
    unlocked: &HashSet<ListingId>,
) -> ListingAccess {
    match viewer {
        Some(caller) if caller.is(&listing.owner_id) => ListingAccess::Owner,
        Some(_) if unlocked.contains(&listing.id) => ListingAccess::Confidant,
        _ => ListingAccess::Public,
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
