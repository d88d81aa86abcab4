use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::ids::{ListingId, NdaRequestId, PartyId};
use crate::workflows::listings::{BuyerProfile, RegionPreference};

/// Stored status of a confidentiality request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NdaStatus {
    Pending,
    Approved,
    Rejected,
    Signed,
    Expired,
}

impl NdaStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Signed => "signed",
            Self::Expired => "expired",
        }
    }

    pub const fn unlocks_disclosure(self) -> bool {
        matches!(self, Self::Approved | Self::Signed)
    }
}

/// Buyer preferences frozen at request time so the seller reviews what the buyer looked like then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerProfileSnapshot {
    pub version: u16,
    pub has_profile: bool,
    pub preferred_regions: RegionPreference,
    pub preferred_industries: Vec<String>,
    pub price_min: Option<u64>,
    pub price_max: Option<u64>,
    pub revenue_min: Option<u64>,
    pub revenue_max: Option<u64>,
    pub captured_at: DateTime<Utc>,
}

impl BuyerProfileSnapshot {
    pub const VERSION: u16 = 1;

    pub fn capture(profile: Option<&BuyerProfile>, now: DateTime<Utc>) -> Self {
        let preferences = profile
            .map(|profile| profile.preferences.clone())
            .unwrap_or_default();
        Self {
            version: Self::VERSION,
            has_profile: profile.is_some(),
            preferred_regions: preferences.preferred_regions,
            preferred_industries: preferences.preferred_industries,
            price_min: preferences.price_min,
            price_max: preferences.price_max,
            revenue_min: preferences.revenue_min,
            revenue_max: preferences.revenue_max,
            captured_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NdaRequest {
    pub id: NdaRequestId,
    pub listing_id: ListingId,
    pub buyer_id: PartyId,
    pub seller_id: PartyId,
    pub message: Option<String>,
    pub profile_snapshot: BuyerProfileSnapshot,
    pub status: NdaStatus,
    pub created_at: DateTime<Utc>,
    pub viewed_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub signed_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl NdaRequest {
    /// Pending requests past their expiry read as expired; storage is never rewritten for it.
    pub fn effective_status(&self, now: DateTime<Utc>) -> NdaStatus {
        if self.status == NdaStatus::Pending && now >= self.expires_at {
            NdaStatus::Expired
        } else {
            self.status
        }
    }

    /// Copy with the effective status applied, for read paths.
    pub fn as_of(&self, now: DateTime<Utc>) -> Self {
        Self {
            status: self.effective_status(now),
            ..self.clone()
        }
    }

    /// Whether this request prevents the buyer from opening another one for the same listing.
    ///
    /// `Signed` blocks as well as `Pending` and `Approved`: a signed agreement stays in force, so a
    /// second request for the same pair has nothing left to unlock.
    pub fn is_blocking(&self, now: DateTime<Utc>) -> bool {
        matches!(
            self.effective_status(now),
            NdaStatus::Pending | NdaStatus::Approved | NdaStatus::Signed
        )
    }

    pub fn unlocks_disclosure(&self) -> bool {
        self.status.unlocks_disclosure()
    }

    pub fn involves(&self, party: &PartyId) -> bool {
        &self.buyer_id == party || &self.seller_id == party
    }

    fn links(&self, a: &PartyId, b: &PartyId) -> bool {
        (&self.buyer_id == a && &self.seller_id == b) || (&self.buyer_id == b && &self.seller_id == a)
    }
}

/// Buyer supplied payload when asking for disclosure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNdaRequest {
    #[serde(default)]
    pub message: Option<String>,
}

/// Requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NdaTransition {
    Approved,
    Rejected,
    Signed,
}

/// Seller decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NdaDecision {
    Approve,
    Reject,
}

/// True iff an approved or signed request for `listing` links `a` and `b`, in either role.
pub fn disclosure_unlocked(
    requests: &[NdaRequest],
    listing: &ListingId,
    a: &PartyId,
    b: &PartyId,
) -> bool {
    requests
        .iter()
        .any(|request| &request.listing_id == listing && request.unlocks_disclosure() && request.links(a, b))
}

/// Listings whose confidential details `buyer` may read.
pub fn unlocked_listings(requests: &[NdaRequest], buyer: &PartyId) -> HashSet<ListingId> {
    requests
        .iter()
        .filter(|request| &request.buyer_id == buyer && request.unlocks_disclosure())
        .map(|request| request.listing_id.clone())
        .collect()
}
