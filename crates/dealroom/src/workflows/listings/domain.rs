use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::ids::{ListingId, PartyId};

/// Lifecycle status of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Draft,
    Active,
    Paused,
    Sold,
    Archived,
}

impl ListingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Sold => "sold",
            Self::Archived => "archived",
        }
    }
}

/// Identity of the business behind a listing. Never leaves the system for anonymous viewers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidentialDetails {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub registry_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub owner_id: PartyId,
    pub confidential: ConfidentialDetails,
    pub anonymized_title: Option<String>,
    pub business_type: Option<String>,
    pub region: Option<String>,
    pub industry: Option<String>,
    pub revenue_band: Option<String>,
    pub description: String,
    pub price_min: Option<u64>,
    pub price_max: Option<u64>,
    pub revenue: Option<u64>,
    pub ebitda: Option<i64>,
    pub employees: Option<u32>,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Listing {
    /// Midpoint of the asking price range; a single bound stands in for the range.
    pub fn price_midpoint(&self) -> Option<u64> {
        match (self.price_min, self.price_max) {
            (Some(min), Some(max)) => Some(min / 2 + max / 2 + (min % 2 + max % 2) / 2),
            (Some(price), None) | (None, Some(price)) => Some(price),
            (None, None) => None,
        }
    }

    pub fn lower_price(&self) -> Option<u64> {
        self.price_min.or(self.price_max)
    }

    pub fn upper_price(&self) -> Option<u64> {
        self.price_max.or(self.price_min)
    }

    /// Active and not past its expiry.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.status == ListingStatus::Active
            && self.expires_at.map(|expiry| expiry > now).unwrap_or(true)
    }
}

/// Seller supplied payload for a new listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewListing {
    #[serde(default)]
    pub confidential: ConfidentialDetails,
    #[serde(default)]
    pub anonymized_title: Option<String>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub revenue_band: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price_min: Option<u64>,
    #[serde(default)]
    pub price_max: Option<u64>,
    #[serde(default)]
    pub revenue: Option<u64>,
    #[serde(default)]
    pub ebitda: Option<i64>,
    #[serde(default)]
    pub employees: Option<u32>,
    #[serde(default)]
    pub publish: bool,
}

impl NewListing {
    /// Required inputs: a title or the type and region to derive one, plus industry, region and
    /// description.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let has_title = non_blank(&self.anonymized_title);
        if !has_title && !non_blank(&self.business_type) {
            missing.push("anonymized_title");
        }
        if !non_blank(&self.industry) {
            missing.push("industry");
        }
        if !non_blank(&self.region) {
            missing.push("region");
        }
        if !non_blank(&self.description) {
            missing.push("description");
        }
        if let (Some(min), Some(max)) = (self.price_min, self.price_max) {
            if min > max {
                missing.push("price_max");
            }
        }
        missing
    }
}

fn non_blank(value: &Option<String>) -> bool {
    value
        .as_deref()
        .map(|value| !value.trim().is_empty())
        .unwrap_or(false)
}

/// Regions a buyer is willing to consider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionPreference {
    All,
    Only(Vec<String>),
}

impl Default for RegionPreference {
    fn default() -> Self {
        Self::Only(Vec::new())
    }
}

impl RegionPreference {
    pub fn accepts(&self, region: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Only(regions) => match region {
                Some(region) => regions.iter().any(|preferred| same_label(preferred, region)),
                None => false,
            },
        }
    }
}

pub(crate) fn same_label(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

/// Buyer supplied preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerPreferences {
    #[serde(default)]
    pub preferred_regions: RegionPreference,
    #[serde(default)]
    pub preferred_industries: Vec<String>,
    #[serde(default)]
    pub price_min: Option<u64>,
    #[serde(default)]
    pub price_max: Option<u64>,
    #[serde(default)]
    pub revenue_min: Option<u64>,
    #[serde(default)]
    pub revenue_max: Option<u64>,
}

/// Stored buyer profile; one per buyer, mutated only by its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerProfile {
    pub buyer_id: PartyId,
    pub preferences: BuyerPreferences,
    pub updated_at: DateTime<Utc>,
}

/// Search filters accepted by the listing read paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingFilters {
    #[serde(default)]
    pub status: Option<ListingStatus>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub min_price: Option<u64>,
    #[serde(default)]
    pub max_price: Option<u64>,
}

impl ListingFilters {
    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(status) = self.status {
            if listing.status != status {
                return false;
            }
        }

        if let Some(industry) = self.industry.as_deref().filter(|value| !value.trim().is_empty()) {
            match listing.industry.as_deref() {
                Some(candidate) if same_label(candidate, industry) => {}
                _ => return false,
            }
        }

        if let Some(location) = self.location.as_deref().filter(|value| !value.trim().is_empty()) {
            let needle = location.trim().to_lowercase();
            match listing.region.as_deref() {
                Some(region) if region.to_lowercase().contains(&needle) => {}
                _ => return false,
            }
        }

        if let Some(min_price) = self.min_price {
            match listing.upper_price() {
                Some(upper) if upper >= min_price => {}
                _ => return false,
            }
        }

        if let Some(max_price) = self.max_price {
            match listing.lower_price() {
                Some(lower) if lower <= max_price => {}
                _ => return false,
            }
        }

        true
    }
}

/// Owner driven status changes after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingAction {
    Publish,
    Pause,
    MarkSold,
    Archive,
}

impl ListingAction {
    /// Target status, or `None` when the move is not allowed from `current`.
    pub fn apply(self, current: ListingStatus) -> Option<ListingStatus> {
        use ListingStatus::*;
        match (self, current) {
            (Self::Publish, Draft | Paused) => Some(Active),
            (Self::Pause, Active) => Some(Paused),
            (Self::MarkSold, Active | Paused) => Some(Sold),
            (Self::Archive, Draft | Active | Paused | Sold) => Some(Archived),
            _ => None,
        }
    }

    pub const fn expected(self) -> &'static str {
        match self {
            Self::Publish => "draft or paused",
            Self::Pause => "active",
            Self::MarkSold => "active or paused",
            Self::Archive => "not archived",
        }
    }
}
