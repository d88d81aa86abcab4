use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Listing, ListingStatus};
use crate::workflows::ids::ListingId;

/// Relationship of a viewer to a listing, resolved from stored records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingAccess {
    Owner,
    /// Holds an approved or signed NDA for the listing.
    Confidant,
    Public,
}

impl ListingAccess {
    pub const fn sees_confidential(self) -> bool {
        matches!(self, Self::Owner | Self::Confidant)
    }
}

/// Listing as returned by every read path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicListing {
    pub id: ListingId,
    pub title: String,
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
    pub published_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub access: ListingAccess,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_score: Option<u8>,
}

const TYPE_LABELS: &[(&str, &str)] = &[
    ("it_consulting", "IT-konsultbolag"),
    ("saas", "SaaS-bolag"),
    ("ecommerce", "E-handelsföretag"),
    ("retail", "Detaljhandel"),
    ("restaurant", "Restaurang"),
    ("cafe", "Café"),
    ("manufacturing", "Tillverkningsföretag"),
    ("construction", "Byggföretag"),
    ("wholesale", "Grossistföretag"),
    ("transport", "Transportföretag"),
    ("healthcare", "Vårdföretag"),
    ("services", "Tjänsteföretag"),
    ("real_estate", "Fastighetsbolag"),
];

const GENERIC_TYPE_LABEL: &str = "Företag";
const DEFAULT_REGION: &str = "Sverige";

pub fn type_label(code: Option<&str>) -> &'static str {
    let Some(code) = code.map(str::trim) else {
        return GENERIC_TYPE_LABEL;
    };
    TYPE_LABELS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(code))
        .map(|(_, label)| *label)
        .unwrap_or(GENERIC_TYPE_LABEL)
}

/// Authored title, or `"<TypeLabel> i <Region>"` when the seller left it blank.
pub fn display_title(listing: &Listing) -> String {
    match listing
        .anonymized_title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())
    {
        Some(title) => title.to_string(),
        None => {
            let region = listing
                .region
                .as_deref()
                .map(str::trim)
                .filter(|region| !region.is_empty())
                .unwrap_or(DEFAULT_REGION);
            format!(
                "{} i {}",
                type_label(listing.business_type.as_deref()),
                region
            )
        }
    }
}

/// Strip confidential attributes unless the viewer is entitled to them.
pub fn redact(listing: &Listing, access: ListingAccess) -> PublicListing {
    let confidential = if access.sees_confidential() {
        listing.confidential.clone()
    } else {
        Default::default()
    };

    PublicListing {
        id: listing.id.clone(),
        title: display_title(listing),
        business_type: listing.business_type.clone(),
        region: listing.region.clone(),
        industry: listing.industry.clone(),
        revenue_band: listing.revenue_band.clone(),
        description: listing.description.clone(),
        price_min: listing.price_min,
        price_max: listing.price_max,
        revenue: listing.revenue,
        ebitda: listing.ebitda,
        employees: listing.employees,
        status: listing.status,
        published_at: listing.published_at,
        expires_at: listing.expires_at,
        access,
        company_name: confidential.company_name,
        registry_number: confidential.registry_number,
        address: confidential.address,
        website: confidential.website,
        match_score: None,
    }
}
