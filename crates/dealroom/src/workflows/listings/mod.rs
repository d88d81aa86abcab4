//! Listing read paths, the visibility gate, and buyer/listing compatibility scoring.

pub mod domain;
pub mod matching;
pub mod repository;
pub mod router;
pub mod service;
pub mod visibility;

#[cfg(test)]
mod tests;

pub use domain::{
    BuyerPreferences, BuyerProfile, ConfidentialDetails, Listing, ListingAction, ListingFilters,
    ListingStatus, NewListing, RegionPreference,
};
pub use matching::{MatchComponent, MatchFactor, MatchScore, Matcher, MatchingConfig};
pub use repository::{BuyerProfileRepository, ListingRepository};
pub use router::listing_router;
pub use service::ListingService;
pub use visibility::{redact, ListingAccess, PublicListing};
