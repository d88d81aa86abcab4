use super::domain::{BuyerProfile, Listing, ListingStatus};
use crate::workflows::ids::{ListingId, PartyId};
use crate::workflows::repository::RepositoryError;

/// Storage port for listings.
pub trait ListingRepository: Send + Sync {
    fn insert_listing(&self, listing: Listing) -> Result<Listing, RepositoryError>;
    fn update_listing(&self, listing: Listing) -> Result<(), RepositoryError>;
    fn fetch_listing(&self, id: &ListingId) -> Result<Option<Listing>, RepositoryError>;
    /// All listings, optionally restricted to one status.
    fn list_listings(&self, status: Option<ListingStatus>) -> Result<Vec<Listing>, RepositoryError>;
}

/// Storage port for buyer profiles, keyed by buyer.
pub trait BuyerProfileRepository: Send + Sync {
    fn upsert_profile(&self, profile: BuyerProfile) -> Result<BuyerProfile, RepositoryError>;
    fn profile_for(&self, buyer: &PartyId) -> Result<Option<BuyerProfile>, RepositoryError>;
    fn all_profiles(&self) -> Result<Vec<BuyerProfile>, RepositoryError>;
}
