use chrono::{DateTime, Utc};

use super::domain::{NdaRequest, NdaStatus};
use crate::workflows::ids::{ListingId, NdaRequestId, PartyId};
use crate::workflows::repository::RepositoryError;

/// Storage port for confidentiality requests.
pub trait NdaRepository: Send + Sync {
    /// Insert unless a blocking request already exists for the same (listing, buyer).
    /// The check and the insert are one atomic step; a clash yields `RepositoryError::Conflict`.
    fn insert_request(
        &self,
        request: NdaRequest,
        now: DateTime<Utc>,
    ) -> Result<NdaRequest, RepositoryError>;

    /// Replace the stored request iff its stored status still equals `expected`.
    fn transition_request(
        &self,
        request: NdaRequest,
        expected: NdaStatus,
    ) -> Result<(), RepositoryError>;

    fn fetch_request(&self, id: &NdaRequestId) -> Result<Option<NdaRequest>, RepositoryError>;

    fn requests_for_listing(&self, listing: &ListingId)
        -> Result<Vec<NdaRequest>, RepositoryError>;

    /// Requests where the party is either buyer or seller.
    fn requests_for_party(&self, party: &PartyId) -> Result<Vec<NdaRequest>, RepositoryError>;
}
