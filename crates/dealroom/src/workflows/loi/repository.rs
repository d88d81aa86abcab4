use super::domain::{Loi, LoiStatus};
use crate::workflows::ids::{LoiId, PartyId};
use crate::workflows::repository::RepositoryError;
use crate::workflows::transactions::{TransactionDraft, TransactionRecord};

/// Storage port for letters of intent.
pub trait LoiRepository: Send + Sync {
    fn insert_loi(&self, loi: Loi) -> Result<Loi, RepositoryError>;

    /// Replace the stored LOI iff both its status and version still match.
    fn update_loi_if(
        &self,
        loi: Loi,
        expected_status: LoiStatus,
        expected_version: u32,
    ) -> Result<(), RepositoryError>;

    /// Store the signed `loi` and open its transaction in one step.
    ///
    /// The stored LOI must still be `Proposed` at `expected_version`, else `StaleWrite`. A
    /// transaction already opened from this same LOI is reused and reported with `false`; one
    /// opened from another LOI for the same (listing, buyer, seller) yields `Conflict`.
    fn sign_and_open(
        &self,
        loi: Loi,
        expected_version: u32,
        draft: TransactionDraft,
    ) -> Result<(TransactionRecord, bool), RepositoryError>;

    fn fetch_loi(&self, id: &LoiId) -> Result<Option<Loi>, RepositoryError>;

    /// LOIs where the party is buyer or seller.
    fn lois_for_party(&self, party: &PartyId) -> Result<Vec<Loi>, RepositoryError>;
}
