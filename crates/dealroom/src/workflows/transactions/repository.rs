use chrono::{DateTime, Utc};

use super::domain::{
    Activity, Milestone, TeamMember, Transaction, TransactionDraft, TransactionRecord,
};
use crate::workflows::ids::{ListingId, MilestoneId, PartyId, TransactionId};
use crate::workflows::repository::RepositoryError;

/// Storage port for transactions and everything they own.
pub trait TransactionRepository: Send + Sync {
    /// Persist the transaction, milestones, payments and initial activity in one atomic step.
    /// Returns `RepositoryError::Conflict` when a transaction already exists for the
    /// (listing, buyer, seller) triple.
    fn create_with_schedule(
        &self,
        draft: TransactionDraft,
    ) -> Result<TransactionRecord, RepositoryError>;

    fn find_by_parties(
        &self,
        listing: &ListingId,
        buyer: &PartyId,
        seller: &PartyId,
    ) -> Result<Option<TransactionRecord>, RepositoryError>;

    fn fetch_transaction(
        &self,
        id: &TransactionId,
    ) -> Result<Option<TransactionRecord>, RepositoryError>;

    /// Transactions where the party is buyer, seller, advisor or an accepted team member.
    fn transactions_for_party(&self, party: &PartyId) -> Result<Vec<Transaction>, RepositoryError>;

    /// Replace the transaction iff its stored `updated_at` equals `expected_updated_at`.
    fn update_transaction(
        &self,
        transaction: Transaction,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Mark a milestone complete iff it is still open; a completed one yields `StaleWrite`.
    fn complete_milestone(
        &self,
        transaction: &TransactionId,
        milestone: &MilestoneId,
        completed_at: DateTime<Utc>,
    ) -> Result<Milestone, RepositoryError>;

    fn append_activity(&self, activity: Activity) -> Result<(), RepositoryError>;

    fn activities(&self, transaction: &TransactionId) -> Result<Vec<Activity>, RepositoryError>;

    fn upsert_team_member(&self, member: TeamMember) -> Result<TeamMember, RepositoryError>;

    fn team_members(&self, transaction: &TransactionId)
        -> Result<Vec<TeamMember>, RepositoryError>;
}
