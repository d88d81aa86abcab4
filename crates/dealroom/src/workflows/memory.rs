//! Process-local reference adapters for every storage port.
//!
//! One mutex guards the whole state so uniqueness checks, compare-and-set updates and the
//! transaction schedule insert each happen as a single step.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::documents::{
    AccessAuditLog, AccessLogEntry, BlobStore, BlobStoreError, Document, DocumentRepository,
    StorageRef,
};
use super::ids::{DocumentId, ListingId, LoiId, MilestoneId, NdaRequestId, PartyId, TransactionId};
use super::listings::{
    BuyerProfile, BuyerProfileRepository, Listing, ListingRepository, ListingStatus,
};
use super::loi::{Loi, LoiRepository, LoiStatus};
use super::messaging::{Message, MessageRepository};
use super::nda::{NdaRepository, NdaRequest, NdaStatus};
use super::notify::{Notification, Notifier, NotifyError};
use super::repository::RepositoryError;
use super::transactions::{
    Activity, Milestone, TeamMember, TeamMemberStatus, Transaction, TransactionDraft,
    TransactionRecord, TransactionRepository,
};

#[derive(Default)]
struct StoreState {
    listings: BTreeMap<ListingId, Listing>,
    profiles: HashMap<PartyId, BuyerProfile>,
    nda_requests: BTreeMap<NdaRequestId, NdaRequest>,
    lois: BTreeMap<LoiId, Loi>,
    transactions: BTreeMap<TransactionId, TransactionRecord>,
    activities: Vec<Activity>,
    team: Vec<TeamMember>,
    documents: BTreeMap<DocumentId, Document>,
    access_log: Vec<AccessLogEntry>,
    messages: Vec<Message>,
}

/// In-memory store implementing every lifecycle repository.
#[derive(Default, Clone)]
pub struct InMemoryDealStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryDealStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().expect("repository mutex poisoned")
    }
}

impl ListingRepository for InMemoryDealStore {
    fn insert_listing(&self, listing: Listing) -> Result<Listing, RepositoryError> {
        let mut guard = self.lock();
        if guard.listings.contains_key(&listing.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.listings.insert(listing.id.clone(), listing.clone());
        Ok(listing)
    }

    fn update_listing(&self, listing: Listing) -> Result<(), RepositoryError> {
        let mut guard = self.lock();
        match guard.listings.get_mut(&listing.id) {
            Some(existing) => {
                *existing = listing;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_listing(&self, id: &ListingId) -> Result<Option<Listing>, RepositoryError> {
        Ok(self.lock().listings.get(id).cloned())
    }

    fn list_listings(&self, status: Option<ListingStatus>) -> Result<Vec<Listing>, RepositoryError> {
        Ok(self
            .lock()
            .listings
            .values()
            .filter(|listing| status.map_or(true, |status| listing.status == status))
            .cloned()
            .collect())
    }
}

impl BuyerProfileRepository for InMemoryDealStore {
    fn upsert_profile(&self, profile: BuyerProfile) -> Result<BuyerProfile, RepositoryError> {
        self.lock()
            .profiles
            .insert(profile.buyer_id.clone(), profile.clone());
        Ok(profile)
    }

    fn profile_for(&self, buyer: &PartyId) -> Result<Option<BuyerProfile>, RepositoryError> {
        Ok(self.lock().profiles.get(buyer).cloned())
    }

    fn all_profiles(&self) -> Result<Vec<BuyerProfile>, RepositoryError> {
        let mut profiles: Vec<BuyerProfile> = self.lock().profiles.values().cloned().collect();
        profiles.sort_by(|a, b| a.buyer_id.cmp(&b.buyer_id));
        Ok(profiles)
    }
}

impl NdaRepository for InMemoryDealStore {
    fn insert_request(
        &self,
        request: NdaRequest,
        now: DateTime<Utc>,
    ) -> Result<NdaRequest, RepositoryError> {
        let mut guard = self.lock();
        let blocked = guard.nda_requests.values().any(|existing| {
            existing.listing_id == request.listing_id
                && existing.buyer_id == request.buyer_id
                && existing.is_blocking(now)
        });
        if blocked || guard.nda_requests.contains_key(&request.id) {
            return Err(RepositoryError::Conflict);
        }
        guard
            .nda_requests
            .insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn transition_request(
        &self,
        request: NdaRequest,
        expected: NdaStatus,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.lock();
        let existing = guard
            .nda_requests
            .get_mut(&request.id)
            .ok_or(RepositoryError::NotFound)?;
        if existing.status != expected {
            return Err(RepositoryError::StaleWrite);
        }
        *existing = request;
        Ok(())
    }

    fn fetch_request(&self, id: &NdaRequestId) -> Result<Option<NdaRequest>, RepositoryError> {
        Ok(self.lock().nda_requests.get(id).cloned())
    }

    fn requests_for_listing(
        &self,
        listing: &ListingId,
    ) -> Result<Vec<NdaRequest>, RepositoryError> {
        Ok(self
            .lock()
            .nda_requests
            .values()
            .filter(|request| &request.listing_id == listing)
            .cloned()
            .collect())
    }

    fn requests_for_party(&self, party: &PartyId) -> Result<Vec<NdaRequest>, RepositoryError> {
        Ok(self
            .lock()
            .nda_requests
            .values()
            .filter(|request| request.involves(party))
            .cloned()
            .collect())
    }
}

impl LoiRepository for InMemoryDealStore {
    fn insert_loi(&self, loi: Loi) -> Result<Loi, RepositoryError> {
        let mut guard = self.lock();
        if guard.lois.contains_key(&loi.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.lois.insert(loi.id.clone(), loi.clone());
        Ok(loi)
    }

    fn update_loi_if(
        &self,
        loi: Loi,
        expected_status: LoiStatus,
        expected_version: u32,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.lock();
        let existing = guard.lois.get_mut(&loi.id).ok_or(RepositoryError::NotFound)?;
        if existing.status != expected_status || existing.version != expected_version {
            return Err(RepositoryError::StaleWrite);
        }
        *existing = loi;
        Ok(())
    }

    fn sign_and_open(
        &self,
        loi: Loi,
        expected_version: u32,
        draft: TransactionDraft,
    ) -> Result<(TransactionRecord, bool), RepositoryError> {
        let mut guard = self.lock();
        let stored = guard.lois.get(&loi.id).ok_or(RepositoryError::NotFound)?;
        if stored.status != LoiStatus::Proposed || stored.version != expected_version {
            return Err(RepositoryError::StaleWrite);
        }

        let existing = guard
            .transactions
            .values()
            .find(|record| {
                record.transaction.listing_id == loi.listing_id
                    && record.transaction.buyer_id == loi.buyer_id
                    && record.transaction.seller_id == loi.seller_id
            })
            .cloned();
        let opened = match existing {
            Some(record) if record.transaction.loi_id == loi.id => (record, false),
            Some(_) => return Err(RepositoryError::Conflict),
            None => {
                let record = draft.record();
                guard
                    .transactions
                    .insert(record.transaction.id.clone(), record.clone());
                guard.activities.push(draft.activity);
                (record, true)
            }
        };
        guard.lois.insert(loi.id.clone(), loi);
        Ok(opened)
    }

    fn fetch_loi(&self, id: &LoiId) -> Result<Option<Loi>, RepositoryError> {
        Ok(self.lock().lois.get(id).cloned())
    }

    fn lois_for_party(&self, party: &PartyId) -> Result<Vec<Loi>, RepositoryError> {
        Ok(self
            .lock()
            .lois
            .values()
            .filter(|loi| &loi.buyer_id == party || &loi.seller_id == party)
            .cloned()
            .collect())
    }
}

impl TransactionRepository for InMemoryDealStore {
    fn create_with_schedule(
        &self,
        draft: TransactionDraft,
    ) -> Result<TransactionRecord, RepositoryError> {
        let mut guard = self.lock();
        let duplicate = guard.transactions.values().any(|record| {
            let existing = &record.transaction;
            existing.listing_id == draft.transaction.listing_id
                && existing.buyer_id == draft.transaction.buyer_id
                && existing.seller_id == draft.transaction.seller_id
        });
        if duplicate || guard.transactions.contains_key(&draft.transaction.id) {
            return Err(RepositoryError::Conflict);
        }

        let record = draft.record();
        guard
            .transactions
            .insert(record.transaction.id.clone(), record.clone());
        guard.activities.push(draft.activity);
        Ok(record)
    }

    fn find_by_parties(
        &self,
        listing: &ListingId,
        buyer: &PartyId,
        seller: &PartyId,
    ) -> Result<Option<TransactionRecord>, RepositoryError> {
        Ok(self
            .lock()
            .transactions
            .values()
            .find(|record| {
                &record.transaction.listing_id == listing
                    && &record.transaction.buyer_id == buyer
                    && &record.transaction.seller_id == seller
            })
            .cloned())
    }

    fn fetch_transaction(
        &self,
        id: &TransactionId,
    ) -> Result<Option<TransactionRecord>, RepositoryError> {
        Ok(self.lock().transactions.get(id).cloned())
    }

    fn transactions_for_party(&self, party: &PartyId) -> Result<Vec<Transaction>, RepositoryError> {
        let guard = self.lock();
        Ok(guard
            .transactions
            .values()
            .map(|record| &record.transaction)
            .filter(|transaction| {
                transaction.is_party(party)
                    || guard.team.iter().any(|member| {
                        member.transaction_id == transaction.id
                            && &member.party_id == party
                            && member.status == TeamMemberStatus::Accepted
                    })
            })
            .cloned()
            .collect())
    }

    fn update_transaction(
        &self,
        transaction: Transaction,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.lock();
        let record = guard
            .transactions
            .get_mut(&transaction.id)
            .ok_or(RepositoryError::NotFound)?;
        if record.transaction.updated_at != expected_updated_at {
            return Err(RepositoryError::StaleWrite);
        }
        record.transaction = transaction;
        Ok(())
    }

    fn complete_milestone(
        &self,
        transaction: &TransactionId,
        milestone: &MilestoneId,
        completed_at: DateTime<Utc>,
    ) -> Result<Milestone, RepositoryError> {
        let mut guard = self.lock();
        let record = guard
            .transactions
            .get_mut(transaction)
            .ok_or(RepositoryError::NotFound)?;
        let entry = record
            .milestones
            .iter_mut()
            .find(|entry| &entry.id == milestone)
            .ok_or(RepositoryError::NotFound)?;
        if entry.completed {
            return Err(RepositoryError::StaleWrite);
        }
        entry.completed = true;
        entry.completed_at = Some(completed_at);
        Ok(entry.clone())
    }

    fn append_activity(&self, activity: Activity) -> Result<(), RepositoryError> {
        self.lock().activities.push(activity);
        Ok(())
    }

    fn activities(&self, transaction: &TransactionId) -> Result<Vec<Activity>, RepositoryError> {
        Ok(self
            .lock()
            .activities
            .iter()
            .filter(|activity| &activity.transaction_id == transaction)
            .cloned()
            .collect())
    }

    fn upsert_team_member(&self, member: TeamMember) -> Result<TeamMember, RepositoryError> {
        let mut guard = self.lock();
        match guard.team.iter_mut().find(|existing| {
            existing.transaction_id == member.transaction_id && existing.party_id == member.party_id
        }) {
            Some(existing) => *existing = member.clone(),
            None => guard.team.push(member.clone()),
        }
        Ok(member)
    }

    fn team_members(
        &self,
        transaction: &TransactionId,
    ) -> Result<Vec<TeamMember>, RepositoryError> {
        Ok(self
            .lock()
            .team
            .iter()
            .filter(|member| &member.transaction_id == transaction)
            .cloned()
            .collect())
    }
}

impl DocumentRepository for InMemoryDealStore {
    fn insert_document(&self, document: Document) -> Result<Document, RepositoryError> {
        let mut guard = self.lock();
        if guard.documents.contains_key(&document.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.documents.insert(document.id.clone(), document.clone());
        Ok(document)
    }

    fn fetch_document(&self, id: &DocumentId) -> Result<Option<Document>, RepositoryError> {
        Ok(self.lock().documents.get(id).cloned())
    }

    fn documents_for(&self, transaction: &TransactionId) -> Result<Vec<Document>, RepositoryError> {
        Ok(self
            .lock()
            .documents
            .values()
            .filter(|document| &document.transaction_id == transaction)
            .cloned()
            .collect())
    }
}

impl AccessAuditLog for InMemoryDealStore {
    fn append_access(&self, entry: AccessLogEntry) -> Result<(), RepositoryError> {
        self.lock().access_log.push(entry);
        Ok(())
    }

    fn access_entries(
        &self,
        transaction: &TransactionId,
    ) -> Result<Vec<AccessLogEntry>, RepositoryError> {
        Ok(self
            .lock()
            .access_log
            .iter()
            .filter(|entry| &entry.transaction_id == transaction)
            .cloned()
            .collect())
    }
}

impl MessageRepository for InMemoryDealStore {
    fn insert_message(&self, message: Message) -> Result<Message, RepositoryError> {
        self.lock().messages.push(message.clone());
        Ok(message)
    }

    fn conversation(
        &self,
        listing: &ListingId,
        a: &PartyId,
        b: &PartyId,
    ) -> Result<Vec<Message>, RepositoryError> {
        Ok(self
            .lock()
            .messages
            .iter()
            .filter(|message| {
                &message.listing_id == listing
                    && ((&message.sender_id == a && &message.recipient_id == b)
                        || (&message.sender_id == b && &message.recipient_id == a))
            })
            .cloned()
            .collect())
    }
}

/// Blob store keeping ciphertext in memory.
#[derive(Default, Clone)]
pub struct InMemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored bytes, for asserting that nothing is kept in plaintext.
    pub fn raw(&self, reference: &StorageRef) -> Option<Vec<u8>> {
        self.blobs
            .lock()
            .expect("blob mutex poisoned")
            .get(&reference.0)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().expect("blob mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for InMemoryBlobStore {
    fn put(&self, key: &str, bytes: Vec<u8>) -> Result<StorageRef, BlobStoreError> {
        self.blobs
            .lock()
            .expect("blob mutex poisoned")
            .insert(key.to_string(), bytes);
        Ok(StorageRef(key.to_string()))
    }

    fn get(&self, reference: &StorageRef) -> Result<Vec<u8>, BlobStoreError> {
        self.blobs
            .lock()
            .expect("blob mutex poisoned")
            .get(&reference.0)
            .cloned()
            .ok_or_else(|| BlobStoreError::Missing(reference.0.clone()))
    }

    fn delete(&self, key: &str) -> Result<(), BlobStoreError> {
        self.blobs.lock().expect("blob mutex poisoned").remove(key);
        Ok(())
    }
}

/// Notifier that keeps every notification for inspection.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// Notifier whose transport is always down. Counts the attempts it refuses.
#[derive(Default, Clone)]
pub struct FailingNotifier {
    attempts: Arc<Mutex<usize>>,
}

impl FailingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().expect("notifier mutex poisoned")
    }
}

impl Notifier for FailingNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        *self.attempts.lock().expect("notifier mutex poisoned") += 1;
        Err(NotifyError::Transport(format!(
            "{} for {} not delivered",
            notification.template, notification.recipient
        )))
    }
}
