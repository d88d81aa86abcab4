use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::ids::{
    ActivityId, ListingId, LoiId, MilestoneId, PartyId, PaymentId, TransactionId,
};

/// Ordered deal stage. Advances only forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStage {
    LoiSigned,
    NdaInForce,
    DdInProgress,
    SpaNegotiation,
    SpaSigned,
    Payment,
    Closed,
}

impl TransactionStage {
    pub const ORDER: [TransactionStage; 7] = [
        Self::LoiSigned,
        Self::NdaInForce,
        Self::DdInProgress,
        Self::SpaNegotiation,
        Self::SpaSigned,
        Self::Payment,
        Self::Closed,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::LoiSigned => "LOI_SIGNED",
            Self::NdaInForce => "NDA_IN_FORCE",
            Self::DdInProgress => "DD_IN_PROGRESS",
            Self::SpaNegotiation => "SPA_NEGOTIATION",
            Self::SpaSigned => "SPA_SIGNED",
            Self::Payment => "PAYMENT",
            Self::Closed => "CLOSED",
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::ORDER
            .iter()
            .position(|stage| *stage == self)
            .and_then(|index| Self::ORDER.get(index + 1))
            .copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub listing_id: ListingId,
    pub buyer_id: PartyId,
    pub seller_id: PartyId,
    pub advisor_id: Option<PartyId>,
    pub loi_id: LoiId,
    pub agreed_price: u64,
    pub stage: TransactionStage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_party(&self, party: &PartyId) -> bool {
        &self.buyer_id == party
            || &self.seller_id == party
            || self.advisor_id.as_ref() == Some(party)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponsibleParty {
    Buyer,
    Seller,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: MilestoneId,
    pub transaction_id: TransactionId,
    pub key: String,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub responsible: ResponsibleParty,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub position: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentKind {
    Deposit,
    MainPayment,
    EarnOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Released,
    Cancelled,
}

/// Scheduled obligation. Capture and settlement happen elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub transaction_id: TransactionId,
    pub kind: PaymentKind,
    pub amount: u64,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    TransactionCreated,
    MilestoneCompleted,
    StageAdvanced,
    AdvisorAssigned,
    TeamMemberInvited,
    TeamMemberJoined,
    TeamMemberDeclined,
    DocumentUploaded,
    UnauthorizedAccess,
}

/// Append-only transaction history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub transaction_id: TransactionId,
    pub kind: ActivityKind,
    pub actor_id: PartyId,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Activity {
    pub fn record(
        transaction_id: &TransactionId,
        kind: ActivityKind,
        actor_id: &PartyId,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActivityId::next(),
            transaction_id: transaction_id.clone(),
            kind,
            actor_id: actor_id.clone(),
            description: description.into(),
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamMemberStatus {
    Invited,
    Accepted,
    Declined,
}

impl TeamMemberStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Invited => "invited",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }
}

/// Additional participant invited onto a transaction by one of its parties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub transaction_id: TransactionId,
    pub party_id: PartyId,
    pub title: Option<String>,
    pub invited_by: PartyId,
    pub status: TeamMemberStatus,
    pub invited_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// Relationship of an actor to a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionRole {
    Buyer,
    Seller,
    Advisor,
    TeamMember,
}

impl TransactionRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
            Self::Advisor => "advisor",
            Self::TeamMember => "team_member",
        }
    }

    pub const fn may_upload(self) -> bool {
        matches!(self, Self::Seller | Self::Advisor)
    }
}

/// Transaction together with its schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction: Transaction,
    pub milestones: Vec<Milestone>,
    pub payments: Vec<Payment>,
}

/// Unpersisted output of schedule generation; stored in one atomic write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    pub transaction: Transaction,
    pub milestones: Vec<Milestone>,
    pub payments: Vec<Payment>,
    pub activity: Activity,
}

impl TransactionDraft {
    pub fn record(&self) -> TransactionRecord {
        TransactionRecord {
            transaction: self.transaction.clone(),
            milestones: self.milestones.clone(),
            payments: self.payments.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamInvitation {
    pub party_id: String,
    #[serde(default)]
    pub title: Option<String>,
}
