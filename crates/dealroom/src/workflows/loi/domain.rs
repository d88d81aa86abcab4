use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::ids::{ListingId, LoiId, PartyId};
use crate::workflows::transactions::TransactionRecord;

/// Letter of intent status. `Negotiation` is never stored; see [`Loi::display_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoiStatus {
    Proposed,
    Negotiation,
    Signed,
    Rejected,
}

impl LoiStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Negotiation => "negotiation",
            Self::Signed => "signed",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealSide {
    Buyer,
    Seller,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnoutTarget {
    pub year: u16,
    pub target: String,
}

/// Commercial terms carried by a letter of intent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoiTerms {
    pub proposed_price: u64,
    #[serde(default)]
    pub cash_at_closing_pct: Option<u8>,
    #[serde(default)]
    pub escrow_holdback_pct: Option<u8>,
    #[serde(default)]
    pub escrow_period_months: Option<u16>,
    #[serde(default)]
    pub earnout_amount: Option<u64>,
    #[serde(default)]
    pub earnout_targets: Vec<EarnoutTarget>,
    #[serde(default)]
    pub non_compete_years: Option<u8>,
    #[serde(default)]
    pub non_compete_geography: Option<String>,
    #[serde(default)]
    pub proposed_closing_date: Option<NaiveDate>,
    #[serde(default)]
    pub conditions: Option<String>,
}

impl LoiTerms {
    /// Names of invalid fields; empty when the terms are acceptable.
    pub fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if self.proposed_price == 0 {
            invalid.push("proposed_price");
        }
        if self.cash_at_closing_pct.is_some_and(|pct| pct > 100) {
            invalid.push("cash_at_closing_pct");
        }
        if self.escrow_holdback_pct.is_some_and(|pct| pct > 100) {
            invalid.push("escrow_holdback_pct");
        }
        if let (Some(cash), Some(escrow)) = (self.cash_at_closing_pct, self.escrow_holdback_pct) {
            if u16::from(cash) + u16::from(escrow) > 100 {
                invalid.push("escrow_holdback_pct");
            }
        }
        if self
            .earnout_amount
            .is_some_and(|amount| amount > self.proposed_price)
        {
            invalid.push("earnout_amount");
        }
        invalid.dedup();
        invalid
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoiRevision {
    pub version: u32,
    pub author_id: PartyId,
    pub author_role: DealSide,
    pub change_description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loi {
    pub id: LoiId,
    pub listing_id: ListingId,
    pub buyer_id: PartyId,
    pub seller_id: PartyId,
    pub terms: LoiTerms,
    pub status: LoiStatus,
    pub version: u32,
    pub revisions: Vec<LoiRevision>,
    pub created_at: DateTime<Utc>,
    pub signed_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

impl Loi {
    /// Status shown to parties: a proposal that has been revised reads as negotiation.
    pub fn display_status(&self) -> LoiStatus {
        match self.status {
            LoiStatus::Proposed if self.revisions.len() > 1 => LoiStatus::Negotiation,
            other => other,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, LoiStatus::Proposed | LoiStatus::Negotiation)
    }

    pub fn side_of(&self, party: &PartyId) -> Option<DealSide> {
        if &self.buyer_id == party {
            Some(DealSide::Buyer)
        } else if &self.seller_id == party {
            Some(DealSide::Seller)
        } else {
            None
        }
    }
}

/// Seller response to an open letter of intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoiAction {
    Approve,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoiDecision {
    pub action: LoiAction,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoiRevisionRequest {
    pub change_description: String,
    #[serde(default)]
    pub terms: Option<LoiTerms>,
}

/// LOI as returned to clients, with the derived display status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoiView {
    #[serde(flatten)]
    pub loi: Loi,
    pub display_status: LoiStatus,
}

impl From<Loi> for LoiView {
    fn from(loi: Loi) -> Self {
        let display_status = loi.display_status();
        Self {
            loi,
            display_status,
        }
    }
}

/// Result of approving a letter of intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoiApproval {
    pub loi: LoiView,
    pub transaction: TransactionRecord,
}

/// Result of a seller decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LoiOutcome {
    Signed(LoiApproval),
    Rejected(LoiView),
}
