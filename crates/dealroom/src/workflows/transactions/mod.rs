//! Transactions opened from signed letters of intent: schedule generation and deal tracking.

pub mod access;
pub mod blueprint;
pub mod domain;
pub mod repository;
pub mod router;
pub mod schedule;
pub mod service;

#[cfg(test)]
mod tests;

pub use access::resolve_role;
pub use blueprint::{MilestoneTemplate, PaymentShare, PaymentTemplate, ScheduleBlueprint};
pub use domain::{
    Activity, ActivityKind, Milestone, Payment, PaymentKind, PaymentStatus, ResponsibleParty,
    TeamInvitation, TeamMember, TeamMemberStatus, Transaction, TransactionDraft,
    TransactionRecord, TransactionRole, TransactionStage,
};
pub use repository::TransactionRepository;
pub use router::transaction_router;
pub use schedule::generate;
pub use service::{TransactionService, TransactionView};
