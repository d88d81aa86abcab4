//! Letters of intent: versioned offers whose approval opens a transaction.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    DealSide, EarnoutTarget, Loi, LoiAction, LoiApproval, LoiDecision, LoiOutcome, LoiRevision,
    LoiRevisionRequest, LoiStatus, LoiTerms, LoiView,
};
pub use repository::LoiRepository;
pub use router::loi_router;
pub use service::LoiService;
