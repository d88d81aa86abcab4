//! Confidentiality agreements gating full disclosure, negotiation and messaging.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    disclosure_unlocked, unlocked_listings, BuyerProfileSnapshot, NdaDecision, NdaRequest,
    NdaStatus, NdaTransition, NewNdaRequest,
};
pub use repository::NdaRepository;
pub use router::nda_router;
pub use service::NdaService;
