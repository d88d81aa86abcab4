//! Disclosure and transaction lifecycle for anonymous business-for-sale listings.

pub mod clock;
pub mod documents;
pub mod error;
pub mod identity;
pub mod ids;
pub mod listings;
pub mod loi;
pub mod memory;
pub mod messaging;
pub mod nda;
pub mod notify;
pub mod repository;
pub mod transactions;
