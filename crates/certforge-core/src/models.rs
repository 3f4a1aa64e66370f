//! Domain models for CertForge.

pub mod ledger;
pub mod user;
