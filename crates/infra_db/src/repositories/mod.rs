//! Repository implementations
//!
//! Repositories encapsulate SQL and map between database rows and domain
//! types. Queries are checked at runtime so the crate builds without a live
//! database.

pub mod ledger;

pub use ledger::LedgerRepository;
