//! Ledger store adapters that live next to the domain
//!
//! - **InMemoryLedgerStore**: staged, single-writer store used by tests and
//!   the `memory` store mode of the API
//!
//! The PostgreSQL adapter lives in `infra_db`.

pub mod memory;

pub use memory::{InMemoryLedgerStore, InMemoryTransaction};
