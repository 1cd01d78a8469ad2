//! Domain Adapters
//!
//! Implementations of domain ports on top of the PostgreSQL layer. Each
//! adapter implements the port trait, translates between domain models and
//! row types, and maps database errors onto `PortError`.
//!
//! ```rust,ignore
//! use infra_db::adapters::PgLedgerStore;
//!
//! let store = PgLedgerStore::new(pool);
//! let accounts = store.accounts(tenant_id).await?;
//! ```

pub mod ledger;

pub use ledger::{PgLedgerStore, PgLedgerTransaction};
