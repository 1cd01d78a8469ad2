//! Infrastructure Database Layer
//!
//! PostgreSQL storage for the ledger using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: `repositories` holds the SQL
//! and row mapping, `adapters` implements the `domain_ledger` storage ports
//! on top of it.
//!
//! # Concurrency
//!
//! Document numbers come from a counter row per (tenant, class, period)
//! that is locked for the rest of the posting transaction, so concurrent
//! posts of the same class serialize on it and never share a number.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PgLedgerStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/ledger")).await?;
//! run_migrations(&pool).await?;
//! let store = PgLedgerStore::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::{PgLedgerStore, PgLedgerTransaction};
pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
pub use repositories::LedgerRepository;
