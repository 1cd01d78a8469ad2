//! Test Utilities Crate
//!
//! Shared test infrastructure, fixtures, and helpers for the ledger
//! test suite.
//!
//! # Modules
//!
//! - `fixtures`: Ready-made ledgers, dates, account codes and reference data
//! - `builders`: Builders for document submissions
//! - `database`: PostgreSQL testcontainer management
//! - `assertions`: Assertion helpers for statements and errors
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
