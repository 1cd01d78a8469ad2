//! Core Kernel - Foundational types shared by every ledger crate
//!
//! This crate provides the building blocks used across the workspace:
//! - Money and exchange-rate types with precise decimal arithmetic
//! - Strongly-typed identifiers for tenants, documents and sub-ledger parties
//! - Port infrastructure (errors, health checks) for storage adapters

pub mod money;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, ExchangeRate, MoneyError};
pub use identifiers::{
    TenantId, UserId, DocumentId, LedgerLineId,
    CustomerId, SupplierId, InvoiceId, ProductId,
};
pub use ports::{
    PortError, DomainPort, AdapterHealth, HealthCheckable, HealthCheckResult,
    OperationMetadata,
};
