//! Ledger Domain - Multi-tenant Double-Entry Core
//!
//! This crate turns business documents into balanced ledger lines and
//! derives financial statements from them.
//!
//! # Document Flow
//!
//! 1. A [`DocumentRequest`] is derived into posting lines and side effects
//! 2. The lines are checked for balance and against the tenant's chart
//! 3. A number is allocated, the header and lines are written, and side
//!    effects on invoices and stock are applied in one transaction
//!
//! # Balances
//!
//! Balances are stored and aggregated as credit minus debit. Statements
//! flip the sign of debit-normal account types for presentation.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_ledger::{InMemoryLedgerStore, LedgerService, FinancialReports};
//!
//! let store = Arc::new(InMemoryLedgerStore::new());
//! let ledger = LedgerService::new(store.clone());
//! ledger.install_standard_chart(tenant_id).await?;
//!
//! let receipt = ledger.record(request).await?;
//! let tb = FinancialReports::new(store).trial_balance(tenant_id, from, to).await?;
//! ```

pub mod account;
pub mod adapters;
pub mod balance;
pub mod document;
pub mod error;
pub mod numbering;
pub mod ports;
pub mod reference;
pub mod reports;
pub mod requests;
pub mod service;

pub use account::{
    classify_code, Account, AccountClass, AccountType, ChartOfAccounts, Classification,
    DefaultAccounts, StandardChart,
};
pub use adapters::InMemoryLedgerStore;
pub use balance::{BalanceAggregator, BalanceWindow, RawBalance};
pub use document::{
    check_balance, Document, DocumentStatus, LedgerLine, LineTotals, PostingLine, SideEffect,
    BALANCE_TOLERANCE,
};
pub use error::LedgerError;
pub use numbering::{DocumentClass, DocumentNumberer};
pub use ports::{AccountSums, LedgerStore, LedgerTransaction, LineFilter};
pub use reference::{Customer, Invoice, Product, Supplier};
pub use reports::{
    BalanceSheet, CashFlowStatement, FinancialReports, ProfitAndLoss, TrialBalance,
};
pub use requests::{DocumentBody, DocumentRequest};
pub use service::{DocumentView, LedgerService, LedgerSettings, PostingReceipt};
