//! Ledger storage ports
//!
//! `LedgerStore` is the read side plus the entry point for write
//! transactions. Every write in the posting path goes through a
//! `LedgerTransaction`, which either commits as a whole or rolls back as a
//! whole.
//!
//! # Adapters
//!
//! - **PostgreSQL** (`infra_db::PgLedgerStore`): row-level locks on the
//!   counter and document rows
//! - **In-memory** (`crate::adapters::InMemoryLedgerStore`): a single writer
//!   at a time over a staged copy of the state
//!
//! ```rust,ignore
//! let store: Arc<dyn LedgerStore> = match config.store {
//!     StoreKind::Postgres => Arc::new(PgLedgerStore::new(pool)),
//!     StoreKind::Memory => Arc::new(InMemoryLedgerStore::new()),
//! };
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{
    CustomerId, DocumentId, DomainPort, HealthCheckable, InvoiceId, PortError, ProductId,
    SupplierId, TenantId,
};

use crate::account::Account;
use crate::document::{Document, LedgerLine};
use crate::numbering::DocumentClass;
use crate::reference::{Customer, Invoice, Product, Supplier};

/// Restricts which ledger lines are summed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineFilter {
    /// Inclusive lower bound on entry date
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on entry date
    pub to: Option<NaiveDate>,
    /// Limit to these account codes
    pub accounts: Option<Vec<String>>,
}

impl LineFilter {
    pub fn up_to(date: NaiveDate) -> Self {
        Self {
            to: Some(date),
            ..Default::default()
        }
    }

    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            accounts: None,
        }
    }

    pub fn for_accounts(mut self, accounts: Option<Vec<String>>) -> Self {
        self.accounts = accounts;
        self
    }

    pub fn matches(&self, line: &LedgerLine) -> bool {
        self.from.map_or(true, |from| line.entry_date >= from)
            && self.to.map_or(true, |to| line.entry_date <= to)
            && self
                .accounts
                .as_ref()
                .map_or(true, |codes| codes.iter().any(|c| c == &line.account_code))
    }
}

/// Gross debit and credit totals of one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSums {
    pub account_code: String,
    pub debit: Decimal,
    pub credit: Decimal,
}

impl AccountSums {
    /// Credit minus debit
    pub fn raw_balance(&self) -> Decimal {
        self.credit - self.debit
    }
}

/// Read side of the ledger and factory for write transactions
#[async_trait]
pub trait LedgerStore: DomainPort + HealthCheckable {
    /// Starts an all-or-nothing write transaction
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, PortError>;

    /// Chart of accounts for a tenant
    async fn accounts(&self, tenant_id: TenantId) -> Result<Vec<Account>, PortError>;

    /// Per-account debit and credit sums over ledger lines matching `filter`
    async fn account_sums(
        &self,
        tenant_id: TenantId,
        filter: LineFilter,
    ) -> Result<Vec<AccountSums>, PortError>;

    async fn document(
        &self,
        tenant_id: TenantId,
        id: DocumentId,
    ) -> Result<Option<Document>, PortError>;

    /// Ledger lines written for a document, in line order
    async fn document_lines(
        &self,
        tenant_id: TenantId,
        id: DocumentId,
    ) -> Result<Vec<LedgerLine>, PortError>;

    async fn invoice(&self, tenant_id: TenantId, id: InvoiceId) -> Result<Option<Invoice>, PortError>;

    async fn product(&self, tenant_id: TenantId, id: ProductId) -> Result<Option<Product>, PortError>;

    // ------------------------------------------------------------------
    // Reference data
    // ------------------------------------------------------------------

    /// Stores an account; `Conflict` if the code is already taken
    async fn insert_account(&self, tenant_id: TenantId, account: Account) -> Result<(), PortError>;

    async fn insert_customer(&self, customer: Customer) -> Result<(), PortError>;

    async fn insert_supplier(&self, supplier: Supplier) -> Result<(), PortError>;

    async fn insert_product(&self, product: Product) -> Result<(), PortError>;

    async fn insert_invoice(&self, invoice: Invoice) -> Result<(), PortError>;
}

/// One write transaction against the ledger
///
/// Dropping a transaction without committing discards its writes.
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Increments and returns the counter for `(tenant, class[, period])`,
    /// locking it until the transaction ends
    ///
    /// A missing counter is seeded from the highest existing number in scope.
    async fn next_sequence(
        &mut self,
        tenant_id: TenantId,
        class: DocumentClass,
        period: Option<&str>,
    ) -> Result<u64, PortError>;

    /// Inserts a document header; `Conflict` when the number is taken
    async fn insert_document(&mut self, document: &Document) -> Result<(), PortError>;

    async fn update_document(&mut self, document: &Document) -> Result<(), PortError>;

    async fn delete_document(&mut self, tenant_id: TenantId, id: DocumentId) -> Result<(), PortError>;

    /// Reads a document and locks it for the rest of the transaction
    async fn lock_document(
        &mut self,
        tenant_id: TenantId,
        id: DocumentId,
    ) -> Result<Option<Document>, PortError>;

    async fn insert_lines(&mut self, lines: &[LedgerLine]) -> Result<(), PortError>;

    /// Moves an invoice's amount due; `NotFound` if the invoice is missing,
    /// `Validation` if the result would be negative
    async fn adjust_invoice_due(
        &mut self,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
        delta: Decimal,
    ) -> Result<(), PortError>;

    /// Moves a product's stock on hand; `NotFound` if the product is missing
    async fn adjust_stock(
        &mut self,
        tenant_id: TenantId,
        product_id: ProductId,
        delta: Decimal,
    ) -> Result<(), PortError>;

    async fn customer_exists(&mut self, tenant_id: TenantId, id: CustomerId) -> Result<bool, PortError>;

    async fn supplier_exists(&mut self, tenant_id: TenantId, id: SupplierId) -> Result<bool, PortError>;

    async fn commit(self: Box<Self>) -> Result<(), PortError>;

    async fn rollback(self: Box<Self>) -> Result<(), PortError>;
}
