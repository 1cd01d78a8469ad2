//! In-memory ledger store
//!
//! Committed state lives behind an `RwLock`. A transaction holds the writer
//! mutex for its whole lifetime and works on a private copy of the state,
//! which replaces the committed state on commit. Readers only ever see
//! committed state.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;

use core_kernel::{
    AdapterHealth, CustomerId, DocumentId, DomainPort, HealthCheckResult, HealthCheckable,
    InvoiceId, PortError, ProductId, SupplierId, TenantId,
};

use crate::account::Account;
use crate::document::{Document, LedgerLine};
use crate::numbering::{parse_sequence, DocumentClass};
use crate::ports::{AccountSums, LedgerStore, LedgerTransaction, LineFilter};
use crate::reference::{Customer, Invoice, Product, Supplier};

type SequenceKey = (TenantId, DocumentClass, Option<String>);

#[derive(Debug, Clone, Default)]
struct LedgerState {
    accounts: HashMap<TenantId, BTreeMap<String, Account>>,
    customers: HashMap<CustomerId, Customer>,
    suppliers: HashMap<SupplierId, Supplier>,
    products: HashMap<ProductId, Product>,
    invoices: HashMap<InvoiceId, Invoice>,
    documents: HashMap<DocumentId, Document>,
    sequences: HashMap<SequenceKey, u64>,
    lines: Vec<LedgerLine>,
}

impl LedgerState {
    fn highest_sequence(&self, tenant_id: TenantId, class: DocumentClass, period: Option<&str>) -> u64 {
        let scope = class.scope_prefix(period);
        self.documents
            .values()
            .filter(|d| d.tenant_id == tenant_id && d.class == class)
            .filter_map(|d| parse_sequence(&d.number, &scope))
            .max()
            .unwrap_or(0)
    }
}

/// In-memory implementation of `LedgerStore`
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    state: Arc<RwLock<LedgerState>>,
    writer: Arc<Mutex<()>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ledger lines written so far, across tenants
    pub async fn line_count(&self) -> usize {
        self.state.read().await.lines.len()
    }

    /// Number of document headers stored so far, across tenants
    pub async fn document_count(&self) -> usize {
        self.state.read().await.documents.len()
    }

    /// Applies a reference-data write under the writer lock
    async fn write<F>(&self, f: F) -> Result<(), PortError>
    where
        F: FnOnce(&mut LedgerState) -> Result<(), PortError> + Send,
    {
        let _guard = self.writer.lock().await;
        let mut state = self.state.write().await;
        f(&mut state)
    }
}

impl DomainPort for InMemoryLedgerStore {}

#[async_trait]
impl HealthCheckable for InMemoryLedgerStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "memory-ledger-store".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: Some("in-memory store".to_string()),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, PortError> {
        let guard = Arc::clone(&self.writer).lock_owned().await;
        let working = self.state.read().await.clone();
        Ok(Box::new(InMemoryTransaction {
            committed: Arc::clone(&self.state),
            working,
            _guard: guard,
        }))
    }

    async fn accounts(&self, tenant_id: TenantId) -> Result<Vec<Account>, PortError> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .get(&tenant_id)
            .map(|chart| chart.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn account_sums(
        &self,
        tenant_id: TenantId,
        filter: LineFilter,
    ) -> Result<Vec<AccountSums>, PortError> {
        let state = self.state.read().await;
        let mut sums: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
        for line in state
            .lines
            .iter()
            .filter(|l| l.tenant_id == tenant_id && filter.matches(l))
        {
            let entry = sums.entry(line.account_code.clone()).or_default();
            entry.0 += line.debit;
            entry.1 += line.credit;
        }
        Ok(sums
            .into_iter()
            .map(|(account_code, (debit, credit))| AccountSums {
                account_code,
                debit,
                credit,
            })
            .collect())
    }

    async fn document(&self, tenant_id: TenantId, id: DocumentId) -> Result<Option<Document>, PortError> {
        let state = self.state.read().await;
        Ok(state
            .documents
            .get(&id)
            .filter(|d| d.tenant_id == tenant_id)
            .cloned())
    }

    async fn document_lines(&self, tenant_id: TenantId, id: DocumentId) -> Result<Vec<LedgerLine>, PortError> {
        let state = self.state.read().await;
        let mut lines: Vec<_> = state
            .lines
            .iter()
            .filter(|l| l.tenant_id == tenant_id && l.document_id == id)
            .cloned()
            .collect();
        lines.sort_by_key(|l| l.line_no);
        Ok(lines)
    }

    async fn invoice(&self, tenant_id: TenantId, id: InvoiceId) -> Result<Option<Invoice>, PortError> {
        let state = self.state.read().await;
        Ok(state.invoices.get(&id).filter(|i| i.tenant_id == tenant_id).cloned())
    }

    async fn product(&self, tenant_id: TenantId, id: ProductId) -> Result<Option<Product>, PortError> {
        let state = self.state.read().await;
        Ok(state.products.get(&id).filter(|p| p.tenant_id == tenant_id).cloned())
    }

    async fn insert_account(&self, tenant_id: TenantId, account: Account) -> Result<(), PortError> {
        self.write(move |state| {
            let chart = state.accounts.entry(tenant_id).or_default();
            if chart.contains_key(&account.code) {
                return Err(PortError::conflict(format!(
                    "account code {} already exists",
                    account.code
                )));
            }
            chart.insert(account.code.clone(), account);
            Ok(())
        })
        .await
    }

    async fn insert_customer(&self, customer: Customer) -> Result<(), PortError> {
        self.write(move |state| {
            state.customers.insert(customer.id, customer);
            Ok(())
        })
        .await
    }

    async fn insert_supplier(&self, supplier: Supplier) -> Result<(), PortError> {
        self.write(move |state| {
            state.suppliers.insert(supplier.id, supplier);
            Ok(())
        })
        .await
    }

    async fn insert_product(&self, product: Product) -> Result<(), PortError> {
        self.write(move |state| {
            state.products.insert(product.id, product);
            Ok(())
        })
        .await
    }

    async fn insert_invoice(&self, invoice: Invoice) -> Result<(), PortError> {
        self.write(move |state| {
            if !state
                .customers
                .get(&invoice.customer_id)
                .is_some_and(|c| c.tenant_id == invoice.tenant_id)
            {
                return Err(PortError::not_found("Customer", invoice.customer_id));
            }
            state.invoices.insert(invoice.id, invoice);
            Ok(())
        })
        .await
    }
}

/// A staged transaction over a private copy of the ledger state
pub struct InMemoryTransaction {
    committed: Arc<RwLock<LedgerState>>,
    working: LedgerState,
    _guard: OwnedMutexGuard<()>,
}

#[async_trait]
impl LedgerTransaction for InMemoryTransaction {
    async fn next_sequence(
        &mut self,
        tenant_id: TenantId,
        class: DocumentClass,
        period: Option<&str>,
    ) -> Result<u64, PortError> {
        let key = (tenant_id, class, period.map(str::to_string));
        let seeded = self.working.highest_sequence(tenant_id, class, period);
        let counter = self.working.sequences.entry(key).or_insert(seeded);
        *counter += 1;
        Ok(*counter)
    }

    async fn insert_document(&mut self, document: &Document) -> Result<(), PortError> {
        let taken = self
            .working
            .documents
            .values()
            .any(|d| d.tenant_id == document.tenant_id && d.number == document.number);
        if taken {
            return Err(PortError::conflict(format!(
                "document number {} already exists",
                document.number
            )));
        }
        self.working.documents.insert(document.id, document.clone());
        Ok(())
    }

    async fn update_document(&mut self, document: &Document) -> Result<(), PortError> {
        match self.working.documents.get_mut(&document.id) {
            Some(existing) if existing.tenant_id == document.tenant_id => {
                *existing = document.clone();
                Ok(())
            }
            _ => Err(PortError::not_found("Document", document.id)),
        }
    }

    async fn delete_document(&mut self, tenant_id: TenantId, id: DocumentId) -> Result<(), PortError> {
        match self.working.documents.get(&id) {
            Some(existing) if existing.tenant_id == tenant_id => {
                self.working.documents.remove(&id);
                Ok(())
            }
            _ => Err(PortError::not_found("Document", id)),
        }
    }

    async fn lock_document(
        &mut self,
        tenant_id: TenantId,
        id: DocumentId,
    ) -> Result<Option<Document>, PortError> {
        Ok(self
            .working
            .documents
            .get(&id)
            .filter(|d| d.tenant_id == tenant_id)
            .cloned())
    }

    async fn insert_lines(&mut self, lines: &[LedgerLine]) -> Result<(), PortError> {
        if let Some(bad) = lines.iter().find(|l| {
            l.debit.is_sign_negative() || l.credit.is_sign_negative() || !(l.debit.is_zero() ^ l.credit.is_zero())
        }) {
            return Err(PortError::validation(format!(
                "ledger line on {} must be one-sided",
                bad.account_code
            )));
        }
        self.working.lines.extend_from_slice(lines);
        Ok(())
    }

    async fn adjust_invoice_due(
        &mut self,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
        delta: Decimal,
    ) -> Result<(), PortError> {
        let invoice = self
            .working
            .invoices
            .get_mut(&invoice_id)
            .filter(|i| i.tenant_id == tenant_id)
            .ok_or_else(|| PortError::not_found("Invoice", invoice_id))?;
        let updated = invoice.amount_due + delta;
        if updated.is_sign_negative() && !updated.is_zero() {
            return Err(PortError::validation_field(
                format!(
                    "invoice {} amount due would become negative ({})",
                    invoice.number, updated
                ),
                "amount_due",
            ));
        }
        invoice.amount_due = updated;
        Ok(())
    }

    async fn adjust_stock(
        &mut self,
        tenant_id: TenantId,
        product_id: ProductId,
        delta: Decimal,
    ) -> Result<(), PortError> {
        let product = self
            .working
            .products
            .get_mut(&product_id)
            .filter(|p| p.tenant_id == tenant_id)
            .ok_or_else(|| PortError::not_found("Product", product_id))?;
        product.stock_on_hand += delta;
        Ok(())
    }

    async fn customer_exists(&mut self, tenant_id: TenantId, id: CustomerId) -> Result<bool, PortError> {
        Ok(self
            .working
            .customers
            .get(&id)
            .is_some_and(|c| c.tenant_id == tenant_id))
    }

    async fn supplier_exists(&mut self, tenant_id: TenantId, id: SupplierId) -> Result<bool, PortError> {
        Ok(self
            .working
            .suppliers
            .get(&id)
            .is_some_and(|s| s.tenant_id == tenant_id))
    }

    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        let this = *self;
        let mut committed = this.committed.write().await;
        *committed = this.working;
        debug!("in-memory transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), PortError> {
        debug!("in-memory transaction rolled back");
        Ok(())
    }
}
