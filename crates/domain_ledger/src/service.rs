//! Ledger posting service
//!
//! Every write follows the same shape: validate and derive outside the
//! transaction, then allocate the number, insert the header, write the lines
//! and apply side effects inside one `LedgerTransaction`. Any error rolls
//! the whole transaction back.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use core_kernel::{
    Currency, CustomerId, DocumentId, InvoiceId, LedgerLineId, SupplierId, TenantId, UserId,
};

use crate::account::{Account, AccountClass, ChartOfAccounts, DefaultAccounts, StandardChart};
use crate::document::{
    check_balance, Document, DocumentStatus, LedgerLine, PostingLine, SideEffect,
    BALANCE_TOLERANCE,
};
use crate::error::LedgerError;
use crate::numbering::DocumentNumberer;
use crate::ports::{LedgerStore, LedgerTransaction};
use crate::reference::{Customer, Invoice, Product, Supplier};
use crate::requests::{Derivation, DerivationContext, DocumentBody, DocumentRequest, PaymentDirection};

/// Tunables for the posting path
#[derive(Debug, Clone)]
pub struct LedgerSettings {
    /// Currency for documents that do not name one
    pub default_currency: Currency,
    /// Largest tolerated debit/credit difference (exclusive)
    pub tolerance: Decimal,
    pub accounts: DefaultAccounts,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            default_currency: Currency::USD,
            tolerance: BALANCE_TOLERANCE,
            accounts: DefaultAccounts::default(),
        }
    }
}

/// Outcome of a successful write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingReceipt {
    pub document_id: DocumentId,
    pub document_number: String,
    pub status: DocumentStatus,
    pub total: Decimal,
    pub ledger_line_ids: Vec<LedgerLineId>,
}

impl PostingReceipt {
    fn of(document: &Document, ledger_line_ids: Vec<LedgerLineId>) -> Self {
        Self {
            document_id: document.id,
            document_number: document.number.clone(),
            status: document.status,
            total: document.total,
            ledger_line_ids,
        }
    }
}

/// A document together with the ledger lines it produced
#[derive(Debug, Clone, Serialize)]
pub struct DocumentView {
    #[serde(flatten)]
    pub document: Document,
    pub ledger_lines: Vec<LedgerLine>,
}

/// Application service for recording, posting and reversing documents
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    numberer: DocumentNumberer,
    settings: LedgerSettings,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            numberer: DocumentNumberer::new(),
            settings: LedgerSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: LedgerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    /// Loads the tenant's chart of accounts
    pub async fn chart(&self, tenant_id: TenantId) -> Result<ChartOfAccounts, LedgerError> {
        let accounts = self.store.accounts(tenant_id).await?;
        Ok(ChartOfAccounts::from_accounts(accounts))
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    /// Records a new document
    ///
    /// Journal vouchers, credit notes and payment vouchers are posted
    /// immediately. Expense and income vouchers are stored as drafts and
    /// reach the ledger only through [`LedgerService::post`].
    ///
    /// # Errors
    ///
    /// - `Validation` for missing or malformed fields
    /// - `Unbalanced` when debits and credits differ
    /// - `Reference` for unknown accounts, parties, invoices or products
    /// - `Conflict` when a number race persists after one retry
    #[instrument(
        skip(self, request),
        fields(tenant_id = %request.tenant_id, class = %request.body.class())
    )]
    pub async fn record(&self, request: DocumentRequest) -> Result<PostingReceipt, LedgerError> {
        ensure_actor(request.tenant_id, request.user_id)?;
        let chart = self.chart(request.tenant_id).await?;
        let derivation = self.prepare(&request, &chart).await?;

        let mut retried = false;
        let receipt = loop {
            let mut tx = self.store.begin().await?;
            let result = self
                .write_new_document(tx.as_mut(), &request, &derivation)
                .await;
            match finish(tx, result).await {
                Err(err) if err.is_conflict() && !retried => {
                    warn!(error = %err, "document number conflict, retrying with a fresh number");
                    retried = true;
                }
                other => break other?,
            }
        };

        info!(
            document_number = %receipt.document_number,
            status = %receipt.status,
            lines = receipt.ledger_line_ids.len(),
            "document recorded"
        );
        Ok(receipt)
    }

    /// Posts a draft document to the ledger
    #[instrument(skip(self), fields(tenant_id = %tenant_id, document_id = %id))]
    pub async fn post(&self, tenant_id: TenantId, id: DocumentId) -> Result<PostingReceipt, LedgerError> {
        let chart = self.chart(tenant_id).await?;
        let mut tx = self.store.begin().await?;
        let result = self.post_draft(tx.as_mut(), &chart, tenant_id, id).await;
        let receipt = finish(tx, result).await?;

        info!(document_number = %receipt.document_number, "draft posted");
        Ok(receipt)
    }

    /// Reverses a posted document with a mirrored one
    ///
    /// The reversal gets its own number in the original's class and is
    /// dated `entry_date`, or the original's date when omitted. Side
    /// effects of the original are undone in the same transaction.
    ///
    /// # Errors
    ///
    /// - `Validation` for a nil tenant or user
    /// - `Reference` when the document is not posted, was already reversed,
    ///   or is itself a reversal
    #[instrument(skip(self), fields(tenant_id = %tenant_id, document_id = %id))]
    pub async fn reverse(
        &self,
        tenant_id: TenantId,
        id: DocumentId,
        user_id: UserId,
        entry_date: Option<NaiveDate>,
    ) -> Result<PostingReceipt, LedgerError> {
        ensure_actor(tenant_id, user_id)?;
        let mut retried = false;
        let receipt = loop {
            let mut tx = self.store.begin().await?;
            let result = self
                .write_reversal(tx.as_mut(), tenant_id, id, user_id, entry_date)
                .await;
            match finish(tx, result).await {
                Err(err) if err.is_conflict() && !retried => {
                    warn!(error = %err, "document number conflict on reversal, retrying");
                    retried = true;
                }
                other => break other?,
            }
        };

        info!(reversal_number = %receipt.document_number, "document reversed");
        Ok(receipt)
    }

    /// Replaces the content of a draft with a new submission of the same class
    #[instrument(skip(self, request), fields(tenant_id = %request.tenant_id, document_id = %id))]
    pub async fn update_draft(
        &self,
        id: DocumentId,
        request: DocumentRequest,
    ) -> Result<PostingReceipt, LedgerError> {
        ensure_actor(request.tenant_id, request.user_id)?;
        let chart = self.chart(request.tenant_id).await?;
        let derivation = self.prepare(&request, &chart).await?;

        let mut tx = self.store.begin().await?;
        let result = self
            .rewrite_draft(tx.as_mut(), id, &request, derivation)
            .await;
        finish(tx, result).await
    }

    /// Deletes a draft; its number is not reused
    #[instrument(skip(self), fields(tenant_id = %tenant_id, document_id = %id))]
    pub async fn delete_draft(&self, tenant_id: TenantId, id: DocumentId) -> Result<(), LedgerError> {
        let mut tx = self.store.begin().await?;
        let result = async {
            let document = lock_existing(tx.as_mut(), tenant_id, id).await?;
            document.ensure_draft("delete")?;
            tx.delete_document(tenant_id, id).await?;
            Ok::<(), LedgerError>(())
        }
        .await;
        finish(tx, result).await
    }

    /// Moves a draft to `cancelled`
    #[instrument(skip(self), fields(tenant_id = %tenant_id, document_id = %id))]
    pub async fn cancel(&self, tenant_id: TenantId, id: DocumentId) -> Result<Document, LedgerError> {
        let mut tx = self.store.begin().await?;
        let result = async {
            let mut document = lock_existing(tx.as_mut(), tenant_id, id).await?;
            document.ensure_draft("cancel")?;
            document.status = DocumentStatus::Cancelled;
            tx.update_document(&document).await?;
            Ok::<Document, LedgerError>(document)
        }
        .await;
        finish(tx, result).await
    }

    /// Document header plus its ledger lines
    pub async fn document(&self, tenant_id: TenantId, id: DocumentId) -> Result<DocumentView, LedgerError> {
        let document = self
            .store
            .document(tenant_id, id)
            .await?
            .ok_or_else(|| LedgerError::not_found(format!("document {}", id)))?;
        let ledger_lines = self.store.document_lines(tenant_id, id).await?;
        Ok(DocumentView {
            document,
            ledger_lines,
        })
    }

    // ------------------------------------------------------------------
    // Reference data
    // ------------------------------------------------------------------

    pub async fn register_account(&self, tenant_id: TenantId, account: Account) -> Result<(), LedgerError> {
        let mut chart = self.chart(tenant_id).await?;
        chart.register(account.clone())?;
        self.store.insert_account(tenant_id, account).await?;
        Ok(())
    }

    /// Adds every standard account the tenant does not have yet
    ///
    /// # Returns
    ///
    /// The number of accounts added
    pub async fn install_standard_chart(&self, tenant_id: TenantId) -> Result<usize, LedgerError> {
        let chart = self.chart(tenant_id).await?;
        let mut added = 0;
        for account in StandardChart::accounts() {
            if chart.contains(&account.code) {
                continue;
            }
            self.store.insert_account(tenant_id, account).await?;
            added += 1;
        }
        info!(tenant_id = %tenant_id, added, "standard chart installed");
        Ok(added)
    }

    pub async fn register_customer(&self, customer: Customer) -> Result<(), LedgerError> {
        require_name(&customer.name, "customer")?;
        self.store.insert_customer(customer).await?;
        Ok(())
    }

    pub async fn register_supplier(&self, supplier: Supplier) -> Result<(), LedgerError> {
        require_name(&supplier.name, "supplier")?;
        self.store.insert_supplier(supplier).await?;
        Ok(())
    }

    pub async fn register_product(&self, product: Product) -> Result<(), LedgerError> {
        require_name(&product.name, "product")?;
        self.store.insert_product(product).await?;
        Ok(())
    }

    pub async fn register_invoice(&self, invoice: Invoice) -> Result<(), LedgerError> {
        if invoice.total.is_sign_negative()
            || invoice.amount_due.is_sign_negative()
            || invoice.amount_due > invoice.total
        {
            return Err(LedgerError::validation(
                "invoice amount_due must be between zero and the invoice total",
            ));
        }
        self.store.insert_invoice(invoice).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Derives and validates a submission without touching storage writes
    async fn prepare(
        &self,
        request: &DocumentRequest,
        chart: &ChartOfAccounts,
    ) -> Result<Derivation, LedgerError> {
        let ctx = DerivationContext {
            chart,
            accounts: &self.settings.accounts,
            currency: request.currency.unwrap_or(self.settings.default_currency),
        };
        let derivation = request.body.derive(&ctx)?;
        check_balance(&derivation.lines, self.settings.tolerance)?;
        validate_accounts(chart, &derivation.lines)?;
        self.check_invoices(request).await?;
        Ok(derivation)
    }

    /// Invoices referenced by a payload must exist and belong to its customer
    async fn check_invoices(&self, request: &DocumentRequest) -> Result<(), LedgerError> {
        let (customer_id, invoice_ids): (Option<CustomerId>, Vec<InvoiceId>) = match &request.body {
            DocumentBody::CreditNote(body) => (Some(body.customer_id), vec![body.invoice_id]),
            DocumentBody::PaymentVoucher(body) if body.direction == PaymentDirection::Receipt => (
                body.customer_id,
                body.allocations.iter().filter_map(|a| a.invoice_id).collect(),
            ),
            _ => return Ok(()),
        };

        for invoice_id in invoice_ids {
            let invoice = self
                .store
                .invoice(request.tenant_id, invoice_id)
                .await?
                .ok_or_else(|| LedgerError::reference(format!("invoice {} does not exist", invoice_id)))?;
            if Some(invoice.customer_id) != customer_id {
                return Err(LedgerError::validation(format!(
                    "invoice {} belongs to a different customer",
                    invoice.number
                )));
            }
        }
        Ok(())
    }

    async fn write_new_document(
        &self,
        tx: &mut dyn LedgerTransaction,
        request: &DocumentRequest,
        derivation: &Derivation,
    ) -> Result<PostingReceipt, LedgerError> {
        let tenant_id = request.tenant_id;
        ensure_parties_exist(tx, tenant_id, &derivation.lines).await?;

        let class = request.body.class();
        let number = self
            .numberer
            .next(tx, tenant_id, class, request.entry_date)
            .await?;

        let now = Utc::now();
        let posts = class.posts_on_create();
        let document = Document {
            id: DocumentId::new_v7(),
            tenant_id,
            class,
            number,
            status: if posts { DocumentStatus::Posted } else { DocumentStatus::Draft },
            entry_date: request.entry_date,
            narration: request.narration.trim().to_string(),
            currency: request.currency.unwrap_or(self.settings.default_currency),
            exchange_rate: request.exchange_rate.unwrap_or_default(),
            total: derivation.total,
            lines: derivation.lines.clone(),
            effects: derivation.effects.clone(),
            reversal_of: None,
            reversed_by: None,
            created_by: request.user_id,
            created_at: now,
            posted_at: posts.then_some(now),
        };

        tx.insert_document(&document).await?;
        let line_ids = if posts {
            self.write_ledger(tx, &document).await?
        } else {
            Vec::new()
        };
        Ok(PostingReceipt::of(&document, line_ids))
    }

    async fn post_draft(
        &self,
        tx: &mut dyn LedgerTransaction,
        chart: &ChartOfAccounts,
        tenant_id: TenantId,
        id: DocumentId,
    ) -> Result<PostingReceipt, LedgerError> {
        let mut document = lock_existing(tx, tenant_id, id).await?;
        document.ensure_draft("post")?;
        validate_accounts(chart, &document.lines)?;
        ensure_parties_exist(tx, tenant_id, &document.lines).await?;

        let line_ids = self.write_ledger(tx, &document).await?;
        document.status = DocumentStatus::Posted;
        document.posted_at = Some(Utc::now());
        tx.update_document(&document).await?;
        Ok(PostingReceipt::of(&document, line_ids))
    }

    async fn write_reversal(
        &self,
        tx: &mut dyn LedgerTransaction,
        tenant_id: TenantId,
        id: DocumentId,
        user_id: UserId,
        entry_date: Option<NaiveDate>,
    ) -> Result<PostingReceipt, LedgerError> {
        let mut original = lock_existing(tx, tenant_id, id).await?;
        original.ensure_reversible()?;

        let entry_date = entry_date.unwrap_or(original.entry_date);
        if entry_date < original.entry_date {
            return Err(LedgerError::validation(format!(
                "reversal date {} is before the original entry date {}",
                entry_date, original.entry_date
            )));
        }

        let number = self
            .numberer
            .next(tx, tenant_id, original.class, entry_date)
            .await?;
        let now = Utc::now();
        let reversal = Document {
            id: DocumentId::new_v7(),
            tenant_id,
            class: original.class,
            number,
            status: DocumentStatus::Posted,
            entry_date,
            narration: format!("Reversal of {}", original.number),
            currency: original.currency,
            exchange_rate: original.exchange_rate,
            total: original.total,
            lines: original.lines.iter().map(PostingLine::mirrored).collect(),
            effects: original.effects.iter().map(SideEffect::inverse).collect(),
            reversal_of: Some(original.id),
            reversed_by: None,
            created_by: user_id,
            created_at: now,
            posted_at: Some(now),
        };

        tx.insert_document(&reversal).await?;
        let line_ids = self.write_ledger(tx, &reversal).await?;

        original.status = DocumentStatus::Reversed;
        original.reversed_by = Some(reversal.id);
        tx.update_document(&original).await?;

        Ok(PostingReceipt::of(&reversal, line_ids))
    }

    async fn rewrite_draft(
        &self,
        tx: &mut dyn LedgerTransaction,
        id: DocumentId,
        request: &DocumentRequest,
        derivation: Derivation,
    ) -> Result<PostingReceipt, LedgerError> {
        let mut document = lock_existing(tx, request.tenant_id, id).await?;
        document.ensure_draft("update")?;

        let class = request.body.class();
        if document.class != class {
            return Err(LedgerError::validation(format!(
                "document {} is a {} and cannot be updated as a {}",
                document.number, document.class, class
            )));
        }
        if class.period_tag(document.entry_date) != class.period_tag(request.entry_date) {
            return Err(LedgerError::validation(format!(
                "document {} is numbered for another period; delete and re-create it instead",
                document.number
            )));
        }
        ensure_parties_exist(tx, request.tenant_id, &derivation.lines).await?;

        document.entry_date = request.entry_date;
        document.narration = request.narration.trim().to_string();
        document.currency = request.currency.unwrap_or(self.settings.default_currency);
        document.exchange_rate = request.exchange_rate.unwrap_or_default();
        document.total = derivation.total;
        document.lines = derivation.lines;
        document.effects = derivation.effects;
        tx.update_document(&document).await?;

        Ok(PostingReceipt::of(&document, Vec::new()))
    }

    /// Writes the document's lines and applies its side effects
    async fn write_ledger(
        &self,
        tx: &mut dyn LedgerTransaction,
        document: &Document,
    ) -> Result<Vec<LedgerLineId>, LedgerError> {
        check_balance(&document.lines, self.settings.tolerance)?;
        let lines = LedgerLine::from_document(document, document.entry_date);
        tx.insert_lines(&lines).await?;

        for effect in &document.effects {
            match effect {
                SideEffect::AdjustInvoiceDue { invoice_id, delta } => {
                    tx.adjust_invoice_due(document.tenant_id, *invoice_id, *delta)
                        .await?
                }
                SideEffect::AdjustStock { product_id, delta } => {
                    tx.adjust_stock(document.tenant_id, *product_id, *delta)
                        .await?
                }
            }
        }

        Ok(lines.into_iter().map(|l| l.id).collect())
    }
}

/// Commits on success, rolls back on failure
async fn finish<T>(
    tx: Box<dyn LedgerTransaction>,
    result: Result<T, LedgerError>,
) -> Result<T, LedgerError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback) = tx.rollback().await {
                warn!(error = %rollback, "rollback failed");
            }
            Err(err)
        }
    }
}

async fn lock_existing(
    tx: &mut dyn LedgerTransaction,
    tenant_id: TenantId,
    id: DocumentId,
) -> Result<Document, LedgerError> {
    tx.lock_document(tenant_id, id)
        .await?
        .ok_or_else(|| LedgerError::not_found(format!("document {}", id)))
}

fn ensure_actor(tenant_id: TenantId, user_id: UserId) -> Result<(), LedgerError> {
    if tenant_id.as_uuid().is_nil() {
        return Err(LedgerError::validation("tenant_id is required"));
    }
    if user_id.as_uuid().is_nil() {
        return Err(LedgerError::validation("user_id is required"));
    }
    Ok(())
}

fn require_name(name: &str, what: &str) -> Result<(), LedgerError> {
    if name.trim().is_empty() {
        return Err(LedgerError::validation(format!("{} name is required", what)));
    }
    Ok(())
}

/// Every line must hit a known, classified account, and control accounts
/// need a party
fn validate_accounts(chart: &ChartOfAccounts, lines: &[PostingLine]) -> Result<(), LedgerError> {
    for line in lines {
        if !chart.contains(&line.account_code) {
            return Err(LedgerError::reference(format!(
                "unknown account code {}",
                line.account_code
            )));
        }
        let class = chart
            .classify(&line.account_code)
            .map(|c| c.class)
            .ok_or_else(|| {
                LedgerError::validation(format!(
                    "account {} matches no classification rule and cannot be posted to",
                    line.account_code
                ))
            })?;
        match class {
            AccountClass::Receivable if line.customer_id.is_none() => {
                return Err(LedgerError::validation(format!(
                    "a customer is required on receivable account {}",
                    line.account_code
                )))
            }
            AccountClass::Payable if line.supplier_id.is_none() => {
                return Err(LedgerError::validation(format!(
                    "a supplier is required on payable account {}",
                    line.account_code
                )))
            }
            _ => {}
        }
    }
    Ok(())
}

async fn ensure_parties_exist(
    tx: &mut dyn LedgerTransaction,
    tenant_id: TenantId,
    lines: &[PostingLine],
) -> Result<(), LedgerError> {
    let customers: BTreeSet<CustomerId> = lines.iter().filter_map(|l| l.customer_id).collect();
    let suppliers: BTreeSet<SupplierId> = lines.iter().filter_map(|l| l.supplier_id).collect();

    for customer_id in customers {
        if !tx.customer_exists(tenant_id, customer_id).await? {
            return Err(LedgerError::reference(format!(
                "customer {} does not exist",
                customer_id
            )));
        }
    }
    for supplier_id in suppliers {
        if !tx.supplier_exists(tenant_id, supplier_id).await? {
            return Err(LedgerError::reference(format!(
                "supplier {} does not exist",
                supplier_id
            )));
        }
    }
    Ok(())
}

impl std::fmt::Debug for LedgerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
