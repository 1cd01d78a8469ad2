//! Documents, ledger lines and the balance check
//!
//! A document is created in `draft` or directly `posted` depending on its
//! class. Posting writes its lines to the ledger exactly once; afterwards the
//! lines are never touched again and a reversal is a new, mirrored document.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{
    Currency, CustomerId, DocumentId, ExchangeRate, InvoiceId, LedgerLineId, ProductId,
    SupplierId, TenantId, UserId,
};

use crate::error::LedgerError;
use crate::numbering::DocumentClass;

/// Differences below this amount are treated as balanced
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Lifecycle status of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Draft,
    Posted,
    Reversed,
    Cancelled,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Posted => "posted",
            DocumentStatus::Reversed => "reversed",
            DocumentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(DocumentStatus::Draft),
            "posted" => Ok(DocumentStatus::Posted),
            "reversed" => Ok(DocumentStatus::Reversed),
            "cancelled" => Ok(DocumentStatus::Cancelled),
            other => Err(LedgerError::validation(format!("unknown document status: {}", other))),
        }
    }
}

/// A proposed debit or credit, before it is written to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingLine {
    pub account_code: String,
    pub debit: Decimal,
    pub credit: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<SupplierId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl PostingLine {
    pub fn debit(account_code: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account_code: account_code.into(),
            debit: amount,
            credit: Decimal::ZERO,
            customer_id: None,
            supplier_id: None,
            memo: None,
        }
    }

    pub fn credit(account_code: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account_code: account_code.into(),
            debit: Decimal::ZERO,
            credit: amount,
            customer_id: None,
            supplier_id: None,
            memo: None,
        }
    }

    pub fn with_customer(mut self, customer_id: Option<CustomerId>) -> Self {
        self.customer_id = customer_id;
        self
    }

    pub fn with_supplier(mut self, supplier_id: Option<SupplierId>) -> Self {
        self.supplier_id = supplier_id;
        self
    }

    pub fn with_memo(mut self, memo: Option<String>) -> Self {
        self.memo = memo;
        self
    }

    /// Exactly one side carries a positive amount
    pub fn is_one_sided(&self) -> bool {
        let debit = self.debit > Decimal::ZERO;
        let credit = self.credit > Decimal::ZERO;
        !self.debit.is_sign_negative()
            && !self.credit.is_sign_negative()
            && (debit ^ credit)
    }

    /// The same line with debit and credit swapped
    pub fn mirrored(&self) -> Self {
        Self {
            debit: self.credit,
            credit: self.debit,
            ..self.clone()
        }
    }
}

/// An immutable row in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub id: LedgerLineId,
    pub tenant_id: TenantId,
    pub document_id: DocumentId,
    pub line_no: i32,
    pub account_code: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub entry_date: NaiveDate,
    pub customer_id: Option<CustomerId>,
    pub supplier_id: Option<SupplierId>,
    pub memo: Option<String>,
}

impl LedgerLine {
    /// Materializes the proposed lines of a document being posted
    pub fn from_document(document: &Document, entry_date: NaiveDate) -> Vec<LedgerLine> {
        document
            .lines
            .iter()
            .enumerate()
            .map(|(idx, line)| LedgerLine {
                id: LedgerLineId::new_v7(),
                tenant_id: document.tenant_id,
                document_id: document.id,
                line_no: idx as i32 + 1,
                account_code: line.account_code.clone(),
                debit: line.debit,
                credit: line.credit,
                entry_date,
                customer_id: line.customer_id,
                supplier_id: line.supplier_id,
                memo: line.memo.clone(),
            })
            .collect()
    }
}

/// Changes to sub-ledger state that must commit together with a posting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SideEffect {
    /// Moves an invoice's outstanding amount by `delta`
    AdjustInvoiceDue { invoice_id: InvoiceId, delta: Decimal },
    /// Moves a product's on-hand quantity by `delta`
    AdjustStock { product_id: ProductId, delta: Decimal },
}

impl SideEffect {
    /// The effect that undoes this one
    pub fn inverse(&self) -> Self {
        match self {
            SideEffect::AdjustInvoiceDue { invoice_id, delta } => SideEffect::AdjustInvoiceDue {
                invoice_id: *invoice_id,
                delta: -*delta,
            },
            SideEffect::AdjustStock { product_id, delta } => SideEffect::AdjustStock {
                product_id: *product_id,
                delta: -*delta,
            },
        }
    }
}

/// Document header together with its proposed lines and side effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub tenant_id: TenantId,
    pub class: DocumentClass,
    pub number: String,
    pub status: DocumentStatus,
    pub entry_date: NaiveDate,
    pub narration: String,
    pub currency: Currency,
    pub exchange_rate: ExchangeRate,
    /// Server-computed document total
    pub total: Decimal,
    pub lines: Vec<PostingLine>,
    pub effects: Vec<SideEffect>,
    pub reversal_of: Option<DocumentId>,
    pub reversed_by: Option<DocumentId>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub posted_at: Option<DateTime<Utc>>,
}

impl Document {
    pub fn is_draft(&self) -> bool {
        self.status == DocumentStatus::Draft
    }

    /// Only posted originals can be reversed, and only once
    pub fn ensure_reversible(&self) -> Result<(), LedgerError> {
        if self.reversal_of.is_some() {
            return Err(LedgerError::reference(format!(
                "document {} is itself a reversal and cannot be reversed",
                self.number
            )));
        }
        match self.status {
            DocumentStatus::Posted => Ok(()),
            DocumentStatus::Reversed => Err(LedgerError::reference(format!(
                "document {} has already been reversed",
                self.number
            ))),
            other => Err(LedgerError::reference(format!(
                "document {} is {} and has no ledger entries to reverse",
                self.number, other
            ))),
        }
    }

    pub fn ensure_draft(&self, action: &str) -> Result<(), LedgerError> {
        if !self.is_draft() {
            return Err(LedgerError::validation(format!(
                "cannot {} document {} in status {}",
                action, self.number, self.status
            )));
        }
        Ok(())
    }
}

/// Debit and credit totals of a set of lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTotals {
    pub debits: Decimal,
    pub credits: Decimal,
}

impl LineTotals {
    pub fn of(lines: &[PostingLine]) -> Self {
        lines.iter().fold(
            LineTotals {
                debits: Decimal::ZERO,
                credits: Decimal::ZERO,
            },
            |acc, line| LineTotals {
                debits: acc.debits + line.debit,
                credits: acc.credits + line.credit,
            },
        )
    }

    pub fn difference(&self) -> Decimal {
        (self.debits - self.credits).abs()
    }

    pub fn is_balanced(&self, tolerance: Decimal) -> bool {
        self.difference() < tolerance
    }
}

/// Checks the line shape and the central debit = credit invariant
///
/// # Errors
///
/// - `Validation` when there are fewer than two lines, a line is not
///   one-sided, or one side is missing entirely
/// - `Unbalanced` when the totals differ by the tolerance or more
pub fn check_balance(lines: &[PostingLine], tolerance: Decimal) -> Result<LineTotals, LedgerError> {
    if lines.len() < 2 {
        return Err(LedgerError::validation(
            "a posting needs at least two lines",
        ));
    }
    if let Some(bad) = lines.iter().find(|l| !l.is_one_sided()) {
        return Err(LedgerError::validation(format!(
            "line on account {} must carry exactly one non-negative, non-zero amount",
            bad.account_code
        )));
    }

    let totals = LineTotals::of(lines);
    if !totals.is_balanced(tolerance) {
        return Err(LedgerError::Unbalanced {
            debits: totals.debits,
            credits: totals.credits,
        });
    }
    if totals.debits.is_zero() {
        return Err(LedgerError::validation("a posting must move a non-zero amount"));
    }
    Ok(totals)
}
