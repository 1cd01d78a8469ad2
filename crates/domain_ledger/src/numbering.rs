//! Document classes and sequential document numbers
//!
//! Numbers have the shape `<PREFIX>-<seq>` or `<PREFIX>-<YYYYMM>-<seq>`,
//! zero-padded to a fixed width per class. Allocation happens inside the
//! posting transaction through a locked counter row, so two writers never
//! compute the same number.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::TenantId;

use crate::error::LedgerError;
use crate::ports::LedgerTransaction;

/// Kinds of business document the ledger accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentClass {
    JournalVoucher,
    CreditNote,
    ExpenseVoucher,
    IncomeVoucher,
    PaymentVoucher,
}

impl DocumentClass {
    pub const ALL: [DocumentClass; 5] = [
        DocumentClass::JournalVoucher,
        DocumentClass::CreditNote,
        DocumentClass::ExpenseVoucher,
        DocumentClass::IncomeVoucher,
        DocumentClass::PaymentVoucher,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            DocumentClass::JournalVoucher => "JV",
            DocumentClass::CreditNote => "CN",
            DocumentClass::ExpenseVoucher => "EXP",
            DocumentClass::IncomeVoucher => "INC",
            DocumentClass::PaymentVoucher => "PV",
        }
    }

    /// Zero-padding width of the sequence part
    pub fn width(&self) -> usize {
        match self {
            DocumentClass::CreditNote | DocumentClass::PaymentVoucher => 5,
            _ => 4,
        }
    }

    /// Classes whose sequence restarts every calendar month
    pub fn is_period_scoped(&self) -> bool {
        matches!(
            self,
            DocumentClass::JournalVoucher
                | DocumentClass::ExpenseVoucher
                | DocumentClass::IncomeVoucher
        )
    }

    /// Expense and income vouchers wait in draft until posted explicitly
    pub fn posts_on_create(&self) -> bool {
        !matches!(
            self,
            DocumentClass::ExpenseVoucher | DocumentClass::IncomeVoucher
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentClass::JournalVoucher => "journal_voucher",
            DocumentClass::CreditNote => "credit_note",
            DocumentClass::ExpenseVoucher => "expense_voucher",
            DocumentClass::IncomeVoucher => "income_voucher",
            DocumentClass::PaymentVoucher => "payment_voucher",
        }
    }

    /// `YYYYMM` period tag for period-scoped classes
    pub fn period_tag(&self, entry_date: NaiveDate) -> Option<String> {
        self.is_period_scoped()
            .then(|| format!("{:04}{:02}", entry_date.year(), entry_date.month()))
    }

    pub fn format_number(&self, period: Option<&str>, sequence: u64) -> String {
        match period {
            Some(tag) => format!(
                "{}-{}-{:0width$}",
                self.prefix(),
                tag,
                sequence,
                width = self.width()
            ),
            None => format!("{}-{:0width$}", self.prefix(), sequence, width = self.width()),
        }
    }

    /// Number prefix including the period tag, e.g. `JV-202401-`
    pub fn scope_prefix(&self, period: Option<&str>) -> String {
        match period {
            Some(tag) => format!("{}-{}-", self.prefix(), tag),
            None => format!("{}-", self.prefix()),
        }
    }
}

impl fmt::Display for DocumentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentClass {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentClass::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| LedgerError::validation(format!("unknown document class: {}", s)))
    }
}

/// Extracts the numeric sequence from a number within the given scope
///
/// Returns `None` when the number belongs to another scope or the tail is
/// not numeric.
pub fn parse_sequence(number: &str, scope_prefix: &str) -> Option<u64> {
    number.strip_prefix(scope_prefix)?.parse().ok()
}

/// Allocates document numbers through the transaction's counter row
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentNumberer;

impl DocumentNumberer {
    pub fn new() -> Self {
        Self
    }

    /// Returns the next number for `(tenant, class[, period])`
    ///
    /// Must be called with the same transaction that inserts the document.
    pub async fn next(
        &self,
        tx: &mut dyn LedgerTransaction,
        tenant_id: TenantId,
        class: DocumentClass,
        entry_date: NaiveDate,
    ) -> Result<String, LedgerError> {
        let period = class.period_tag(entry_date);
        let sequence = tx.next_sequence(tenant_id, class, period.as_deref()).await?;
        let number = class.format_number(period.as_deref(), sequence);
        debug!(tenant_id = %tenant_id, class = %class, number = %number, "allocated document number");
        Ok(number)
    }
}
