//! Custom Test Assertions
//!
//! Assertion helpers for ledger types that give more meaningful failure
//! messages than bare `assert!`.

use core_kernel::Money;
use rust_decimal::Decimal;

use domain_ledger::{
    BalanceSheet, CashFlowStatement, Document, DocumentStatus, LedgerError, TrialBalance,
};

/// Asserts that two Money values are approximately equal within a tolerance
///
/// # Panics
///
/// Panics if the currencies don't match or the amounts differ by more than tolerance
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts that total debits equal total credits
pub fn assert_trial_balance_balanced(tb: &TrialBalance) {
    assert!(
        tb.totals.is_balanced,
        "Trial balance out of balance: debit={}, credit={}, difference={}",
        tb.totals.debit,
        tb.totals.credit,
        tb.totals.difference
    );
}

/// Asserts assets equal liabilities plus equity
pub fn assert_balance_sheet_ties_out(bs: &BalanceSheet) {
    assert!(
        bs.totals.is_balanced,
        "Balance sheet does not tie out as of {}: assets={}, liabilities+equity={}, difference={}",
        bs.as_of,
        bs.totals.total_assets,
        bs.totals.total_liabilities_and_equity,
        bs.totals.difference
    );
}

/// Asserts opening cash plus net flow equals closing cash
pub fn assert_cash_reconciled(cf: &CashFlowStatement) {
    let rec = &cf.reconciliation;
    assert!(
        rec.is_reconciled,
        "Cash flow does not reconcile for {}..{}: opening={}, net={}, closing={}, difference={}",
        cf.from,
        cf.to,
        rec.opening_cash,
        rec.net_cash_flow,
        rec.closing_cash,
        rec.difference
    );
}

/// Asserts an error has the expected kind, as reported by `LedgerError::kind`
pub fn assert_error_kind<T: std::fmt::Debug>(result: &Result<T, LedgerError>, kind: &str) {
    match result {
        Ok(value) => panic!("Expected {} error, got Ok({:?})", kind, value),
        Err(err) => assert_eq!(
            err.kind(),
            kind,
            "Expected {} error, got {}: {}",
            kind,
            err.kind(),
            err
        ),
    }
}

/// Asserts a document is in the given status
pub fn assert_status(document: &Document, status: DocumentStatus) {
    assert_eq!(
        document.status, status,
        "Document {} expected {}, was {}",
        document.number, status, document.status
    );
}
