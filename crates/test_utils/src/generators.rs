//! Property-Based Test Generators
//!
//! Proptest strategies for amounts, dates and balanced journals.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::Currency;
use domain_ledger::requests::JournalLineInput;

use crate::fixtures::AccountFixtures;

/// Strategy for generating valid Currency values
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::GBP),
        Just(Currency::JPY),
        Just(Currency::CHF),
        Just(Currency::INR),
    ]
}

/// Positive two-decimal amounts from 0.01 to 1,000,000.00
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Any day in 2024
pub fn entry_date_2024() -> impl Strategy<Value = NaiveDate> {
    (1u32..=366).prop_map(|ordinal| {
        NaiveDate::from_yo_opt(2024, ordinal).unwrap_or_else(|| NaiveDate::MIN)
    })
}

/// Accounts that never need a party on the line
pub fn plain_account_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just(AccountFixtures::CASH),
        Just(AccountFixtures::BANK),
        Just(AccountFixtures::INVENTORY),
        Just(AccountFixtures::EQUIPMENT),
        Just(AccountFixtures::LONG_TERM_LOAN),
        Just(AccountFixtures::CAPITAL),
        Just(AccountFixtures::SALES),
        Just(AccountFixtures::COST_OF_SALES),
        Just(AccountFixtures::RENT),
    ]
}

/// Journal lines whose debits and credits sum to the same total
///
/// Produces 1-5 debit lines and one credit line for their sum.
pub fn balanced_lines_strategy() -> impl Strategy<Value = Vec<JournalLineInput>> {
    (
        prop::collection::vec((plain_account_strategy(), amount_strategy()), 1..=5),
        plain_account_strategy(),
    )
        .prop_map(|(debits, credit_account)| {
            let total: Decimal = debits.iter().map(|(_, amount)| *amount).sum();
            let mut lines: Vec<JournalLineInput> = debits
                .into_iter()
                .map(|(code, amount)| journal_line(code, amount, Decimal::ZERO))
                .collect();
            lines.push(journal_line(credit_account, Decimal::ZERO, total));
            lines
        })
}

/// Balanced lines with one side skewed by at least one cent
pub fn unbalanced_lines_strategy() -> impl Strategy<Value = Vec<JournalLineInput>> {
    (balanced_lines_strategy(), amount_strategy()).prop_map(|(mut lines, skew)| {
        if let Some(last) = lines.last_mut() {
            last.credit += skew;
        }
        lines
    })
}

fn journal_line(code: &str, debit: Decimal, credit: Decimal) -> JournalLineInput {
    JournalLineInput {
        account_code: code.to_string(),
        debit,
        credit,
        customer_id: None,
        supplier_id: None,
        memo: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn balanced_lines_sum_equal(lines in balanced_lines_strategy()) {
            let debits: Decimal = lines.iter().map(|l| l.debit).sum();
            let credits: Decimal = lines.iter().map(|l| l.credit).sum();
            prop_assert_eq!(debits, credits);
        }

        #[test]
        fn unbalanced_lines_differ(lines in unbalanced_lines_strategy()) {
            let debits: Decimal = lines.iter().map(|l| l.debit).sum();
            let credits: Decimal = lines.iter().map(|l| l.credit).sum();
            prop_assert!(credits - debits >= Decimal::new(1, 2));
        }
    }
}
