//! Trial balance over a period
//!
//! Lists every account with activity in `[from, to]`. The period's raw
//! movement goes to the debit column when negative and to the credit column
//! when positive; rows are grouped by account type and sub-type.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::account::{AccountType, ChartOfAccounts};
use crate::balance::BalanceWindow;

use super::log_excluded;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub account_code: String,
    pub account_name: String,
    /// Raw balance before the period
    pub opening_balance: Decimal,
    /// Raw balance at the end of the period
    pub closing_balance: Decimal,
    pub debit: Decimal,
    pub credit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceSection {
    pub account_type: AccountType,
    pub sub_type: String,
    pub rows: Vec<TrialBalanceRow>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    pub debit: Decimal,
    pub credit: Decimal,
    pub difference: Decimal,
    pub is_balanced: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalance {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub sections: Vec<TrialBalanceSection>,
    pub totals: TrialBalanceTotals,
    pub excluded_accounts: Vec<String>,
}

pub fn build_trial_balance(
    chart: &ChartOfAccounts,
    windows: &[BalanceWindow],
    from: NaiveDate,
    to: NaiveDate,
    tolerance: Decimal,
) -> TrialBalance {
    let mut grouped: BTreeMap<(AccountType, String), TrialBalanceSection> = BTreeMap::new();
    let mut excluded = Vec::new();

    for window in windows.iter().filter(|w| w.has_activity()) {
        let Some(classification) = chart.classify(&window.account_code) else {
            excluded.push(window.account_code.clone());
            continue;
        };

        let movement = window.period_credit - window.period_debit;
        let (debit, credit) = if movement.is_sign_negative() {
            (-movement, Decimal::ZERO)
        } else {
            (Decimal::ZERO, movement)
        };

        let section = grouped
            .entry((classification.account_type, classification.sub_type.clone()))
            .or_insert_with(|| TrialBalanceSection {
                account_type: classification.account_type,
                sub_type: classification.sub_type.clone(),
                rows: Vec::new(),
                total_debit: Decimal::ZERO,
                total_credit: Decimal::ZERO,
            });
        section.total_debit += debit;
        section.total_credit += credit;
        section.rows.push(TrialBalanceRow {
            account_code: window.account_code.clone(),
            account_name: chart.name_of(&window.account_code),
            opening_balance: window.opening_balance,
            closing_balance: window.closing_balance,
            debit,
            credit,
        });
    }

    log_excluded("trial_balance", &excluded);

    let sections: Vec<_> = grouped.into_values().collect();
    let debit: Decimal = sections.iter().map(|s| s.total_debit).sum();
    let credit: Decimal = sections.iter().map(|s| s.total_credit).sum();
    let difference = (debit - credit).abs();

    TrialBalance {
        from,
        to,
        sections,
        totals: TrialBalanceTotals {
            debit,
            credit,
            difference,
            is_balanced: difference < tolerance,
        },
        excluded_accounts: excluded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::StandardChart;
    use crate::document::BALANCE_TOLERANCE;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn window(code: &str, opening: Decimal, debit: Decimal, credit: Decimal) -> BalanceWindow {
        BalanceWindow {
            account_code: code.to_string(),
            opening_balance: opening,
            closing_balance: opening + credit - debit,
            period_debit: debit,
            period_credit: credit,
        }
    }

    #[test]
    fn test_empty_period_is_balanced() {
        let tb = build_trial_balance(&StandardChart::chart(), &[], date(1), date(31), BALANCE_TOLERANCE);
        assert!(tb.sections.is_empty());
        assert_eq!(tb.totals.debit, dec!(0));
        assert_eq!(tb.totals.credit, dec!(0));
        assert!(tb.totals.is_balanced);
    }

    #[test]
    fn test_accounts_without_period_activity_are_skipped() {
        let windows = vec![
            window("1000", dec!(-100), dec!(0), dec!(0)),
            window("1000", dec!(0), dec!(0), dec!(0)),
        ];
        let tb = build_trial_balance(&StandardChart::chart(), &windows, date(1), date(31), BALANCE_TOLERANCE);
        assert!(tb.sections.is_empty());
    }

    #[test]
    fn test_rows_split_by_sign_and_grouped() {
        let windows = vec![
            window("1000", dec!(0), dec!(1000), dec!(0)),
            window("4000", dec!(0), dec!(0), dec!(1000)),
            window("9100", dec!(0), dec!(5), dec!(0)),
        ];
        let tb = build_trial_balance(&StandardChart::chart(), &windows, date(1), date(31), BALANCE_TOLERANCE);

        assert_eq!(tb.sections.len(), 2);
        assert_eq!(tb.sections[0].account_type, AccountType::Asset);
        assert_eq!(tb.sections[0].rows[0].debit, dec!(1000));
        assert_eq!(tb.sections[1].account_type, AccountType::Revenue);
        assert_eq!(tb.sections[1].rows[0].credit, dec!(1000));
        assert!(tb.totals.is_balanced);
        assert_eq!(tb.excluded_accounts, vec!["9100".to_string()]);
    }

    #[test]
    fn test_columns_follow_period_movement_not_closing_balance() {
        // cash still carries a debit balance but moved to the credit side
        let windows = vec![
            window("1000", dec!(-500), dec!(0), dec!(200)),
            window("1010", dec!(0), dec!(200), dec!(0)),
        ];
        let tb = build_trial_balance(&StandardChart::chart(), &windows, date(1), date(31), BALANCE_TOLERANCE);

        let rows = &tb.sections[0].rows;
        let cash = rows.iter().find(|r| r.account_code == "1000").unwrap();
        assert_eq!(cash.closing_balance, dec!(-300));
        assert_eq!(cash.debit, dec!(0));
        assert_eq!(cash.credit, dec!(200));

        let bank = rows.iter().find(|r| r.account_code == "1010").unwrap();
        assert_eq!(bank.debit, dec!(200));
        assert_eq!(tb.totals.debit, tb.totals.credit);
        assert!(tb.totals.is_balanced);
    }
}
