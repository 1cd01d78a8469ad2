//! Balance sheet as of a date
//!
//! Assets are presented sign-flipped, liabilities and equity as recorded.
//! Income-statement balances not yet closed into equity are folded into a
//! synthetic retained earnings line so the statement ties out without a
//! closing entry.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::account::{AccountType, ChartOfAccounts};
use crate::balance::RawBalance;

use super::sign::present;
use super::{log_excluded, ReportLine, StatementSection};

pub const RETAINED_EARNINGS: &str = "Retained Earnings";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheetTotals {
    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    pub total_equity: Decimal,
    pub total_liabilities_and_equity: Decimal,
    pub difference: Decimal,
    pub is_balanced: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub as_of: NaiveDate,
    /// `current_assets`, `fixed_assets`, `current_liabilities`,
    /// `long_term_liabilities`, `equity`
    pub sections: Vec<StatementSection>,
    pub totals: BalanceSheetTotals,
    pub excluded_accounts: Vec<String>,
}

impl BalanceSheet {
    pub fn section(&self, key: &str) -> Option<&StatementSection> {
        self.sections.iter().find(|s| s.key == key)
    }
}

pub fn build_balance_sheet(
    chart: &ChartOfAccounts,
    balances: &[RawBalance],
    as_of: NaiveDate,
    tolerance: Decimal,
) -> BalanceSheet {
    let mut current_assets = StatementSection::new("current_assets", "Current Assets");
    let mut fixed_assets = StatementSection::new("fixed_assets", "Fixed Assets");
    let mut current_liabilities = StatementSection::new("current_liabilities", "Current Liabilities");
    let mut long_term = StatementSection::new("long_term_liabilities", "Long-term Liabilities");
    let mut equity = StatementSection::new("equity", "Equity");

    let mut retained = Decimal::ZERO;
    let mut excluded = Vec::new();

    for balance in balances {
        let Some(classification) = chart.classify(&balance.account_code) else {
            excluded.push(balance.account_code.clone());
            continue;
        };
        if classification.account_type.is_income_statement() {
            retained += balance.balance;
            continue;
        }
        if balance.balance.is_zero() {
            continue;
        }

        let amount = present(classification.account_type, balance.balance);
        let section = match (classification.account_type, classification.class.is_current()) {
            (AccountType::Asset, true) => &mut current_assets,
            (AccountType::Asset, false) => &mut fixed_assets,
            (AccountType::Liability, true) => &mut current_liabilities,
            (AccountType::Liability, false) => &mut long_term,
            _ => &mut equity,
        };
        section.push_account(chart, &balance.account_code, amount);
    }

    equity.push(ReportLine {
        account_code: None,
        account_name: RETAINED_EARNINGS.to_string(),
        amount: retained,
    });

    log_excluded("balance_sheet", &excluded);

    let total_assets = current_assets.total + fixed_assets.total;
    let total_liabilities = current_liabilities.total + long_term.total;
    let total_equity = equity.total;
    let total_liabilities_and_equity = total_liabilities + total_equity;
    let difference = (total_assets - total_liabilities_and_equity).abs();

    BalanceSheet {
        as_of,
        sections: vec![current_assets, fixed_assets, current_liabilities, long_term, equity],
        totals: BalanceSheetTotals {
            total_assets,
            total_liabilities,
            total_equity,
            total_liabilities_and_equity,
            difference,
            is_balanced: difference < tolerance,
        },
        excluded_accounts: excluded,
    }
}
