//! Profit and loss over a period

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::account::{AccountType, ChartOfAccounts};
use crate::balance::BalanceWindow;

use super::sign::present;
use super::{log_excluded, StatementSection};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitAndLossTotals {
    pub revenue: Decimal,
    pub cost_of_sales: Decimal,
    pub gross_profit: Decimal,
    pub expenses: Decimal,
    pub net_profit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitAndLoss {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub sections: Vec<StatementSection>,
    pub totals: ProfitAndLossTotals,
    pub excluded_accounts: Vec<String>,
}

impl ProfitAndLoss {
    pub fn section(&self, key: &str) -> Option<&StatementSection> {
        self.sections.iter().find(|s| s.key == key)
    }
}

/// Income-statement movement within the window, presented positive when natural.
/// Balance-sheet accounts are ignored.
pub fn build_profit_and_loss(
    chart: &ChartOfAccounts,
    windows: &[BalanceWindow],
    from: NaiveDate,
    to: NaiveDate,
) -> ProfitAndLoss {
    let mut revenue = StatementSection::new("revenue", "Revenue");
    let mut cost_of_sales = StatementSection::new("cost_of_sales", "Cost of Sales");
    let mut expenses = StatementSection::new("expenses", "Expenses");
    let mut excluded = Vec::new();

    for window in windows.iter().filter(|w| w.has_activity()) {
        let Some(classification) = chart.classify(&window.account_code) else {
            excluded.push(window.account_code.clone());
            continue;
        };
        let section = match classification.account_type {
            AccountType::Revenue => &mut revenue,
            AccountType::CostOfSales => &mut cost_of_sales,
            AccountType::Expense => &mut expenses,
            _ => continue,
        };
        let amount = present(classification.account_type, window.movement());
        section.push_account(chart, &window.account_code, amount);
    }

    log_excluded("profit_and_loss", &excluded);

    let gross_profit = revenue.total - cost_of_sales.total;
    let net_profit = gross_profit - expenses.total;
    let totals = ProfitAndLossTotals {
        revenue: revenue.total,
        cost_of_sales: cost_of_sales.total,
        gross_profit,
        expenses: expenses.total,
        net_profit,
    };

    ProfitAndLoss {
        from,
        to,
        sections: vec![revenue, cost_of_sales, expenses],
        totals,
        excluded_accounts: excluded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::StandardChart;
    use rust_decimal_macros::dec;

    fn window(code: &str, debit: Decimal, credit: Decimal) -> BalanceWindow {
        BalanceWindow {
            account_code: code.to_string(),
            opening_balance: dec!(0),
            closing_balance: credit - debit,
            period_debit: debit,
            period_credit: credit,
        }
    }

    fn jan(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_gross_and_net_profit() {
        let windows = vec![
            window("1000", dec!(1000), dec!(700)),
            window("4000", dec!(0), dec!(1000)),
            window("4100", dec!(100), dec!(0)),
            window("5000", dec!(400), dec!(0)),
            window("6100", dec!(200), dec!(0)),
        ];
        let pl = build_profit_and_loss(&StandardChart::chart(), &windows, jan(1), jan(31));

        assert_eq!(pl.totals.revenue, dec!(900));
        assert_eq!(pl.totals.cost_of_sales, dec!(400));
        assert_eq!(pl.totals.gross_profit, dec!(500));
        assert_eq!(pl.totals.expenses, dec!(200));
        assert_eq!(pl.totals.net_profit, dec!(300));
        assert_eq!(pl.section("revenue").unwrap().lines.len(), 2);
        assert!(pl.excluded_accounts.is_empty());
    }

    #[test]
    fn test_unclassified_excluded() {
        let windows = vec![window("8800", dec!(10), dec!(0)), window("4000", dec!(0), dec!(10))];
        let pl = build_profit_and_loss(&StandardChart::chart(), &windows, jan(1), jan(31));
        assert_eq!(pl.excluded_accounts, vec!["8800".to_string()]);
        assert_eq!(pl.totals.net_profit, dec!(10));
    }
}
