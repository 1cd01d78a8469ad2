//! Cash flow statement, indirect method
//!
//! Starts from net income and adjusts for the movement of every non-cash
//! balance sheet account. Because every posted document balances, the sum of
//! those raw movements equals the change in cash, which is checked in
//! [`CashReconciliation`].

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::account::{AccountClass, ChartOfAccounts};
use crate::balance::BalanceWindow;

use super::{log_excluded, ReportLine, StatementSection};

pub const NET_INCOME: &str = "Net income";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashFlowActivity {
    Operating,
    Investing,
    Financing,
}

impl CashFlowActivity {
    pub fn key(&self) -> &'static str {
        match self {
            CashFlowActivity::Operating => "operating",
            CashFlowActivity::Investing => "investing",
            CashFlowActivity::Financing => "financing",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            CashFlowActivity::Operating => "Operating Activities",
            CashFlowActivity::Investing => "Investing Activities",
            CashFlowActivity::Financing => "Financing Activities",
        }
    }
}

impl fmt::Display for CashFlowActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Activity a class's movement is reported under; `None` for cash itself.
///
/// Income-statement classes map to operating and are rolled into the net
/// income line rather than listed one by one.
pub fn activity_of(class: AccountClass) -> Option<CashFlowActivity> {
    match class {
        AccountClass::Cash => None,
        AccountClass::Revenue
        | AccountClass::CostOfSales
        | AccountClass::Expense
        | AccountClass::AccumulatedDepreciation
        | AccountClass::Receivable
        | AccountClass::Inventory
        | AccountClass::OtherCurrentAsset
        | AccountClass::Payable
        | AccountClass::OtherCurrentLiability => Some(CashFlowActivity::Operating),
        AccountClass::FixedAsset => Some(CashFlowActivity::Investing),
        AccountClass::ShortTermDebt | AccountClass::LongTermLiability | AccountClass::Equity => {
            Some(CashFlowActivity::Financing)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowTotals {
    pub net_income: Decimal,
    pub operating: Decimal,
    pub investing: Decimal,
    pub financing: Decimal,
    pub net_cash_flow: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashReconciliation {
    pub opening_cash: Decimal,
    pub net_cash_flow: Decimal,
    pub closing_cash: Decimal,
    /// `|opening + net - closing|`
    pub difference: Decimal,
    pub is_reconciled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowStatement {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub sections: Vec<StatementSection>,
    pub totals: CashFlowTotals,
    pub reconciliation: CashReconciliation,
    pub excluded_accounts: Vec<String>,
}

impl CashFlowStatement {
    pub fn section(&self, activity: CashFlowActivity) -> Option<&StatementSection> {
        self.sections.iter().find(|s| s.key == activity.key())
    }
}

pub fn build_cash_flow(
    chart: &ChartOfAccounts,
    windows: &[BalanceWindow],
    from: NaiveDate,
    to: NaiveDate,
    tolerance: Decimal,
) -> CashFlowStatement {
    let mut operating_adjustments = Vec::new();
    let mut investing = StatementSection::new(
        CashFlowActivity::Investing.key(),
        CashFlowActivity::Investing.title(),
    );
    let mut financing = StatementSection::new(
        CashFlowActivity::Financing.key(),
        CashFlowActivity::Financing.title(),
    );

    let mut net_income = Decimal::ZERO;
    let mut opening_cash = Decimal::ZERO;
    let mut closing_cash = Decimal::ZERO;
    let mut excluded = Vec::new();

    for window in windows {
        let Some(classification) = chart.classify(&window.account_code) else {
            if window.has_activity() {
                excluded.push(window.account_code.clone());
            }
            continue;
        };

        let Some(activity) = activity_of(classification.class) else {
            opening_cash -= window.opening_balance;
            closing_cash -= window.closing_balance;
            continue;
        };

        let movement = window.movement();
        if movement.is_zero() {
            continue;
        }
        if classification.account_type.is_income_statement() {
            net_income += movement;
            continue;
        }

        let line = ReportLine {
            account_code: Some(window.account_code.clone()),
            account_name: chart.name_of(&window.account_code),
            amount: movement,
        };
        match activity {
            CashFlowActivity::Operating => operating_adjustments.push(line),
            CashFlowActivity::Investing => investing.push(line),
            CashFlowActivity::Financing => financing.push(line),
        }
    }

    log_excluded("cash_flow", &excluded);

    let mut operating = StatementSection::new(
        CashFlowActivity::Operating.key(),
        CashFlowActivity::Operating.title(),
    );
    operating.push(ReportLine {
        account_code: None,
        account_name: NET_INCOME.to_string(),
        amount: net_income,
    });
    for line in operating_adjustments {
        operating.push(line);
    }

    let net_cash_flow = operating.total + investing.total + financing.total;
    let difference = (opening_cash + net_cash_flow - closing_cash).abs();
    let is_reconciled = difference < tolerance;
    if !is_reconciled {
        warn!(
            %from,
            %to,
            %opening_cash,
            %closing_cash,
            %net_cash_flow,
            "cash flow does not reconcile to the change in cash"
        );
    }

    CashFlowStatement {
        from,
        to,
        totals: CashFlowTotals {
            net_income,
            operating: operating.total,
            investing: investing.total,
            financing: financing.total,
            net_cash_flow,
        },
        sections: vec![operating, investing, financing],
        reconciliation: CashReconciliation {
            opening_cash,
            net_cash_flow,
            closing_cash,
            difference,
            is_reconciled,
        },
        excluded_accounts: excluded,
    }
}
