//! Financial statement derivation
//!
//! All four statements share the same inputs: raw balances from the
//! [`BalanceAggregator`] and the chart's classification. They differ only in
//! the window they aggregate over, the sign table in [`sign`], and how
//! classes are laid out into sections.
//!
//! Accounts whose code matches no classification rule are left out of the
//! statement sections. Their codes are reported in `excluded_accounts` and
//! logged at `warn`.

pub mod balance_sheet;
pub mod cash_flow;
pub mod profit_loss;
pub mod sign;
pub mod trial_balance;

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use core_kernel::TenantId;

use crate::account::ChartOfAccounts;
use crate::balance::BalanceAggregator;
use crate::document::BALANCE_TOLERANCE;
use crate::error::LedgerError;
use crate::ports::LedgerStore;

pub use balance_sheet::{build_balance_sheet, BalanceSheet, BalanceSheetTotals};
pub use cash_flow::{
    activity_of, build_cash_flow, CashFlowActivity, CashFlowStatement, CashFlowTotals,
    CashReconciliation,
};
pub use profit_loss::{build_profit_and_loss, ProfitAndLoss, ProfitAndLossTotals};
pub use trial_balance::{
    build_trial_balance, TrialBalance, TrialBalanceRow, TrialBalanceSection, TrialBalanceTotals,
};

/// One presented amount in a statement section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLine {
    /// `None` for synthetic lines such as retained earnings or net income
    pub account_code: Option<String>,
    pub account_name: String,
    pub amount: Decimal,
}

/// A titled group of lines with its total
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSection {
    pub key: String,
    pub title: String,
    pub lines: Vec<ReportLine>,
    pub total: Decimal,
}

impl StatementSection {
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            lines: Vec::new(),
            total: Decimal::ZERO,
        }
    }

    pub fn push(&mut self, line: ReportLine) {
        self.total += line.amount;
        self.lines.push(line);
    }

    pub fn push_account(&mut self, chart: &ChartOfAccounts, code: &str, amount: Decimal) {
        self.push(ReportLine {
            account_code: Some(code.to_string()),
            account_name: chart.name_of(code),
            amount,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Logs accounts a statement had to leave out
pub(crate) fn log_excluded(report: &str, excluded: &[String]) {
    if !excluded.is_empty() {
        warn!(
            report,
            count = excluded.len(),
            accounts = ?excluded,
            "unclassified accounts excluded from report"
        );
    }
}

/// Builds statements for a tenant from the posted ledger
#[derive(Clone)]
pub struct FinancialReports {
    store: Arc<dyn LedgerStore>,
    aggregator: BalanceAggregator,
    tolerance: Decimal,
}

impl FinancialReports {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            aggregator: BalanceAggregator::new(Arc::clone(&store)),
            store,
            tolerance: BALANCE_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn aggregator(&self) -> &BalanceAggregator {
        &self.aggregator
    }

    async fn chart(&self, tenant_id: TenantId) -> Result<ChartOfAccounts, LedgerError> {
        Ok(ChartOfAccounts::from_accounts(self.store.accounts(tenant_id).await?))
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn trial_balance(
        &self,
        tenant_id: TenantId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<TrialBalance, LedgerError> {
        let chart = self.chart(tenant_id).await?;
        let windows = self.aggregator.balances_between(tenant_id, None, from, to).await?;
        Ok(build_trial_balance(&chart, &windows, from, to, self.tolerance))
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn balance_sheet(
        &self,
        tenant_id: TenantId,
        as_of: NaiveDate,
    ) -> Result<BalanceSheet, LedgerError> {
        let chart = self.chart(tenant_id).await?;
        let balances = self.aggregator.balances_as_of(tenant_id, None, as_of).await?;
        Ok(build_balance_sheet(&chart, &balances, as_of, self.tolerance))
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn profit_and_loss(
        &self,
        tenant_id: TenantId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<ProfitAndLoss, LedgerError> {
        let chart = self.chart(tenant_id).await?;
        let windows = self.aggregator.balances_between(tenant_id, None, from, to).await?;
        Ok(build_profit_and_loss(&chart, &windows, from, to))
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn cash_flow(
        &self,
        tenant_id: TenantId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<CashFlowStatement, LedgerError> {
        let chart = self.chart(tenant_id).await?;
        let windows = self.aggregator.balances_between(tenant_id, None, from, to).await?;
        Ok(build_cash_flow(&chart, &windows, from, to, self.tolerance))
    }
}
