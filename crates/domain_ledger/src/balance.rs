//! Balance aggregation
//!
//! Every balance here is *raw*: credits minus debits. Natural-credit
//! accounts (liabilities, equity, revenue) come out positive and
//! natural-debit accounts (assets, cost of sales, expenses) come out
//! negative. Presentation signs are applied by the report engine.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use core_kernel::TenantId;

use crate::error::LedgerError;
use crate::ports::{AccountSums, LedgerStore, LineFilter};

/// Point-in-time raw balance of one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBalance {
    pub account_code: String,
    pub balance: Decimal,
}

/// Opening and closing raw balances of one account over `[from, to]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceWindow {
    pub account_code: String,
    /// All lines dated before `from`
    pub opening_balance: Decimal,
    /// All lines dated on or before `to`
    pub closing_balance: Decimal,
    /// Gross debits dated within the window
    pub period_debit: Decimal,
    /// Gross credits dated within the window
    pub period_credit: Decimal,
}

impl BalanceWindow {
    /// Raw movement within the window
    pub fn movement(&self) -> Decimal {
        self.closing_balance - self.opening_balance
    }

    pub fn has_activity(&self) -> bool {
        !self.period_debit.is_zero() || !self.period_credit.is_zero()
    }
}

/// Combines opening sums and in-window sums into windows, ordered by code
pub fn merge_windows(opening: Vec<AccountSums>, period: Vec<AccountSums>) -> Vec<BalanceWindow> {
    let mut windows: BTreeMap<String, BalanceWindow> = BTreeMap::new();
    let blank = |code: &str| BalanceWindow {
        account_code: code.to_string(),
        opening_balance: Decimal::ZERO,
        closing_balance: Decimal::ZERO,
        period_debit: Decimal::ZERO,
        period_credit: Decimal::ZERO,
    };

    for sums in opening {
        let raw = sums.raw_balance();
        let window = windows
            .entry(sums.account_code.clone())
            .or_insert_with(|| blank(&sums.account_code));
        window.opening_balance += raw;
        window.closing_balance += raw;
    }
    for sums in period {
        let raw = sums.raw_balance();
        let window = windows
            .entry(sums.account_code.clone())
            .or_insert_with(|| blank(&sums.account_code));
        window.closing_balance += raw;
        window.period_debit += sums.debit;
        window.period_credit += sums.credit;
    }

    windows.into_values().collect()
}

/// Computes raw balances from the posted ledger
#[derive(Clone)]
pub struct BalanceAggregator {
    store: Arc<dyn LedgerStore>,
}

impl BalanceAggregator {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Raw balance of every account (or the given ones) as of `as_of`, inclusive
    #[instrument(skip(self, accounts), fields(tenant_id = %tenant_id))]
    pub async fn balances_as_of(
        &self,
        tenant_id: TenantId,
        accounts: Option<Vec<String>>,
        as_of: NaiveDate,
    ) -> Result<Vec<RawBalance>, LedgerError> {
        let sums = self
            .store
            .account_sums(tenant_id, LineFilter::up_to(as_of).for_accounts(accounts))
            .await?;
        debug!(accounts = sums.len(), "aggregated point-in-time balances");
        Ok(sums
            .into_iter()
            .map(|s| RawBalance {
                balance: s.raw_balance(),
                account_code: s.account_code,
            })
            .collect())
    }

    /// Opening (before `from`) and closing (through `to`) balances
    ///
    /// # Errors
    ///
    /// Returns `Validation` when `from` is after `to`
    #[instrument(skip(self, accounts), fields(tenant_id = %tenant_id))]
    pub async fn balances_between(
        &self,
        tenant_id: TenantId,
        accounts: Option<Vec<String>>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<BalanceWindow>, LedgerError> {
        if from > to {
            return Err(LedgerError::validation(format!(
                "period start {} is after period end {}",
                from, to
            )));
        }

        let opening = match from.pred_opt() {
            Some(day_before) => {
                self.store
                    .account_sums(
                        tenant_id,
                        LineFilter::up_to(day_before).for_accounts(accounts.clone()),
                    )
                    .await?
            }
            None => Vec::new(),
        };
        let period = self
            .store
            .account_sums(tenant_id, LineFilter::between(from, to).for_accounts(accounts))
            .await?;

        let windows = merge_windows(opening, period);
        debug!(accounts = windows.len(), "aggregated windowed balances");
        Ok(windows)
    }
}
