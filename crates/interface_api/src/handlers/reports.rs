//! Financial statement and balance handlers

use axum::{extract::State, Json};

use core_kernel::TenantId;
use domain_ledger::{BalanceSheet, CashFlowStatement, ProfitAndLoss, TrialBalance};

use crate::dto::reports::*;
use crate::error::ApiError;
use crate::extract::{ApiPath, ApiQuery};
use crate::AppState;

pub async fn trial_balance(
    State(state): State<AppState>,
    ApiPath(tenant_id): ApiPath<TenantId>,
    ApiQuery(period): ApiQuery<PeriodQuery>,
) -> Result<Json<TrialBalance>, ApiError> {
    Ok(Json(
        state
            .reports
            .trial_balance(tenant_id, period.from, period.to)
            .await?,
    ))
}

pub async fn balance_sheet(
    State(state): State<AppState>,
    ApiPath(tenant_id): ApiPath<TenantId>,
    ApiQuery(query): ApiQuery<AsOfQuery>,
) -> Result<Json<BalanceSheet>, ApiError> {
    Ok(Json(state.reports.balance_sheet(tenant_id, query.as_of).await?))
}

pub async fn profit_and_loss(
    State(state): State<AppState>,
    ApiPath(tenant_id): ApiPath<TenantId>,
    ApiQuery(period): ApiQuery<PeriodQuery>,
) -> Result<Json<ProfitAndLoss>, ApiError> {
    Ok(Json(
        state
            .reports
            .profit_and_loss(tenant_id, period.from, period.to)
            .await?,
    ))
}

pub async fn cash_flow(
    State(state): State<AppState>,
    ApiPath(tenant_id): ApiPath<TenantId>,
    ApiQuery(period): ApiQuery<PeriodQuery>,
) -> Result<Json<CashFlowStatement>, ApiError> {
    Ok(Json(
        state
            .reports
            .cash_flow(tenant_id, period.from, period.to)
            .await?,
    ))
}

/// Raw balances as of a date, or opening/closing windows over a period
pub async fn balances(
    State(state): State<AppState>,
    ApiPath(tenant_id): ApiPath<TenantId>,
    ApiQuery(query): ApiQuery<BalanceQuery>,
) -> Result<Json<BalancesResponse>, ApiError> {
    let aggregator = state.reports.aggregator();
    let accounts = query.account_codes();
    let response = match query.scope()? {
        BalanceScope::AsOf(as_of) => BalancesResponse::AsOf {
            as_of,
            balances: aggregator.balances_as_of(tenant_id, accounts, as_of).await?,
        },
        BalanceScope::Between(from, to) => BalancesResponse::Between {
            from,
            to,
            balances: aggregator
                .balances_between(tenant_id, accounts, from, to)
                .await?,
        },
    };
    Ok(Json(response))
}
