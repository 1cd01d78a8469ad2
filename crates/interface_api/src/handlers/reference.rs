//! Chart of accounts and reference data handlers

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use core_kernel::{CustomerId, InvoiceId, ProductId, SupplierId, TenantId};
use domain_ledger::{Account, Customer, Invoice, Product, StandardChart, Supplier};

use crate::dto::reference::*;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::AppState;

/// Lists the tenant's chart of accounts, ordered by code
pub async fn list_accounts(
    State(state): State<AppState>,
    ApiPath(tenant_id): ApiPath<TenantId>,
) -> Result<Json<Vec<Account>>, ApiError> {
    let chart = state.ledger.chart(tenant_id).await?;
    Ok(Json(chart.accounts().cloned().collect()))
}

pub async fn create_account(
    State(state): State<AppState>,
    ApiPath(tenant_id): ApiPath<TenantId>,
    ApiJson(request): ApiJson<CreateAccountRequest>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    request.validate()?;
    let account = request.into_account();
    state
        .ledger
        .register_account(tenant_id, account.clone())
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// The built-in chart a tenant can install
pub async fn standard_chart() -> Json<Vec<Account>> {
    Json(StandardChart::accounts())
}

pub async fn install_standard_chart(
    State(state): State<AppState>,
    ApiPath(tenant_id): ApiPath<TenantId>,
) -> Result<Json<StandardChartResponse>, ApiError> {
    let added = state.ledger.install_standard_chart(tenant_id).await?;
    Ok(Json(StandardChartResponse {
        success: true,
        added,
    }))
}

pub async fn create_customer(
    State(state): State<AppState>,
    ApiPath(tenant_id): ApiPath<TenantId>,
    ApiJson(request): ApiJson<CreatePartyRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    request.validate()?;
    let id = CustomerId::new();
    state
        .ledger
        .register_customer(Customer {
            id,
            tenant_id,
            name: request.name,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(id))))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    ApiPath(tenant_id): ApiPath<TenantId>,
    ApiJson(request): ApiJson<CreatePartyRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    request.validate()?;
    let id = SupplierId::new();
    state
        .ledger
        .register_supplier(Supplier {
            id,
            tenant_id,
            name: request.name,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(id))))
}

pub async fn create_product(
    State(state): State<AppState>,
    ApiPath(tenant_id): ApiPath<TenantId>,
    ApiJson(request): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    request.validate()?;
    let id = ProductId::new();
    state
        .ledger
        .register_product(Product {
            id,
            tenant_id,
            sku: request.sku,
            name: request.name,
            stock_on_hand: request.stock_on_hand,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(id))))
}

pub async fn get_product(
    State(state): State<AppState>,
    ApiPath((tenant_id, id)): ApiPath<(TenantId, ProductId)>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .ledger
        .store()
        .product(tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {}", id)))?;
    Ok(Json(product))
}

pub async fn create_invoice(
    State(state): State<AppState>,
    ApiPath(tenant_id): ApiPath<TenantId>,
    ApiJson(request): ApiJson<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    request.validate()?;
    let id = InvoiceId::new();
    state
        .ledger
        .register_invoice(Invoice {
            id,
            tenant_id,
            customer_id: request.customer_id,
            number: request.number,
            total: request.total,
            amount_due: request.amount_due.unwrap_or(request.total),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(id))))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    ApiPath((tenant_id, id)): ApiPath<(TenantId, InvoiceId)>,
) -> Result<Json<Invoice>, ApiError> {
    let invoice = state
        .ledger
        .store()
        .invoice(tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("invoice {}", id)))?;
    Ok(Json(invoice))
}
