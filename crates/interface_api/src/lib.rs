//! HTTP API Layer
//!
//! This crate provides the REST API for the ledger using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Document, report, reference data and health handlers
//! - **Middleware**: Request ids, tracing, audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: `{success, error: {kind, message}}` envelope
//!
//! Tenant-scoped routes live under `/api/v1/tenants/:tenant_id`.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(store, config)?;
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use core_kernel::MoneyError;
use domain_ledger::{FinancialReports, LedgerService, LedgerSettings, LedgerStore};

use crate::config::ApiConfig;
use crate::handlers::{documents, health, reference, reports};
use crate::middleware::audit_middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub ledger: LedgerService,
    pub reports: FinancialReports,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires the ledger services over a store
    ///
    /// # Errors
    ///
    /// Returns an error if the configured default currency is unknown
    pub fn new(store: Arc<dyn LedgerStore>, config: ApiConfig) -> Result<Self, MoneyError> {
        let settings = LedgerSettings {
            default_currency: config.currency()?,
            ..LedgerSettings::default()
        };
        let reports = FinancialReports::new(store.clone()).with_tolerance(settings.tolerance);
        let ledger = LedgerService::new(store).with_settings(settings);
        Ok(Self {
            ledger,
            reports,
            config,
        })
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/api/v1/standard-chart", get(reference::standard_chart));

    let document_routes = Router::new()
        .route("/", post(documents::create_document))
        .route(
            "/:id",
            get(documents::get_document)
                .put(documents::update_draft)
                .delete(documents::delete_draft),
        )
        .route("/:id/post", post(documents::post_document))
        .route("/:id/reverse", post(documents::reverse_document))
        .route("/:id/cancel", post(documents::cancel_draft));

    let report_routes = Router::new()
        .route("/trial-balance", get(reports::trial_balance))
        .route("/balance-sheet", get(reports::balance_sheet))
        .route("/profit-and-loss", get(reports::profit_and_loss))
        .route("/cash-flow", get(reports::cash_flow));

    let tenant_routes = Router::new()
        .nest("/documents", document_routes)
        .nest("/reports", report_routes)
        .route("/balances", get(reports::balances))
        .route(
            "/accounts",
            get(reference::list_accounts).post(reference::create_account),
        )
        .route("/accounts/standard", post(reference::install_standard_chart))
        .route("/customers", post(reference::create_customer))
        .route("/suppliers", post(reference::create_supplier))
        .route("/products", post(reference::create_product))
        .route("/products/:id", get(reference::get_product))
        .route("/invoices", post(reference::create_invoice))
        .route("/invoices/:id", get(reference::get_invoice));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1/tenants/:tenant_id", tenant_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
