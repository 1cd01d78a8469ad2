//! Pre-built Test Fixtures
//!
//! Ready-to-use ledger state for tests: a store with the standard chart
//! installed for one tenant, plus reference data registered through the
//! service so the same validation applies as in production.

use std::sync::Arc;

use chrono::NaiveDate;
use fake::faker::company::en::CompanyName;
use fake::faker::lorem::en::Word;
use fake::Fake;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{CustomerId, InvoiceId, ProductId, SupplierId, TenantId, UserId};
use domain_ledger::{
    ChartOfAccounts, Customer, FinancialReports, InMemoryLedgerStore, Invoice, LedgerService,
    LedgerStore, Product, StandardChart, Supplier,
};

/// The standard chart, built once
pub static STANDARD_CHART: Lazy<ChartOfAccounts> = Lazy::new(StandardChart::chart);

/// Fixed dates used across tests
pub struct DateFixtures;

impl DateFixtures {
    pub fn jan(day: u32) -> NaiveDate {
        Self::ymd(2024, 1, day)
    }

    pub fn feb(day: u32) -> NaiveDate {
        Self::ymd(2024, 2, day)
    }

    pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    pub fn january() -> (NaiveDate, NaiveDate) {
        (Self::jan(1), Self::jan(31))
    }
}

/// Account codes of the standard chart that tests post to
pub struct AccountFixtures;

impl AccountFixtures {
    pub const CASH: &'static str = "1000";
    pub const BANK: &'static str = "1010";
    pub const RECEIVABLE: &'static str = "1100";
    pub const INVENTORY: &'static str = "1200";
    pub const EQUIPMENT: &'static str = "1500";
    pub const ACCUMULATED_DEPRECIATION: &'static str = "1590";
    pub const PAYABLE: &'static str = "2000";
    pub const TAX_PAYABLE: &'static str = "2200";
    pub const LONG_TERM_LOAN: &'static str = "2500";
    pub const CAPITAL: &'static str = "3000";
    pub const SALES: &'static str = "4000";
    pub const SALES_RETURNS: &'static str = "4100";
    pub const COST_OF_SALES: &'static str = "5000";
    pub const RENT: &'static str = "6100";
    pub const DEPRECIATION: &'static str = "6300";
}

/// A ledger wired to a fresh in-memory store with one tenant set up
pub struct LedgerFixture {
    pub store: Arc<InMemoryLedgerStore>,
    pub ledger: LedgerService,
    pub reports: FinancialReports,
    pub tenant_id: TenantId,
    pub user_id: UserId,
}

impl LedgerFixture {
    /// In-memory ledger with the standard chart installed
    pub async fn new() -> Self {
        Self::with_store(Arc::new(InMemoryLedgerStore::new())).await
    }

    async fn with_store(store: Arc<InMemoryLedgerStore>) -> Self {
        let ledger = LedgerService::new(store.clone());
        let reports = FinancialReports::new(store.clone());
        let tenant_id = TenantId::new();
        ledger
            .install_standard_chart(tenant_id)
            .await
            .expect("standard chart installs on an empty store");
        Self {
            store,
            ledger,
            reports,
            tenant_id,
            user_id: UserId::new(),
        }
    }

    /// Ledger over any store, with the standard chart installed for a new tenant
    pub async fn over(store: Arc<dyn LedgerStore>) -> (LedgerService, TenantId) {
        let ledger = LedgerService::new(store);
        let tenant_id = TenantId::new();
        ledger
            .install_standard_chart(tenant_id)
            .await
            .expect("standard chart installs for a new tenant");
        (ledger, tenant_id)
    }

    pub async fn customer(&self) -> CustomerId {
        register_customer(&self.ledger, self.tenant_id).await
    }

    pub async fn supplier(&self) -> SupplierId {
        register_supplier(&self.ledger, self.tenant_id).await
    }

    pub async fn product(&self, stock_on_hand: Decimal) -> ProductId {
        register_product(&self.ledger, self.tenant_id, stock_on_hand).await
    }

    pub async fn invoice(&self, customer_id: CustomerId, total: Decimal) -> InvoiceId {
        register_invoice(&self.ledger, self.tenant_id, customer_id, total).await
    }

    pub async fn amount_due(&self, invoice_id: InvoiceId) -> Decimal {
        self.ledger
            .store()
            .invoice(self.tenant_id, invoice_id)
            .await
            .expect("invoice lookup")
            .expect("invoice exists")
            .amount_due
    }

    pub async fn stock_on_hand(&self, product_id: ProductId) -> Decimal {
        self.ledger
            .store()
            .product(self.tenant_id, product_id)
            .await
            .expect("product lookup")
            .expect("product exists")
            .stock_on_hand
    }
}

pub async fn register_customer(ledger: &LedgerService, tenant_id: TenantId) -> CustomerId {
    let id = CustomerId::new();
    ledger
        .register_customer(Customer {
            id,
            tenant_id,
            name: CompanyName().fake(),
        })
        .await
        .expect("customer registers");
    id
}

pub async fn register_supplier(ledger: &LedgerService, tenant_id: TenantId) -> SupplierId {
    let id = SupplierId::new();
    ledger
        .register_supplier(Supplier {
            id,
            tenant_id,
            name: CompanyName().fake(),
        })
        .await
        .expect("supplier registers");
    id
}

pub async fn register_product(
    ledger: &LedgerService,
    tenant_id: TenantId,
    stock_on_hand: Decimal,
) -> ProductId {
    let id = ProductId::new();
    let word: String = Word().fake();
    ledger
        .register_product(Product {
            id,
            tenant_id,
            sku: format!("SKU-{}", &id.as_uuid().simple().to_string()[..8]),
            name: word,
            stock_on_hand,
        })
        .await
        .expect("product registers");
    id
}

pub async fn register_invoice(
    ledger: &LedgerService,
    tenant_id: TenantId,
    customer_id: CustomerId,
    total: Decimal,
) -> InvoiceId {
    let id = InvoiceId::new();
    ledger
        .register_invoice(Invoice {
            id,
            tenant_id,
            customer_id,
            number: format!("SI-{}", &id.as_uuid().simple().to_string()[..8]),
            total,
            amount_due: total,
        })
        .await
        .expect("invoice registers");
    id
}

/// Amounts that recur in scenarios
pub struct AmountFixtures;

impl AmountFixtures {
    pub fn capital() -> Decimal {
        dec!(5000)
    }

    pub fn sale() -> Decimal {
        dec!(1000)
    }

    pub fn rent() -> Decimal {
        dec!(300)
    }
}
