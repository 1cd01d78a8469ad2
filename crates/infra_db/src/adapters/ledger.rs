//! PostgreSQL Ledger Adapter
//!
//! Implements `LedgerStore` and `LedgerTransaction` on top of the ledger
//! schema. Each `LedgerTransaction` wraps one SQLx transaction; documents
//! and counters are locked with `SELECT ... FOR UPDATE` so concurrent
//! writers for the same tenant and class serialize on the counter row.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PgLedgerStore;
//! use domain_ledger::{LedgerService, LedgerStore};
//! use std::sync::Arc;
//!
//! let store: Arc<dyn LedgerStore> = Arc::new(PgLedgerStore::new(pool));
//! let ledger = LedgerService::new(store);
//! ```

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, CustomerId, DocumentId, DomainPort, HealthCheckResult, HealthCheckable,
    InvoiceId, PortError, ProductId, SupplierId, TenantId,
};
use domain_ledger::numbering::parse_sequence;
use domain_ledger::{
    Account, AccountSums, Customer, Document, DocumentClass, Invoice, LedgerLine, LedgerStore,
    LedgerTransaction, LineFilter, Product, Supplier,
};

use crate::error::to_port;
use crate::repositories::ledger::{DocumentRow, LedgerRepository, DOCUMENT_COLUMNS};

const ADAPTER_ID: &str = "postgres-ledger-adapter";

/// PostgreSQL-backed ledger store
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    repository: LedgerRepository,
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: LedgerRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn repository(&self) -> &LedgerRepository {
        &self.repository
    }
}

impl DomainPort for PgLedgerStore {}

#[async_trait]
impl HealthCheckable for PgLedgerStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(_) => (AdapterHealth::Healthy, None),
            Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
        };
        HealthCheckResult {
            adapter_id: ADAPTER_ID.to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, PortError> {
        let tx = self.pool.begin().await.map_err(to_port)?;
        Ok(Box::new(PgLedgerTransaction { tx }))
    }

    async fn accounts(&self, tenant_id: TenantId) -> Result<Vec<Account>, PortError> {
        self.repository.accounts(tenant_id).await.map_err(to_port)
    }

    #[instrument(skip(self, filter), fields(tenant_id = %tenant_id))]
    async fn account_sums(
        &self,
        tenant_id: TenantId,
        filter: LineFilter,
    ) -> Result<Vec<AccountSums>, PortError> {
        self.repository
            .account_sums(tenant_id, &filter)
            .await
            .map_err(to_port)
    }

    async fn document(&self, tenant_id: TenantId, id: DocumentId) -> Result<Option<Document>, PortError> {
        self.repository.document(tenant_id, id).await.map_err(to_port)
    }

    async fn document_lines(&self, tenant_id: TenantId, id: DocumentId) -> Result<Vec<LedgerLine>, PortError> {
        self.repository
            .document_lines(tenant_id, id)
            .await
            .map_err(to_port)
    }

    async fn invoice(&self, tenant_id: TenantId, id: InvoiceId) -> Result<Option<Invoice>, PortError> {
        self.repository.invoice(tenant_id, id).await.map_err(to_port)
    }

    async fn product(&self, tenant_id: TenantId, id: ProductId) -> Result<Option<Product>, PortError> {
        self.repository.product(tenant_id, id).await.map_err(to_port)
    }

    async fn insert_account(&self, tenant_id: TenantId, account: Account) -> Result<(), PortError> {
        self.repository
            .insert_account(tenant_id, &account)
            .await
            .map_err(to_port)
    }

    async fn insert_customer(&self, customer: Customer) -> Result<(), PortError> {
        self.repository.insert_customer(&customer).await.map_err(to_port)
    }

    async fn insert_supplier(&self, supplier: Supplier) -> Result<(), PortError> {
        self.repository.insert_supplier(&supplier).await.map_err(to_port)
    }

    async fn insert_product(&self, product: Product) -> Result<(), PortError> {
        self.repository.insert_product(&product).await.map_err(to_port)
    }

    async fn insert_invoice(&self, invoice: Invoice) -> Result<(), PortError> {
        self.repository.insert_invoice(&invoice).await.map_err(to_port)
    }
}

/// One SQLx transaction; dropped without commit it rolls back
pub struct PgLedgerTransaction {
    tx: Transaction<'static, Postgres>,
}

impl PgLedgerTransaction {
    async fn locked_counter(
        &mut self,
        tenant_id: TenantId,
        class: DocumentClass,
        period: &str,
    ) -> Result<Option<i64>, PortError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT last_value FROM document_sequences
            WHERE tenant_id = $1 AND class = $2 AND period = $3
            FOR UPDATE
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .bind(class.as_str())
        .bind(period)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(to_port)
    }

    /// Highest sequence already used in scope, for seeding a missing counter
    async fn highest_existing(
        &mut self,
        tenant_id: TenantId,
        class: DocumentClass,
        scope_prefix: &str,
    ) -> Result<u64, PortError> {
        let numbers = sqlx::query_scalar::<_, String>(
            r#"
            SELECT number FROM documents
            WHERE tenant_id = $1 AND class = $2 AND starts_with(number, $3)
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .bind(class.as_str())
        .bind(scope_prefix)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(to_port)?;

        Ok(numbers
            .iter()
            .filter_map(|n| parse_sequence(n, scope_prefix))
            .max()
            .unwrap_or(0))
    }
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
    #[instrument(skip(self), fields(tenant_id = %tenant_id, class = %class))]
    async fn next_sequence(
        &mut self,
        tenant_id: TenantId,
        class: DocumentClass,
        period: Option<&str>,
    ) -> Result<u64, PortError> {
        let period_key = period.unwrap_or("");

        if self.locked_counter(tenant_id, class, period_key).await?.is_none() {
            let seed = self
                .highest_existing(tenant_id, class, &class.scope_prefix(period))
                .await?;
            // a concurrent seeder wins silently; the lock below waits for it
            sqlx::query(
                r#"
                INSERT INTO document_sequences (tenant_id, class, period, last_value)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (tenant_id, class, period) DO NOTHING
                "#,
            )
            .bind(*tenant_id.as_uuid())
            .bind(class.as_str())
            .bind(period_key)
            .bind(seed as i64)
            .execute(&mut *self.tx)
            .await
            .map_err(to_port)?;
            debug!(seed, "seeded document counter");
        }

        let next = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE document_sequences SET last_value = last_value + 1
            WHERE tenant_id = $1 AND class = $2 AND period = $3
            RETURNING last_value
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .bind(class.as_str())
        .bind(period_key)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(to_port)?;

        Ok(next as u64)
    }

    async fn insert_document(&mut self, document: &Document) -> Result<(), PortError> {
        let sql = format!(
            "INSERT INTO documents ({}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
            DOCUMENT_COLUMNS
        );
        sqlx::query(&sql)
            .bind(*document.id.as_uuid())
            .bind(*document.tenant_id.as_uuid())
            .bind(document.class.as_str())
            .bind(&document.number)
            .bind(document.status.as_str())
            .bind(document.entry_date)
            .bind(&document.narration)
            .bind(document.currency.code())
            .bind(document.exchange_rate.value())
            .bind(document.total)
            .bind(Json(&document.lines))
            .bind(Json(&document.effects))
            .bind(document.reversal_of.map(|id| *id.as_uuid()))
            .bind(document.reversed_by.map(|id| *id.as_uuid()))
            .bind(*document.created_by.as_uuid())
            .bind(document.created_at)
            .bind(document.posted_at)
            .execute(&mut *self.tx)
            .await
            .map_err(to_port)?;
        Ok(())
    }

    async fn update_document(&mut self, document: &Document) -> Result<(), PortError> {
        let result = sqlx::query(
            r#"
            UPDATE documents SET
                status = $3, entry_date = $4, narration = $5, currency = $6,
                exchange_rate = $7, total = $8, lines = $9, effects = $10,
                reversed_by = $11, posted_at = $12
            WHERE tenant_id = $1 AND document_id = $2
            "#,
        )
        .bind(*document.tenant_id.as_uuid())
        .bind(*document.id.as_uuid())
        .bind(document.status.as_str())
        .bind(document.entry_date)
        .bind(&document.narration)
        .bind(document.currency.code())
        .bind(document.exchange_rate.value())
        .bind(document.total)
        .bind(Json(&document.lines))
        .bind(Json(&document.effects))
        .bind(document.reversed_by.map(|id| *id.as_uuid()))
        .bind(document.posted_at)
        .execute(&mut *self.tx)
        .await
        .map_err(to_port)?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Document", document.id));
        }
        Ok(())
    }

    async fn delete_document(&mut self, tenant_id: TenantId, id: DocumentId) -> Result<(), PortError> {
        let result = sqlx::query("DELETE FROM documents WHERE tenant_id = $1 AND document_id = $2")
            .bind(*tenant_id.as_uuid())
            .bind(*id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(to_port)?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Document", id));
        }
        Ok(())
    }

    async fn lock_document(
        &mut self,
        tenant_id: TenantId,
        id: DocumentId,
    ) -> Result<Option<Document>, PortError> {
        let sql = format!(
            "SELECT {} FROM documents WHERE tenant_id = $1 AND document_id = $2 FOR UPDATE",
            DOCUMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(*tenant_id.as_uuid())
            .bind(*id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(to_port)?;

        row.map(Document::try_from).transpose().map_err(to_port)
    }

    async fn insert_lines(&mut self, lines: &[LedgerLine]) -> Result<(), PortError> {
        if lines.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO ledger_lines (line_id, tenant_id, document_id, line_no, account_code, \
             debit, credit, entry_date, customer_id, supplier_id, memo) ",
        );
        builder.push_values(lines, |mut row, line| {
            row.push_bind(*line.id.as_uuid())
                .push_bind(*line.tenant_id.as_uuid())
                .push_bind(*line.document_id.as_uuid())
                .push_bind(line.line_no)
                .push_bind(line.account_code.clone())
                .push_bind(line.debit)
                .push_bind(line.credit)
                .push_bind(line.entry_date)
                .push_bind(line.customer_id.map(|id| *id.as_uuid()))
                .push_bind(line.supplier_id.map(|id| *id.as_uuid()))
                .push_bind(line.memo.clone());
        });
        builder
            .build()
            .execute(&mut *self.tx)
            .await
            .map_err(to_port)?;
        Ok(())
    }

    async fn adjust_invoice_due(
        &mut self,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
        delta: Decimal,
    ) -> Result<(), PortError> {
        let current = sqlx::query_as::<_, (String, Decimal)>(
            r#"
            SELECT number, amount_due FROM invoices
            WHERE tenant_id = $1 AND invoice_id = $2
            FOR UPDATE
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .bind(*invoice_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(to_port)?;

        let (number, amount_due) = current.ok_or_else(|| PortError::not_found("Invoice", invoice_id))?;
        let updated = amount_due + delta;
        if updated.is_sign_negative() && !updated.is_zero() {
            return Err(PortError::validation_field(
                format!("invoice {} amount due would become negative ({})", number, updated),
                "amount_due",
            ));
        }

        sqlx::query("UPDATE invoices SET amount_due = $3 WHERE tenant_id = $1 AND invoice_id = $2")
            .bind(*tenant_id.as_uuid())
            .bind(*invoice_id.as_uuid())
            .bind(updated)
            .execute(&mut *self.tx)
            .await
            .map_err(to_port)?;
        Ok(())
    }

    async fn adjust_stock(
        &mut self,
        tenant_id: TenantId,
        product_id: ProductId,
        delta: Decimal,
    ) -> Result<(), PortError> {
        let result = sqlx::query(
            r#"
            UPDATE products SET stock_on_hand = stock_on_hand + $3
            WHERE tenant_id = $1 AND product_id = $2
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .bind(*product_id.as_uuid())
        .bind(delta)
        .execute(&mut *self.tx)
        .await
        .map_err(to_port)?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Product", product_id));
        }
        Ok(())
    }

    async fn customer_exists(&mut self, tenant_id: TenantId, id: CustomerId) -> Result<bool, PortError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM customers WHERE tenant_id = $1 AND customer_id = $2)",
        )
        .bind(*tenant_id.as_uuid())
        .bind(*id.as_uuid())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(to_port)
    }

    async fn supplier_exists(&mut self, tenant_id: TenantId, id: SupplierId) -> Result<bool, PortError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM suppliers WHERE tenant_id = $1 AND supplier_id = $2)",
        )
        .bind(*tenant_id.as_uuid())
        .bind(*id.as_uuid())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(to_port)
    }

    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        self.tx.commit().await.map_err(to_port)
    }

    async fn rollback(self: Box<Self>) -> Result<(), PortError> {
        self.tx.rollback().await.map_err(to_port)
    }
}
