//! Ledger repository
//!
//! Read queries and reference-data inserts against the ledger schema, plus
//! the row types shared with the transactional adapter. Balances are always
//! aggregated in SQL; no ledger line is materialized for a report.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::{
    CustomerId, DocumentId, ExchangeRate, InvoiceId, LedgerLineId, ProductId, SupplierId, TenantId,
    UserId,
};
use domain_ledger::{
    Account, AccountSums, Customer, Document, Invoice, LedgerLine, LineFilter, PostingLine,
    Product, SideEffect, Supplier,
};

use crate::error::DatabaseError;

pub(crate) const DOCUMENT_COLUMNS: &str = "document_id, tenant_id, class, number, status, \
    entry_date, narration, currency, exchange_rate, total, lines, effects, reversal_of, \
    reversed_by, created_by, created_at, posted_at";

// ----------------------------------------------------------------------
// Rows
// ----------------------------------------------------------------------

#[derive(Debug, sqlx::FromRow)]
pub struct AccountRow {
    pub code: String,
    pub name: String,
    pub account_type: String,
    pub sub_type: String,
}

impl TryFrom<AccountRow> for Account {
    type Error = DatabaseError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            account_type: decode(row.account_type.parse())?,
            code: row.code,
            name: row.name,
            sub_type: row.sub_type,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct AccountSumsRow {
    pub account_code: String,
    pub debit: Decimal,
    pub credit: Decimal,
}

impl From<AccountSumsRow> for AccountSums {
    fn from(row: AccountSumsRow) -> Self {
        AccountSums {
            account_code: row.account_code,
            debit: row.debit,
            credit: row.credit,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct DocumentRow {
    pub document_id: Uuid,
    pub tenant_id: Uuid,
    pub class: String,
    pub number: String,
    pub status: String,
    pub entry_date: NaiveDate,
    pub narration: String,
    pub currency: String,
    pub exchange_rate: Decimal,
    pub total: Decimal,
    pub lines: Json<Vec<PostingLine>>,
    pub effects: Json<Vec<SideEffect>>,
    pub reversal_of: Option<Uuid>,
    pub reversed_by: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub posted_at: Option<DateTime<Utc>>,
}

fn decode<T, E: std::fmt::Display>(result: Result<T, E>) -> Result<T, DatabaseError> {
    result.map_err(|e| DatabaseError::SerializationError(e.to_string()))
}

impl TryFrom<DocumentRow> for Document {
    type Error = DatabaseError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        Ok(Document {
            id: DocumentId::from_uuid(row.document_id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            class: decode(row.class.parse())?,
            number: row.number,
            status: decode(row.status.parse())?,
            entry_date: row.entry_date,
            narration: row.narration,
            currency: decode(row.currency.trim().parse())?,
            exchange_rate: decode(ExchangeRate::new(row.exchange_rate))?,
            total: row.total,
            lines: row.lines.0,
            effects: row.effects.0,
            reversal_of: row.reversal_of.map(DocumentId::from_uuid),
            reversed_by: row.reversed_by.map(DocumentId::from_uuid),
            created_by: UserId::from_uuid(row.created_by),
            created_at: row.created_at,
            posted_at: row.posted_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct LedgerLineRow {
    pub line_id: Uuid,
    pub tenant_id: Uuid,
    pub document_id: Uuid,
    pub line_no: i32,
    pub account_code: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub entry_date: NaiveDate,
    pub customer_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub memo: Option<String>,
}

impl From<LedgerLineRow> for LedgerLine {
    fn from(row: LedgerLineRow) -> Self {
        LedgerLine {
            id: LedgerLineId::from_uuid(row.line_id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            document_id: DocumentId::from_uuid(row.document_id),
            line_no: row.line_no,
            account_code: row.account_code,
            debit: row.debit,
            credit: row.credit,
            entry_date: row.entry_date,
            customer_id: row.customer_id.map(CustomerId::from_uuid),
            supplier_id: row.supplier_id.map(SupplierId::from_uuid),
            memo: row.memo,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct InvoiceRow {
    pub invoice_id: Uuid,
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub number: String,
    pub total: Decimal,
    pub amount_due: Decimal,
}

impl From<InvoiceRow> for Invoice {
    fn from(row: InvoiceRow) -> Self {
        Invoice {
            id: InvoiceId::from_uuid(row.invoice_id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            customer_id: CustomerId::from_uuid(row.customer_id),
            number: row.number,
            total: row.total,
            amount_due: row.amount_due,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct ProductRow {
    pub product_id: Uuid,
    pub tenant_id: Uuid,
    pub sku: String,
    pub name: String,
    pub stock_on_hand: Decimal,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: ProductId::from_uuid(row.product_id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            sku: row.sku,
            name: row.name,
            stock_on_hand: row.stock_on_hand,
        }
    }
}

// ----------------------------------------------------------------------
// Repository
// ----------------------------------------------------------------------

/// Non-transactional ledger queries
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn accounts(&self, tenant_id: TenantId) -> Result<Vec<Account>, DatabaseError> {
        let rows = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT code, name, account_type, sub_type
            FROM accounts
            WHERE tenant_id = $1
            ORDER BY code
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Account::try_from).collect()
    }

    /// Debit and credit sums per account over the lines selected by `filter`
    pub async fn account_sums(
        &self,
        tenant_id: TenantId,
        filter: &LineFilter,
    ) -> Result<Vec<AccountSums>, DatabaseError> {
        let rows = sqlx::query_as::<_, AccountSumsRow>(
            r#"
            SELECT account_code,
                   COALESCE(SUM(debit), 0)  AS debit,
                   COALESCE(SUM(credit), 0) AS credit
            FROM ledger_lines
            WHERE tenant_id = $1
              AND ($2::date IS NULL OR entry_date >= $2)
              AND ($3::date IS NULL OR entry_date <= $3)
              AND ($4::text[] IS NULL OR account_code = ANY($4))
            GROUP BY account_code
            ORDER BY account_code
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.accounts.clone())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(AccountSums::from).collect())
    }

    pub async fn document(
        &self,
        tenant_id: TenantId,
        id: DocumentId,
    ) -> Result<Option<Document>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM documents WHERE tenant_id = $1 AND document_id = $2",
            DOCUMENT_COLUMNS
        );
        sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(*tenant_id.as_uuid())
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(Document::try_from)
            .transpose()
    }

    pub async fn document_lines(
        &self,
        tenant_id: TenantId,
        id: DocumentId,
    ) -> Result<Vec<LedgerLine>, DatabaseError> {
        let rows = sqlx::query_as::<_, LedgerLineRow>(
            r#"
            SELECT line_id, tenant_id, document_id, line_no, account_code, debit, credit,
                   entry_date, customer_id, supplier_id, memo
            FROM ledger_lines
            WHERE tenant_id = $1 AND document_id = $2
            ORDER BY line_no
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .bind(*id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LedgerLine::from).collect())
    }

    pub async fn invoice(
        &self,
        tenant_id: TenantId,
        id: InvoiceId,
    ) -> Result<Option<Invoice>, DatabaseError> {
        let row = sqlx::query_as::<_, InvoiceRow>(
            r#"
            SELECT invoice_id, tenant_id, customer_id, number, total, amount_due
            FROM invoices
            WHERE tenant_id = $1 AND invoice_id = $2
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Invoice::from))
    }

    pub async fn product(
        &self,
        tenant_id: TenantId,
        id: ProductId,
    ) -> Result<Option<Product>, DatabaseError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT product_id, tenant_id, sku, name, stock_on_hand
            FROM products
            WHERE tenant_id = $1 AND product_id = $2
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    pub async fn insert_account(&self, tenant_id: TenantId, account: &Account) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (tenant_id, code, name, account_type, sub_type)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .bind(&account.code)
        .bind(&account.name)
        .bind(account.account_type.as_str())
        .bind(&account.sub_type)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_customer(&self, customer: &Customer) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO customers (customer_id, tenant_id, name) VALUES ($1, $2, $3)")
            .bind(*customer.id.as_uuid())
            .bind(*customer.tenant_id.as_uuid())
            .bind(&customer.name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_supplier(&self, supplier: &Supplier) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO suppliers (supplier_id, tenant_id, name) VALUES ($1, $2, $3)")
            .bind(*supplier.id.as_uuid())
            .bind(*supplier.tenant_id.as_uuid())
            .bind(&supplier.name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_product(&self, product: &Product) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO products (product_id, tenant_id, sku, name, stock_on_hand)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(*product.id.as_uuid())
        .bind(*product.tenant_id.as_uuid())
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.stock_on_hand)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO invoices (invoice_id, tenant_id, customer_id, number, total, amount_due)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(*invoice.id.as_uuid())
        .bind(*invoice.tenant_id.as_uuid())
        .bind(*invoice.customer_id.as_uuid())
        .bind(&invoice.number)
        .bind(invoice.total)
        .bind(invoice.amount_due)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
