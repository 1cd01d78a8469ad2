//! Test Data Builders
//!
//! Builders for document submissions. Tests specify only the relevant
//! fields; everything else gets a sensible default.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use core_kernel::{Currency, CustomerId, InvoiceId, ProductId, SupplierId, TenantId, UserId};
use domain_ledger::requests::{
    CreditNoteBody, CreditNoteItem, JournalLineInput, JournalVoucherBody, PaymentAllocation,
    PaymentDirection, PaymentVoucherBody, VoucherBody, VoucherItem,
};
use domain_ledger::{DocumentBody, DocumentRequest};

use crate::fixtures::{AccountFixtures, DateFixtures};

/// Wraps a body into a request for one tenant and user
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    tenant_id: TenantId,
    user_id: UserId,
    entry_date: NaiveDate,
    narration: String,
    currency: Option<Currency>,
}

impl RequestBuilder {
    pub fn new(tenant_id: TenantId, user_id: UserId) -> Self {
        Self {
            tenant_id,
            user_id,
            entry_date: DateFixtures::jan(15),
            narration: "test document".to_string(),
            currency: None,
        }
    }

    pub fn on(mut self, entry_date: NaiveDate) -> Self {
        self.entry_date = entry_date;
        self
    }

    pub fn narration(mut self, narration: impl Into<String>) -> Self {
        self.narration = narration.into();
        self
    }

    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    pub fn body(self, body: DocumentBody) -> DocumentRequest {
        DocumentRequest {
            tenant_id: self.tenant_id,
            user_id: self.user_id,
            entry_date: self.entry_date,
            narration: self.narration,
            currency: self.currency,
            exchange_rate: None,
            body,
        }
    }

    pub fn journal(self, journal: JournalBuilder) -> DocumentRequest {
        self.body(journal.build())
    }
}

/// Builder for journal voucher bodies
#[derive(Debug, Clone, Default)]
pub struct JournalBuilder {
    lines: Vec<JournalLineInput>,
}

impl JournalBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Debit one account and credit another with the same amount
    pub fn transfer(debit: &str, credit: &str, amount: Decimal) -> Self {
        Self::new().debit(debit, amount).credit(credit, amount)
    }

    pub fn debit(mut self, account_code: &str, amount: Decimal) -> Self {
        self.lines.push(line(account_code, amount, Decimal::ZERO));
        self
    }

    pub fn credit(mut self, account_code: &str, amount: Decimal) -> Self {
        self.lines.push(line(account_code, Decimal::ZERO, amount));
        self
    }

    /// Tags the last line with a customer
    pub fn for_customer(mut self, customer_id: CustomerId) -> Self {
        if let Some(last) = self.lines.last_mut() {
            last.customer_id = Some(customer_id);
        }
        self
    }

    /// Tags the last line with a supplier
    pub fn for_supplier(mut self, supplier_id: SupplierId) -> Self {
        if let Some(last) = self.lines.last_mut() {
            last.supplier_id = Some(supplier_id);
        }
        self
    }

    pub fn lines(&self) -> &[JournalLineInput] {
        &self.lines
    }

    pub fn build(self) -> DocumentBody {
        DocumentBody::JournalVoucher(JournalVoucherBody { lines: self.lines })
    }
}

fn line(account_code: &str, debit: Decimal, credit: Decimal) -> JournalLineInput {
    JournalLineInput {
        account_code: account_code.to_string(),
        debit,
        credit,
        customer_id: None,
        supplier_id: None,
        memo: None,
    }
}

/// Builder for credit note bodies
#[derive(Debug, Clone)]
pub struct CreditNoteBuilder {
    customer_id: CustomerId,
    invoice_id: InvoiceId,
    items: Vec<CreditNoteItem>,
    discount: Decimal,
    tax: Decimal,
}

impl CreditNoteBuilder {
    pub fn new(customer_id: CustomerId, invoice_id: InvoiceId) -> Self {
        Self {
            customer_id,
            invoice_id,
            items: Vec::new(),
            discount: Decimal::ZERO,
            tax: Decimal::ZERO,
        }
    }

    pub fn item(mut self, product_id: ProductId, quantity: Decimal, unit_price: Decimal) -> Self {
        self.items.push(CreditNoteItem {
            product_id,
            quantity,
            unit_price,
        });
        self
    }

    pub fn discount(mut self, discount: Decimal) -> Self {
        self.discount = discount;
        self
    }

    pub fn tax(mut self, tax: Decimal) -> Self {
        self.tax = tax;
        self
    }

    pub fn build(self) -> DocumentBody {
        DocumentBody::CreditNote(CreditNoteBody {
            customer_id: self.customer_id,
            invoice_id: self.invoice_id,
            items: self.items,
            discount: self.discount,
            tax: self.tax,
        })
    }
}

/// Builder for expense and income voucher bodies
#[derive(Debug, Clone)]
pub struct VoucherBuilder {
    counter_account: String,
    customer_id: Option<CustomerId>,
    supplier_id: Option<SupplierId>,
    items: Vec<VoucherItem>,
    tax: Decimal,
}

impl Default for VoucherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VoucherBuilder {
    /// Settled in cash by default
    pub fn new() -> Self {
        Self {
            counter_account: AccountFixtures::CASH.to_string(),
            customer_id: None,
            supplier_id: None,
            items: Vec::new(),
            tax: Decimal::ZERO,
        }
    }

    pub fn counter(mut self, account_code: &str) -> Self {
        self.counter_account = account_code.to_string();
        self
    }

    pub fn customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn supplier(mut self, supplier_id: SupplierId) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }

    pub fn item(mut self, account_code: &str, amount: Decimal) -> Self {
        self.items.push(VoucherItem {
            account_code: account_code.to_string(),
            amount,
            memo: None,
        });
        self
    }

    pub fn tax(mut self, tax: Decimal) -> Self {
        self.tax = tax;
        self
    }

    fn body(self) -> VoucherBody {
        VoucherBody {
            counter_account: self.counter_account,
            customer_id: self.customer_id,
            supplier_id: self.supplier_id,
            items: self.items,
            tax: self.tax,
        }
    }

    pub fn expense(self) -> DocumentBody {
        DocumentBody::ExpenseVoucher(self.body())
    }

    pub fn income(self) -> DocumentBody {
        DocumentBody::IncomeVoucher(self.body())
    }
}

/// Builder for payment voucher bodies
#[derive(Debug, Clone)]
pub struct PaymentBuilder {
    direction: PaymentDirection,
    cash_account: String,
    customer_id: Option<CustomerId>,
    supplier_id: Option<SupplierId>,
    allocations: Vec<PaymentAllocation>,
}

impl PaymentBuilder {
    pub fn receipt(customer_id: CustomerId) -> Self {
        Self {
            direction: PaymentDirection::Receipt,
            cash_account: AccountFixtures::BANK.to_string(),
            customer_id: Some(customer_id),
            supplier_id: None,
            allocations: Vec::new(),
        }
    }

    pub fn disbursement(supplier_id: SupplierId) -> Self {
        Self {
            direction: PaymentDirection::Disbursement,
            cash_account: AccountFixtures::BANK.to_string(),
            customer_id: None,
            supplier_id: Some(supplier_id),
            allocations: Vec::new(),
        }
    }

    pub fn cash_account(mut self, account_code: &str) -> Self {
        self.cash_account = account_code.to_string();
        self
    }

    pub fn against(mut self, invoice_id: InvoiceId, amount: Decimal) -> Self {
        self.allocations.push(PaymentAllocation {
            invoice_id: Some(invoice_id),
            amount,
            memo: None,
        });
        self
    }

    pub fn on_account(mut self, amount: Decimal) -> Self {
        self.allocations.push(PaymentAllocation {
            invoice_id: None,
            amount,
            memo: None,
        });
        self
    }

    pub fn build(self) -> DocumentBody {
        DocumentBody::PaymentVoucher(PaymentVoucherBody {
            direction: self.direction,
            cash_account: self.cash_account,
            customer_id: self.customer_id,
            supplier_id: self.supplier_id,
            allocations: self.allocations,
        })
    }
}
