//! Document submissions and their ledger derivations
//!
//! Each document class turns its business payload into posting lines and
//! side effects. Totals are always recomputed here from the line items;
//! nothing in a payload is a precomputed total.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{
    Currency, CustomerId, ExchangeRate, InvoiceId, Money, ProductId, SupplierId, TenantId, UserId,
};

use crate::account::{AccountClass, ChartOfAccounts, DefaultAccounts};
use crate::document::{PostingLine, SideEffect};
use crate::error::LedgerError;
use crate::numbering::DocumentClass;

/// A document submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRequest {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub entry_date: NaiveDate,
    #[serde(default)]
    pub narration: String,
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub exchange_rate: Option<ExchangeRate>,
    pub body: DocumentBody,
}

/// Class-specific payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentBody {
    JournalVoucher(JournalVoucherBody),
    CreditNote(CreditNoteBody),
    ExpenseVoucher(VoucherBody),
    IncomeVoucher(VoucherBody),
    PaymentVoucher(PaymentVoucherBody),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalVoucherBody {
    pub lines: Vec<JournalLineInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalLineInput {
    pub account_code: String,
    #[serde(default)]
    pub debit: Decimal,
    #[serde(default)]
    pub credit: Decimal,
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub supplier_id: Option<SupplierId>,
    #[serde(default)]
    pub memo: Option<String>,
}

/// Goods returned against a sales invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditNoteBody {
    pub customer_id: CustomerId,
    pub invoice_id: InvoiceId,
    pub items: Vec<CreditNoteItem>,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub tax: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditNoteItem {
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

/// Expense or income voucher: item lines settled against one counter account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherBody {
    /// Cash/bank, or the payable (expense) / receivable (income) control account
    pub counter_account: String,
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub supplier_id: Option<SupplierId>,
    pub items: Vec<VoucherItem>,
    #[serde(default)]
    pub tax: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherItem {
    pub account_code: String,
    pub amount: Decimal,
    #[serde(default)]
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentDirection {
    /// Money received from a customer
    Receipt,
    /// Money paid to a supplier
    Disbursement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentVoucherBody {
    pub direction: PaymentDirection,
    pub cash_account: String,
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub supplier_id: Option<SupplierId>,
    pub allocations: Vec<PaymentAllocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAllocation {
    #[serde(default)]
    pub invoice_id: Option<InvoiceId>,
    pub amount: Decimal,
    #[serde(default)]
    pub memo: Option<String>,
}

/// Lines, side effects and total computed from a payload
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    pub lines: Vec<PostingLine>,
    pub effects: Vec<SideEffect>,
    pub total: Decimal,
}

/// Everything a derivation needs besides the payload
pub struct DerivationContext<'a> {
    pub chart: &'a ChartOfAccounts,
    pub accounts: &'a DefaultAccounts,
    pub currency: Currency,
}

impl DerivationContext<'_> {
    fn round(&self, amount: Decimal) -> Decimal {
        Money::new(amount, self.currency).round_to_currency().amount()
    }

    fn class_of(&self, code: &str) -> Option<AccountClass> {
        self.chart.classify(code).map(|c| c.class)
    }
}

impl DocumentBody {
    pub fn class(&self) -> DocumentClass {
        match self {
            DocumentBody::JournalVoucher(_) => DocumentClass::JournalVoucher,
            DocumentBody::CreditNote(_) => DocumentClass::CreditNote,
            DocumentBody::ExpenseVoucher(_) => DocumentClass::ExpenseVoucher,
            DocumentBody::IncomeVoucher(_) => DocumentClass::IncomeVoucher,
            DocumentBody::PaymentVoucher(_) => DocumentClass::PaymentVoucher,
        }
    }

    /// Computes the ledger footprint of this payload
    ///
    /// # Errors
    ///
    /// Returns `Validation` for missing or malformed fields. Balance is
    /// checked by the caller.
    pub fn derive(&self, ctx: &DerivationContext<'_>) -> Result<Derivation, LedgerError> {
        match self {
            DocumentBody::JournalVoucher(body) => derive_journal(body, ctx),
            DocumentBody::CreditNote(body) => derive_credit_note(body, ctx),
            DocumentBody::ExpenseVoucher(body) => derive_voucher(body, ctx, VoucherSide::Expense),
            DocumentBody::IncomeVoucher(body) => derive_voucher(body, ctx, VoucherSide::Income),
            DocumentBody::PaymentVoucher(body) => derive_payment(body, ctx),
        }
    }
}

fn require_positive(amount: Decimal, what: &str) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::validation(format!("{} must be positive", what)));
    }
    Ok(())
}

fn require_non_negative(amount: Decimal, what: &str) -> Result<(), LedgerError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(LedgerError::validation(format!("{} cannot be negative", what)));
    }
    Ok(())
}

fn derive_journal(
    body: &JournalVoucherBody,
    ctx: &DerivationContext<'_>,
) -> Result<Derivation, LedgerError> {
    if body.lines.len() < 2 {
        return Err(LedgerError::validation("a journal voucher needs at least two lines"));
    }

    let mut lines = Vec::with_capacity(body.lines.len());
    for input in &body.lines {
        if input.account_code.trim().is_empty() {
            return Err(LedgerError::validation("account_code is required on every line"));
        }
        require_non_negative(input.debit, "debit")?;
        require_non_negative(input.credit, "credit")?;

        let line = PostingLine {
            account_code: input.account_code.trim().to_string(),
            debit: ctx.round(input.debit),
            credit: ctx.round(input.credit),
            customer_id: input.customer_id,
            supplier_id: input.supplier_id,
            memo: input.memo.clone(),
        };
        if !line.is_one_sided() {
            return Err(LedgerError::validation(format!(
                "line on account {} must have either a debit or a credit",
                line.account_code
            )));
        }
        lines.push(line);
    }

    let total = lines.iter().map(|l| l.debit).sum();
    Ok(Derivation {
        lines,
        effects: Vec::new(),
        total,
    })
}

fn derive_credit_note(
    body: &CreditNoteBody,
    ctx: &DerivationContext<'_>,
) -> Result<Derivation, LedgerError> {
    if body.items.is_empty() {
        return Err(LedgerError::validation("a credit note needs at least one item"));
    }
    require_non_negative(body.discount, "discount")?;
    require_non_negative(body.tax, "tax")?;

    let mut subtotal = Decimal::ZERO;
    let mut effects = Vec::with_capacity(body.items.len() + 1);
    for item in &body.items {
        require_positive(item.quantity, "item quantity")?;
        require_non_negative(item.unit_price, "item unit_price")?;
        subtotal += item.quantity * item.unit_price;
        effects.push(SideEffect::AdjustStock {
            product_id: item.product_id,
            delta: item.quantity,
        });
    }

    let subtotal = ctx.round(subtotal);
    let discount = ctx.round(body.discount);
    let tax = ctx.round(body.tax);
    if discount > subtotal {
        return Err(LedgerError::validation("discount cannot exceed the subtotal"));
    }
    let total = subtotal - discount + tax;
    require_positive(total, "credit note total")?;

    let mut lines = Vec::with_capacity(3);
    let net = subtotal - discount;
    if net > Decimal::ZERO {
        lines.push(PostingLine::debit(&ctx.accounts.sales_returns, net));
    }
    if tax > Decimal::ZERO {
        lines.push(PostingLine::debit(&ctx.accounts.tax_payable, tax));
    }
    lines.push(
        PostingLine::credit(&ctx.accounts.receivable, total).with_customer(Some(body.customer_id)),
    );

    effects.insert(
        0,
        SideEffect::AdjustInvoiceDue {
            invoice_id: body.invoice_id,
            delta: -total,
        },
    );

    Ok(Derivation {
        lines,
        effects,
        total,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VoucherSide {
    Expense,
    Income,
}

fn derive_voucher(
    body: &VoucherBody,
    ctx: &DerivationContext<'_>,
    side: VoucherSide,
) -> Result<Derivation, LedgerError> {
    if body.items.is_empty() {
        return Err(LedgerError::validation("a voucher needs at least one item"));
    }
    require_non_negative(body.tax, "tax")?;

    let counter = body.counter_account.trim();
    let allowed = match side {
        VoucherSide::Expense => [AccountClass::Cash, AccountClass::Payable],
        VoucherSide::Income => [AccountClass::Cash, AccountClass::Receivable],
    };
    match ctx.class_of(counter) {
        Some(class) if allowed.contains(&class) => {}
        _ => {
            return Err(LedgerError::validation(format!(
                "counter account {} must be a cash/bank or {} account",
                counter,
                if side == VoucherSide::Expense { "payable" } else { "receivable" }
            )))
        }
    }

    let mut lines = Vec::with_capacity(body.items.len() + 2);
    let mut subtotal = Decimal::ZERO;
    for item in &body.items {
        require_positive(item.amount, "item amount")?;
        let amount = ctx.round(item.amount);
        subtotal += amount;
        let line = match side {
            VoucherSide::Expense => PostingLine::debit(item.account_code.trim(), amount),
            VoucherSide::Income => PostingLine::credit(item.account_code.trim(), amount),
        };
        lines.push(line.with_memo(item.memo.clone()));
    }

    let tax = ctx.round(body.tax);
    if tax > Decimal::ZERO {
        lines.push(match side {
            VoucherSide::Expense => PostingLine::debit(&ctx.accounts.input_tax, tax),
            VoucherSide::Income => PostingLine::credit(&ctx.accounts.tax_payable, tax),
        });
    }

    let total = subtotal + tax;
    let counter_line = match side {
        VoucherSide::Expense => PostingLine::credit(counter, total),
        VoucherSide::Income => PostingLine::debit(counter, total),
    };
    lines.push(
        counter_line
            .with_customer(body.customer_id)
            .with_supplier(body.supplier_id),
    );

    Ok(Derivation {
        lines,
        effects: Vec::new(),
        total,
    })
}

fn derive_payment(
    body: &PaymentVoucherBody,
    ctx: &DerivationContext<'_>,
) -> Result<Derivation, LedgerError> {
    if body.allocations.is_empty() {
        return Err(LedgerError::validation("a payment voucher needs at least one allocation"));
    }
    let cash = body.cash_account.trim();
    if ctx.class_of(cash) != Some(AccountClass::Cash) {
        return Err(LedgerError::validation(format!(
            "{} is not a cash or bank account",
            cash
        )));
    }

    let mut total = Decimal::ZERO;
    let mut effects = Vec::new();
    for allocation in &body.allocations {
        require_positive(allocation.amount, "allocation amount")?;
        let amount = ctx.round(allocation.amount);
        total += amount;
        if let Some(invoice_id) = allocation.invoice_id {
            if body.direction == PaymentDirection::Disbursement {
                return Err(LedgerError::validation(
                    "invoice allocations are only valid on customer receipts",
                ));
            }
            effects.push(SideEffect::AdjustInvoiceDue {
                invoice_id,
                delta: -amount,
            });
        }
    }

    let lines = match body.direction {
        PaymentDirection::Receipt => {
            let customer_id = body
                .customer_id
                .ok_or_else(|| LedgerError::validation("customer_id is required for a receipt"))?;
            vec![
                PostingLine::debit(cash, total),
                PostingLine::credit(&ctx.accounts.receivable, total).with_customer(Some(customer_id)),
            ]
        }
        PaymentDirection::Disbursement => {
            let supplier_id = body.supplier_id.ok_or_else(|| {
                LedgerError::validation("supplier_id is required for a disbursement")
            })?;
            vec![
                PostingLine::debit(&ctx.accounts.payable, total).with_supplier(Some(supplier_id)),
                PostingLine::credit(cash, total),
            ]
        }
    };

    Ok(Derivation {
        lines,
        effects,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::StandardChart;
    use rust_decimal_macros::dec;

    fn with_ctx<T>(f: impl FnOnce(&DerivationContext<'_>) -> T) -> T {
        let chart = StandardChart::chart();
        let accounts = DefaultAccounts::default();
        let ctx = DerivationContext {
            chart: &chart,
            accounts: &accounts,
            currency: Currency::USD,
        };
        f(&ctx)
    }

    #[test]
    fn test_credit_note_totals_are_recomputed() {
        let customer_id = CustomerId::new();
        let invoice_id = InvoiceId::new();
        let product_id = ProductId::new();
        let body = DocumentBody::CreditNote(CreditNoteBody {
            customer_id,
            invoice_id,
            items: vec![CreditNoteItem {
                product_id,
                quantity: dec!(10),
                unit_price: dec!(50),
            }],
            discount: dec!(20),
            tax: dec!(15),
        });

        let derivation = with_ctx(|ctx| body.derive(ctx)).unwrap();

        assert_eq!(derivation.total, dec!(495));
        assert_eq!(
            derivation.lines,
            vec![
                PostingLine::debit("4100", dec!(480)),
                PostingLine::debit("2200", dec!(15)),
                PostingLine::credit("1100", dec!(495)).with_customer(Some(customer_id)),
            ]
        );
        assert_eq!(
            derivation.effects,
            vec![
                SideEffect::AdjustInvoiceDue { invoice_id, delta: dec!(-495) },
                SideEffect::AdjustStock { product_id, delta: dec!(10) },
            ]
        );
    }

    #[test]
    fn test_credit_note_discount_above_subtotal_rejected() {
        let body = DocumentBody::CreditNote(CreditNoteBody {
            customer_id: CustomerId::new(),
            invoice_id: InvoiceId::new(),
            items: vec![CreditNoteItem {
                product_id: ProductId::new(),
                quantity: dec!(1),
                unit_price: dec!(10),
            }],
            discount: dec!(11),
            tax: dec!(0),
        });
        assert!(matches!(with_ctx(|ctx| body.derive(ctx)), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_journal_amounts_rounded_to_currency() {
        let body = DocumentBody::JournalVoucher(JournalVoucherBody {
            lines: vec![
                JournalLineInput {
                    account_code: "1000".into(),
                    debit: dec!(10.005),
                    credit: dec!(0),
                    customer_id: None,
                    supplier_id: None,
                    memo: None,
                },
                JournalLineInput {
                    account_code: "4000".into(),
                    debit: dec!(0),
                    credit: dec!(10.005),
                    customer_id: None,
                    supplier_id: None,
                    memo: None,
                },
            ],
        });
        let derivation = with_ctx(|ctx| body.derive(ctx)).unwrap();
        assert_eq!(derivation.lines[0].debit, dec!(10.01));
        assert_eq!(derivation.total, dec!(10.01));
    }

    #[test]
    fn test_expense_voucher_with_tax_on_payable() {
        let supplier_id = SupplierId::new();
        let body = DocumentBody::ExpenseVoucher(VoucherBody {
            counter_account: "2000".into(),
            customer_id: None,
            supplier_id: Some(supplier_id),
            items: vec![
                VoucherItem { account_code: "6100".into(), amount: dec!(1200), memo: None },
                VoucherItem { account_code: "6200".into(), amount: dec!(300), memo: None },
            ],
            tax: dec!(150),
        });
        let derivation = with_ctx(|ctx| body.derive(ctx)).unwrap();

        assert_eq!(derivation.total, dec!(1650));
        let last = derivation.lines.last().unwrap();
        assert_eq!(last.account_code, "2000");
        assert_eq!(last.credit, dec!(1650));
        assert_eq!(last.supplier_id, Some(supplier_id));
        assert!(derivation.lines.iter().any(|l| l.account_code == "1400" && l.debit == dec!(150)));
    }

    #[test]
    fn test_income_voucher_rejects_expense_counter_account() {
        let body = DocumentBody::IncomeVoucher(VoucherBody {
            counter_account: "6000".into(),
            customer_id: None,
            supplier_id: None,
            items: vec![VoucherItem { account_code: "4200".into(), amount: dec!(10), memo: None }],
            tax: dec!(0),
        });
        assert!(matches!(with_ctx(|ctx| body.derive(ctx)), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_receipt_settles_allocated_invoices() {
        let customer_id = CustomerId::new();
        let invoice_id = InvoiceId::new();
        let body = DocumentBody::PaymentVoucher(PaymentVoucherBody {
            direction: PaymentDirection::Receipt,
            cash_account: "1010".into(),
            customer_id: Some(customer_id),
            supplier_id: None,
            allocations: vec![
                PaymentAllocation { invoice_id: Some(invoice_id), amount: dec!(300), memo: None },
                PaymentAllocation { invoice_id: None, amount: dec!(50), memo: None },
            ],
        });
        let derivation = with_ctx(|ctx| body.derive(ctx)).unwrap();

        assert_eq!(derivation.total, dec!(350));
        assert_eq!(derivation.lines[0], PostingLine::debit("1010", dec!(350)));
        assert_eq!(
            derivation.effects,
            vec![SideEffect::AdjustInvoiceDue { invoice_id, delta: dec!(-300) }]
        );
    }

    #[test]
    fn test_disbursement_requires_supplier() {
        let body = DocumentBody::PaymentVoucher(PaymentVoucherBody {
            direction: PaymentDirection::Disbursement,
            cash_account: "1000".into(),
            customer_id: None,
            supplier_id: None,
            allocations: vec![PaymentAllocation { invoice_id: None, amount: dec!(10), memo: None }],
        });
        assert!(matches!(with_ctx(|ctx| body.derive(ctx)), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_body_json_is_tagged_by_class() {
        let json = r#"{"type":"journal_voucher","lines":[{"account_code":"1000","debit":"5"},{"account_code":"4000","credit":"5"}]}"#;
        let body: DocumentBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.class(), DocumentClass::JournalVoucher);
    }
}
