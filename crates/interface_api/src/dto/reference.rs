//! Reference data DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::CustomerId;
use domain_ledger::{Account, AccountType};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(length(min = 1, max = 20))]
    pub code: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub account_type: AccountType,
    /// Derived from the code when omitted
    #[serde(default)]
    pub sub_type: Option<String>,
}

impl CreateAccountRequest {
    pub fn into_account(self) -> Account {
        let account = Account::new(self.code, self.name, self.account_type);
        match self.sub_type {
            Some(sub_type) => account.with_sub_type(sub_type),
            None => account,
        }
    }
}

/// Customer or supplier
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePartyRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub stock_on_hand: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    pub customer_id: CustomerId,
    #[validate(length(min = 1, max = 64))]
    pub number: String,
    pub total: Decimal,
    /// Defaults to the full total
    #[serde(default)]
    pub amount_due: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub success: bool,
    pub id: Uuid,
}

impl CreatedResponse {
    pub fn new(id: impl Into<Uuid>) -> Self {
        Self {
            success: true,
            id: id.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StandardChartResponse {
    pub success: bool,
    pub added: usize,
}
