//! Chart of accounts and account classification
//!
//! Account codes are numeric strings whose leading digits encode the
//! hierarchy. Classification is a longest-prefix match against a fixed rule
//! table. A code no rule covers is "unclassified": it cannot be registered
//! or posted to, and the report engine skips any such code it still finds.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Top-level account types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccountType {
    /// Debit-natural
    Asset,
    /// Credit-natural
    Liability,
    /// Credit-natural
    Equity,
    /// Credit-natural
    Revenue,
    /// Debit-natural
    CostOfSales,
    /// Debit-natural
    Expense,
}

impl AccountType {
    /// Returns true if this account type has a debit normal balance
    pub fn is_debit_normal(&self) -> bool {
        matches!(
            self,
            AccountType::Asset | AccountType::CostOfSales | AccountType::Expense
        )
    }

    /// Revenue, cost of sales and expense accounts feed the income statement
    pub fn is_income_statement(&self) -> bool {
        matches!(
            self,
            AccountType::Revenue | AccountType::CostOfSales | AccountType::Expense
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "Asset",
            AccountType::Liability => "Liability",
            AccountType::Equity => "Equity",
            AccountType::Revenue => "Revenue",
            AccountType::CostOfSales => "CostOfSales",
            AccountType::Expense => "Expense",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Asset" => Ok(AccountType::Asset),
            "Liability" => Ok(AccountType::Liability),
            "Equity" => Ok(AccountType::Equity),
            "Revenue" => Ok(AccountType::Revenue),
            "CostOfSales" => Ok(AccountType::CostOfSales),
            "Expense" => Ok(AccountType::Expense),
            other => Err(LedgerError::validation(format!("unknown account type: {}", other))),
        }
    }
}

/// Fine-grained classification used by statement layout and cash-flow
/// activity bucketing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountClass {
    Cash,
    Receivable,
    Inventory,
    OtherCurrentAsset,
    FixedAsset,
    AccumulatedDepreciation,
    Payable,
    OtherCurrentLiability,
    ShortTermDebt,
    LongTermLiability,
    Equity,
    Revenue,
    CostOfSales,
    Expense,
}

impl AccountClass {
    pub fn account_type(&self) -> AccountType {
        match self {
            AccountClass::Cash
            | AccountClass::Receivable
            | AccountClass::Inventory
            | AccountClass::OtherCurrentAsset
            | AccountClass::FixedAsset
            | AccountClass::AccumulatedDepreciation => AccountType::Asset,
            AccountClass::Payable
            | AccountClass::OtherCurrentLiability
            | AccountClass::ShortTermDebt
            | AccountClass::LongTermLiability => AccountType::Liability,
            AccountClass::Equity => AccountType::Equity,
            AccountClass::Revenue => AccountType::Revenue,
            AccountClass::CostOfSales => AccountType::CostOfSales,
            AccountClass::Expense => AccountType::Expense,
        }
    }

    /// Current (short-term) balance sheet item
    pub fn is_current(&self) -> bool {
        matches!(
            self,
            AccountClass::Cash
                | AccountClass::Receivable
                | AccountClass::Inventory
                | AccountClass::OtherCurrentAsset
                | AccountClass::Payable
                | AccountClass::OtherCurrentLiability
                | AccountClass::ShortTermDebt
        )
    }
}

/// Result of classifying an account code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub account_type: AccountType,
    pub sub_type: String,
    pub class: AccountClass,
}

struct PrefixRule {
    prefix: &'static str,
    class: AccountClass,
    sub_type: &'static str,
}

const fn rule(prefix: &'static str, class: AccountClass, sub_type: &'static str) -> PrefixRule {
    PrefixRule { prefix, class, sub_type }
}

static PREFIX_RULES: &[PrefixRule] = &[
    rule("10", AccountClass::Cash, "Cash and Bank"),
    rule("11", AccountClass::Receivable, "Accounts Receivable"),
    rule("12", AccountClass::Inventory, "Inventory"),
    rule("13", AccountClass::OtherCurrentAsset, "Prepaid Expenses"),
    rule("14", AccountClass::OtherCurrentAsset, "Input Tax"),
    rule("15", AccountClass::FixedAsset, "Fixed Assets"),
    rule("16", AccountClass::FixedAsset, "Fixed Assets"),
    rule("17", AccountClass::FixedAsset, "Fixed Assets"),
    rule("18", AccountClass::FixedAsset, "Fixed Assets"),
    rule("159", AccountClass::AccumulatedDepreciation, "Accumulated Depreciation"),
    rule("20", AccountClass::Payable, "Accounts Payable"),
    rule("21", AccountClass::OtherCurrentLiability, "Accrued Liabilities"),
    rule("22", AccountClass::OtherCurrentLiability, "Tax Payable"),
    rule("23", AccountClass::ShortTermDebt, "Short-term Borrowings"),
    rule("25", AccountClass::LongTermLiability, "Long-term Liabilities"),
    rule("26", AccountClass::LongTermLiability, "Long-term Liabilities"),
    rule("27", AccountClass::LongTermLiability, "Long-term Liabilities"),
    rule("28", AccountClass::LongTermLiability, "Long-term Liabilities"),
    rule("29", AccountClass::LongTermLiability, "Long-term Liabilities"),
    rule("3", AccountClass::Equity, "Equity"),
    rule("4", AccountClass::Revenue, "Revenue"),
    rule("5", AccountClass::CostOfSales, "Cost of Sales"),
    rule("6", AccountClass::Expense, "Operating Expenses"),
    rule("7", AccountClass::Expense, "Other Expenses"),
];

/// Classifies a code by the longest matching prefix rule
pub fn classify_code(code: &str) -> Option<Classification> {
    PREFIX_RULES
        .iter()
        .filter(|r| code.starts_with(r.prefix))
        .max_by_key(|r| r.prefix.len())
        .map(|r| Classification {
            account_type: r.class.account_type(),
            sub_type: r.sub_type.to_string(),
            class: r.class,
        })
}

/// An account in the chart of accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Natural key, never reused
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub sub_type: String,
}

impl Account {
    /// Creates an account whose sub-type comes from the prefix rules, or
    /// "Other" when no rule covers the code (such an account fails `validate`)
    pub fn new(code: impl Into<String>, name: impl Into<String>, account_type: AccountType) -> Self {
        let code = code.into();
        let sub_type = classify_code(&code)
            .map(|c| c.sub_type)
            .unwrap_or_else(|| "Other".to_string());
        Self {
            code,
            name: name.into(),
            account_type,
            sub_type,
        }
    }

    pub fn with_sub_type(mut self, sub_type: impl Into<String>) -> Self {
        self.sub_type = sub_type.into();
        self
    }

    /// Checks the code shape and agreement with the prefix rules
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.code.is_empty() || !self.code.chars().all(|c| c.is_ascii_digit()) {
            return Err(LedgerError::validation(format!(
                "account code must be numeric: '{}'",
                self.code
            )));
        }
        if self.name.trim().is_empty() {
            return Err(LedgerError::validation("account name is required"));
        }
        let classification = classify_code(&self.code).ok_or_else(|| {
            LedgerError::validation(format!(
                "account code {} matches no classification rule",
                self.code
            ))
        })?;
        if classification.account_type != self.account_type {
            return Err(LedgerError::validation(format!(
                "account {} is declared {} but its code belongs to {}",
                self.code, self.account_type, classification.account_type
            )));
        }
        Ok(())
    }
}

/// Accounts the document derivations post to by default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultAccounts {
    pub receivable: String,
    pub payable: String,
    pub sales_returns: String,
    pub tax_payable: String,
    pub input_tax: String,
}

impl Default for DefaultAccounts {
    fn default() -> Self {
        Self {
            receivable: "1100".to_string(),
            payable: "2000".to_string(),
            sales_returns: "4100".to_string(),
            tax_payable: "2200".to_string(),
            input_tax: "1400".to_string(),
        }
    }
}

/// Tenant-scoped, read-only view of the chart of accounts
#[derive(Debug, Clone, Default)]
pub struct ChartOfAccounts {
    accounts: BTreeMap<String, Account>,
}

impl ChartOfAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a chart from stored accounts; later duplicates are ignored
    pub fn from_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let mut chart = Self::new();
        for account in accounts {
            chart.accounts.entry(account.code.clone()).or_insert(account);
        }
        chart
    }

    /// Adds an account to the chart
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the code is malformed, matches no prefix rule,
    /// disagrees with its rule's type, or is already registered
    pub fn register(&mut self, account: Account) -> Result<(), LedgerError> {
        account.validate()?;
        if self.accounts.contains_key(&account.code) {
            return Err(LedgerError::validation(format!(
                "account code {} already exists",
                account.code
            )));
        }
        self.accounts.insert(account.code.clone(), account);
        Ok(())
    }

    pub fn get(&self, code: &str) -> Option<&Account> {
        self.accounts.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.accounts.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Classifies a code; the registered sub-type wins over the rule's label
    pub fn classify(&self, code: &str) -> Option<Classification> {
        let mut classification = classify_code(code)?;
        if let Some(account) = self.accounts.get(code) {
            classification.sub_type = account.sub_type.clone();
        }
        Some(classification)
    }

    /// Accounts whose code starts with any of the given prefixes
    pub fn by_prefix(&self, prefixes: &[&str]) -> Vec<&Account> {
        self.accounts
            .values()
            .filter(|a| prefixes.iter().any(|p| a.code.starts_with(p)))
            .collect()
    }

    /// Display name for a code, falling back to the code itself
    pub fn name_of(&self, code: &str) -> String {
        self.accounts
            .get(code)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| code.to_string())
    }
}

/// Standard chart for a small trading business
pub struct StandardChart;

impl StandardChart {
    pub fn accounts() -> Vec<Account> {
        vec![
            // Assets
            Account::new("1000", "Cash on Hand", AccountType::Asset),
            Account::new("1010", "Bank", AccountType::Asset),
            Account::new("1100", "Accounts Receivable", AccountType::Asset),
            Account::new("1200", "Inventory", AccountType::Asset),
            Account::new("1300", "Prepaid Expenses", AccountType::Asset),
            Account::new("1400", "Input Tax", AccountType::Asset),
            Account::new("1500", "Equipment", AccountType::Asset),
            Account::new("1510", "Vehicles", AccountType::Asset),
            Account::new("1590", "Accumulated Depreciation", AccountType::Asset),
            // Liabilities
            Account::new("2000", "Accounts Payable", AccountType::Liability),
            Account::new("2100", "Accrued Expenses", AccountType::Liability),
            Account::new("2200", "Tax Payable", AccountType::Liability),
            Account::new("2300", "Short-term Borrowings", AccountType::Liability),
            Account::new("2500", "Long-term Loans", AccountType::Liability),
            // Equity
            Account::new("3000", "Owner's Capital", AccountType::Equity),
            Account::new("3200", "Owner's Drawings", AccountType::Equity),
            // Revenue
            Account::new("4000", "Sales Revenue", AccountType::Revenue),
            Account::new("4100", "Sales Returns", AccountType::Revenue),
            Account::new("4200", "Other Income", AccountType::Revenue),
            // Cost of sales
            Account::new("5000", "Cost of Goods Sold", AccountType::CostOfSales),
            // Expenses
            Account::new("6000", "Salaries", AccountType::Expense),
            Account::new("6100", "Rent", AccountType::Expense),
            Account::new("6200", "Utilities", AccountType::Expense),
            Account::new("6300", "Depreciation Expense", AccountType::Expense),
            Account::new("6900", "Other Operating Expenses", AccountType::Expense),
            Account::new("7000", "Interest Expense", AccountType::Expense),
        ]
    }

    pub fn chart() -> ChartOfAccounts {
        ChartOfAccounts::from_accounts(Self::accounts())
    }
}
