//! Presentation signs
//!
//! Raw balances are credit minus debit. Statements show every account with
//! its natural balance positive, so debit-natural types are flipped.

use rust_decimal::Decimal;

use crate::account::AccountType;

/// Multiplier turning a raw balance into a presented one
pub fn natural_sign(account_type: AccountType) -> Decimal {
    if account_type.is_debit_normal() {
        Decimal::NEGATIVE_ONE
    } else {
        Decimal::ONE
    }
}

/// Presented amount: assets, cost of sales and expenses flipped; the rest as recorded
pub fn present(account_type: AccountType, raw: Decimal) -> Decimal {
    raw * natural_sign(account_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sign_table() {
        assert_eq!(present(AccountType::Asset, dec!(-1000)), dec!(1000));
        assert_eq!(present(AccountType::Expense, dec!(-40)), dec!(40));
        assert_eq!(present(AccountType::CostOfSales, dec!(-40)), dec!(40));
        assert_eq!(present(AccountType::Liability, dec!(250)), dec!(250));
        assert_eq!(present(AccountType::Equity, dec!(250)), dec!(250));
        assert_eq!(present(AccountType::Revenue, dec!(1000)), dec!(1000));
    }
}
