//! Unit tests for the Money module
//!
//! Covers creation, currency rounding, arithmetic, tolerance comparison and
//! exchange-rate validation.

use core_kernel::{Currency, ExchangeRate, Money, MoneyError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_rounds_to_four_decimal_places() {
        let m = Money::new(dec!(100.123456789), Currency::USD);
        assert_eq!(m.amount(), dec!(100.1235));
    }

    #[test]
    fn test_zero_creates_zero_amount() {
        let m = Money::zero(Currency::IDR);
        assert!(m.is_zero());
        assert!(!m.is_positive());
        assert!(!m.is_negative());
        assert_eq!(m.currency(), Currency::IDR);
    }

    #[test]
    fn test_negative_amount_creation() {
        let m = Money::new(dec!(-100.00), Currency::USD);
        assert!(m.is_negative());
        assert_eq!(m.abs().amount(), dec!(100.00));
    }
}

mod rounding {
    use super::*;

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(
            Money::new(dec!(2.345), Currency::EUR).round_to_currency().amount(),
            dec!(2.35)
        );
        assert_eq!(
            Money::new(dec!(-2.345), Currency::EUR).round_to_currency().amount(),
            dec!(-2.35)
        );
    }

    #[test]
    fn test_zero_decimal_currency() {
        assert_eq!(Currency::JPY.decimal_places(), 0);
        assert_eq!(
            Money::new(dec!(99.4), Currency::JPY).round_to_currency().amount(),
            dec!(99)
        );
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_add_and_sub() {
        let a = Money::new(dec!(500), Currency::USD);
        let b = Money::new(dec!(20), Currency::USD);
        let c = Money::new(dec!(15), Currency::USD);

        assert_eq!((a - b + c).amount(), dec!(495));
    }

    #[test]
    fn test_checked_sub_currency_mismatch() {
        let usd = Money::new(dec!(1), Currency::USD);
        let gbp = Money::new(dec!(1), Currency::GBP);
        assert_eq!(
            usd.checked_sub(&gbp),
            Err(MoneyError::CurrencyMismatch("USD".into(), "GBP".into()))
        );
    }

    #[test]
    fn test_multiply_by_quantity() {
        let unit_price = Money::new(dec!(50), Currency::USD);
        assert_eq!(unit_price.multiply(dec!(10)).amount(), dec!(500));
    }

    #[test]
    fn test_negation() {
        let m = Money::new(dec!(12.5), Currency::USD);
        assert_eq!((-m).amount(), dec!(-12.5));
    }

    #[test]
    #[should_panic(expected = "Currency mismatch")]
    fn test_add_operator_panics_on_mismatch() {
        let _ = Money::new(dec!(1), Currency::USD) + Money::new(dec!(1), Currency::EUR);
    }
}

mod display {
    use super::*;

    #[test]
    fn test_display_uses_currency_places() {
        assert_eq!(Money::new(dec!(10), Currency::USD).to_string(), "USD 10.00");
        assert_eq!(Money::new(dec!(1500), Currency::JPY).to_string(), "JPY 1500");
    }

    #[test]
    fn test_currency_serde_is_uppercase_code() {
        let json = serde_json::to_string(&Currency::MYR).unwrap();
        assert_eq!(json, "\"MYR\"");
        let back: Currency = serde_json::from_str("\"SGD\"").unwrap();
        assert_eq!(back, Currency::SGD);
    }
}

mod exchange_rate {
    use super::*;

    #[test]
    fn test_rate_deserialization_rejects_non_positive() {
        assert!(serde_json::from_str::<ExchangeRate>("\"0\"").is_err());
        let rate: ExchangeRate = serde_json::from_str("\"1.2345\"").unwrap();
        assert_eq!(rate.value(), dec!(1.2345));
    }

    #[test]
    fn test_identity_rate() {
        assert_eq!(ExchangeRate::identity().value(), Decimal::ONE);
    }
}
