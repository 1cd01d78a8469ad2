//! Report and balance query DTOs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use domain_ledger::{BalanceWindow, RawBalance};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct AsOfQuery {
    pub as_of: NaiveDate,
}

/// Either `as_of`, or `from` and `to`; `accounts` is a comma-separated code list
#[derive(Debug, Default, Deserialize)]
pub struct BalanceQuery {
    pub as_of: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub accounts: Option<String>,
}

/// The resolved shape of a balance query
#[derive(Debug, PartialEq, Eq)]
pub enum BalanceScope {
    AsOf(NaiveDate),
    Between(NaiveDate, NaiveDate),
}

impl BalanceQuery {
    pub fn scope(&self) -> Result<BalanceScope, ApiError> {
        match (self.as_of, self.from, self.to) {
            (Some(as_of), None, None) => Ok(BalanceScope::AsOf(as_of)),
            (None, Some(from), Some(to)) => Ok(BalanceScope::Between(from, to)),
            _ => Err(ApiError::BadRequest(
                "give either as_of, or both from and to".to_string(),
            )),
        }
    }

    pub fn account_codes(&self) -> Option<Vec<String>> {
        self.accounts.as_ref().map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BalancesResponse {
    AsOf {
        as_of: NaiveDate,
        balances: Vec<RawBalance>,
    },
    Between {
        from: NaiveDate,
        to: NaiveDate,
        balances: Vec<BalanceWindow>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_scope_resolution() {
        let as_of = BalanceQuery {
            as_of: Some(date(31)),
            ..Default::default()
        };
        assert_eq!(as_of.scope().unwrap(), BalanceScope::AsOf(date(31)));

        let between = BalanceQuery {
            from: Some(date(1)),
            to: Some(date(31)),
            ..Default::default()
        };
        assert_eq!(between.scope().unwrap(), BalanceScope::Between(date(1), date(31)));

        let mixed = BalanceQuery {
            as_of: Some(date(31)),
            from: Some(date(1)),
            ..Default::default()
        };
        assert!(mixed.scope().is_err());
        assert!(BalanceQuery::default().scope().is_err());
    }

    #[test]
    fn test_account_codes_split() {
        let query = BalanceQuery {
            accounts: Some("1000, 1010,,4000".to_string()),
            ..Default::default()
        };
        assert_eq!(
            query.account_codes(),
            Some(vec!["1000".to_string(), "1010".to_string(), "4000".to_string()])
        );
        assert_eq!(BalanceQuery::default().account_codes(), None);
    }
}
