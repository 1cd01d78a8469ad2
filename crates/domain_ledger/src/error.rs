//! Ledger domain errors

use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::{MoneyError, PortError};

/// Errors raised by posting, numbering and reporting
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A required field is missing or malformed; rejected before any write
    #[error("Validation error: {0}")]
    Validation(String),

    /// Total debits differ from total credits
    #[error("Unbalanced entry: debits={debits}, credits={credits}")]
    Unbalanced {
        debits: Decimal,
        credits: Decimal,
    },

    /// A concurrent writer claimed the same document number
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Dangling or unusable reference (unknown account, already reversed document)
    #[error("Reference error: {0}")]
    Reference(String),

    /// Single-entity lookup on something that does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage adapter failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    pub fn reference(message: impl Into<String>) -> Self {
        LedgerError::Reference(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        LedgerError::NotFound(message.into())
    }

    /// Stable machine-readable kind used in error envelopes
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::Validation(_) => "validation_error",
            LedgerError::Unbalanced { .. } => "unbalanced_entry",
            LedgerError::Conflict(_) => "conflict",
            LedgerError::Reference(_) => "reference_error",
            LedgerError::NotFound(_) => "not_found",
            LedgerError::Storage(_) => "storage_error",
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, LedgerError::Conflict(_))
    }
}

impl From<PortError> for LedgerError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, id } => {
                LedgerError::Reference(format!("{} {} does not exist", entity_type, id))
            }
            PortError::Validation { message, .. } => LedgerError::Validation(message),
            PortError::Conflict { message } => LedgerError::Conflict(message),
            other => LedgerError::Storage(other.to_string()),
        }
    }
}

impl From<MoneyError> for LedgerError {
    fn from(err: MoneyError) -> Self {
        LedgerError::Validation(err.to_string())
    }
}
