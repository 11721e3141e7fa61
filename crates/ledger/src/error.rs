//! The module contains the errors the ledger can throw.
//!
//! The errors are:
//!
//! - [`Validation`] thrown when a record or argument is malformed, before any
//!   backend call.
//! - [`Range`] thrown when a query window violates the day bounds.
//! - [`NotFound`] thrown when a keyed operation references an absent record.
//! - [`AlreadyExists`] thrown when a create violates key uniqueness.
//! - [`Backend`] wraps any unexpected failure of the underlying store.
//!
//!  [`Validation`]: LedgerError::Validation
//!  [`Range`]: LedgerError::Range
//!  [`NotFound`]: LedgerError::NotFound
//!  [`AlreadyExists`]: LedgerError::AlreadyExists
//!  [`Backend`]: LedgerError::Backend
use std::time::Duration;

use sea_orm::DbErr;
use thiserror::Error;

use crate::table::CancellationReason;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid range: {0}")]
    Range(String),
    #[error("\"{0}\" key not found!")]
    NotFound(String),
    #[error("\"{0}\" already present!")]
    AlreadyExists(String),
    #[error("Expense limit reached for month {month} in vault {vault}")]
    MonthLimitExceeded { month: String, vault: String },
    #[error(transparent)]
    Backend(#[from] BackendFault),
}

/// Failures coming from the backing store, with the original cause preserved.
#[derive(Error, Debug)]
pub enum BackendFault {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("failed to encode or decode item: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("corrupt item: {0}")]
    Corrupt(String),
    #[error("transaction canceled: {0:?}")]
    Transaction(Vec<CancellationReason>),
}

impl From<DbErr> for LedgerError {
    fn from(value: DbErr) -> Self {
        Self::Backend(BackendFault::Database(value))
    }
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Range(a), Self::Range(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::AlreadyExists(a), Self::AlreadyExists(b)) => a == b,
            (
                Self::MonthLimitExceeded { month: a, vault: x },
                Self::MonthLimitExceeded { month: b, vault: y },
            ) => a == b && x == y,
            (Self::Backend(a), Self::Backend(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
