//! Stores backed by a remote partitioned [`Table`](crate::table::Table).
//!
//! The stores own key construction and translate the table's condition
//! failures into the domain errors. Each operation is bounded by the
//! configured timeout as a whole.

use std::{future::Future, time::Duration};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    ResultLedger,
    error::BackendFault,
    table::{Attributes, Item, TableError},
};

mod categories;
mod expenses;

pub use categories::RemoteCategoryStore;
pub use expenses::RemoteExpenseStore;

/// Await `operation`, failing with a timeout fault once `timeout` elapses.
///
/// The operation is dropped on timeout, so nothing it gathered so far is
/// returned.
async fn bounded<R>(
    timeout: Duration,
    operation: impl Future<Output = ResultLedger<R>>,
) -> ResultLedger<R> {
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(?timeout, "remote operation timed out");
            Err(BackendFault::Timeout(timeout).into())
        }
    }
}

fn to_attributes<T: Serialize>(value: &T) -> Result<Attributes, BackendFault> {
    match serde_json::to_value(value)? {
        Value::Object(attrs) => Ok(attrs),
        other => Err(BackendFault::Corrupt(format!(
            "expected an attribute object, got {other}"
        ))),
    }
}

fn from_item<T: DeserializeOwned>(item: Item) -> Result<(String, T), BackendFault> {
    let value = serde_json::from_value(Value::Object(item.attrs))?;
    Ok((item.key.sk, value))
}

/// Table failures that have no domain meaning for the caller.
fn fault(err: TableError) -> BackendFault {
    match err {
        TableError::Fault(fault) => fault,
        TableError::Canceled(reasons) => BackendFault::Transaction(reasons),
        TableError::ConditionFailed => {
            BackendFault::Corrupt("unexpected condition failure".to_string())
        }
    }
}
