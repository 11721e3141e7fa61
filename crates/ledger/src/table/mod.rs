//! The capability the remote stores consume from their backing service.
//!
//! A table holds items addressed by a partition key and a sort key. It offers
//! point reads, writes guarded by an existence [`Condition`], all-or-nothing
//! multi-item transactions and paginated scans of a sort-key interval inside
//! one partition.

use async_trait::async_trait;
use sea_orm::DbErr;
use serde_json::Value;
use thiserror::Error;

use crate::error::BackendFault;

mod items;
mod sql;

pub use sql::SqlTable;

/// Non-key attributes of an item.
pub type Attributes = serde_json::Map<String, Value>;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub pk: String,
    pub sk: String,
}

impl ItemKey {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub key: ItemKey,
    pub attrs: Attributes,
}

/// Precondition on the current existence of the addressed item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Condition {
    #[default]
    None,
    Exists,
    NotExists,
}

/// One write of a [`Table::transact_write`] call.
#[derive(Clone, Debug, PartialEq)]
pub enum TransactItem {
    Put { item: Item, condition: Condition },
    Delete { key: ItemKey, condition: Condition },
}

impl TransactItem {
    fn key(&self) -> &ItemKey {
        match self {
            TransactItem::Put { item, .. } => &item.key,
            TransactItem::Delete { key, .. } => key,
        }
    }
}

/// Why a transaction was canceled, reported for each of its items in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancellationReason {
    None,
    ConditionalCheckFailed,
}

/// Half-open sort-key interval `[start, end)`; a missing bound is unbounded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SortKeyRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl SortKeyRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }

    pub fn contains(&self, sk: &str) -> bool {
        self.start.as_deref().is_none_or(|start| start <= sk)
            && self.end.as_deref().is_none_or(|end| sk < end)
    }
}

/// Keeps only items whose `attribute` equals one of `any_of`.
///
/// Applied after the key condition, so a page may hold fewer items than its
/// size even when more pages follow.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeFilter {
    pub attribute: String,
    pub any_of: Vec<Value>,
}

impl AttributeFilter {
    pub fn matches(&self, attrs: &Attributes) -> bool {
        attrs
            .get(&self.attribute)
            .is_some_and(|value| self.any_of.contains(value))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScanRequest {
    pub pk: String,
    pub range: SortKeyRange,
    pub filter: Option<AttributeFilter>,
    pub page_size: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,
    /// Sort key to resume after; `None` on the last page.
    pub last_key: Option<String>,
}

#[derive(Error, Debug)]
pub enum TableError {
    #[error("condition check failed")]
    ConditionFailed,
    #[error("transaction canceled: {0:?}")]
    Canceled(Vec<CancellationReason>),
    #[error(transparent)]
    Fault(#[from] BackendFault),
}

impl From<DbErr> for TableError {
    fn from(value: DbErr) -> Self {
        Self::Fault(BackendFault::Database(value))
    }
}

impl From<serde_json::Error> for TableError {
    fn from(value: serde_json::Error) -> Self {
        Self::Fault(BackendFault::Codec(value))
    }
}

#[async_trait]
pub trait Table: Send + Sync {
    async fn get_item(&self, key: &ItemKey) -> Result<Option<Item>, TableError>;

    async fn put_item(&self, item: Item, condition: Condition) -> Result<(), TableError>;

    /// Overwrite the attributes named in `set`, keeping the others, and
    /// return the resulting item.
    async fn update_item(
        &self,
        key: &ItemKey,
        set: Attributes,
        condition: Condition,
    ) -> Result<Item, TableError>;

    /// Deleting an absent item without a condition succeeds silently.
    async fn delete_item(&self, key: &ItemKey, condition: Condition) -> Result<(), TableError>;

    /// Apply every write or none of them. A failed condition cancels the
    /// whole transaction with [`TableError::Canceled`].
    async fn transact_write(&self, items: Vec<TransactItem>) -> Result<(), TableError>;

    /// One page of `request`, resuming after the sort key `start_after`.
    async fn query_page(
        &self,
        request: &ScanRequest,
        start_after: Option<&str>,
    ) -> Result<Page, TableError>;
}

/// Drain every page of `request`. A failing page fails the whole scan.
pub async fn scan_all<T>(table: &T, request: &ScanRequest) -> Result<Vec<Item>, TableError>
where
    T: Table + ?Sized,
{
    let mut items = Vec::new();
    let mut start_after: Option<String> = None;
    loop {
        let page = table.query_page(request, start_after.as_deref()).await?;
        items.extend(page.items);
        match page.last_key {
            Some(last) => start_after = Some(last),
            None => break,
        }
    }
    tracing::debug!(pk = %request.pk, count = items.len(), "scanned partition");
    Ok(items)
}

/// Reject transactions the backing service would refuse outright.
pub(crate) fn check_transaction(items: &[TransactItem]) -> Result<(), TableError> {
    if items.is_empty() {
        return Err(BackendFault::InvalidKey("empty transaction".to_string()).into());
    }
    for (index, item) in items.iter().enumerate() {
        if items[..index].iter().any(|prev| prev.key() == item.key()) {
            return Err(BackendFault::InvalidKey(format!(
                "item {}::{} appears twice in one transaction",
                item.key().pk,
                item.key().sk
            ))
            .into());
        }
    }
    Ok(())
}
