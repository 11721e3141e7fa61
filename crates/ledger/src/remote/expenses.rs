use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Amount, Currency, Expense, LedgerError, ResultLedger,
    dates::{self, Clock},
    error::BackendFault,
    keys,
    range::{CategoryFilter, DateWindow},
    store::{ExpenseStore, StoreOptions},
    table::{
        AttributeFilter, CancellationReason, Condition, Item, ItemKey, ScanRequest, SortKeyRange,
        Table, TableError, TransactItem, scan_all,
    },
};

use super::{bounded, fault, from_item, to_attributes};

/// Persisted attributes of an expense; the sort key is the item key.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredExpense {
    name: String,
    date: NaiveDate,
    category: String,
    amount: Amount,
    currency: Currency,
    created_at: String,
    created_by: String,
}

/// The attributes an in-place update may overwrite.
#[derive(Debug, Serialize)]
struct MutableFields<'a> {
    name: &'a str,
    category: &'a str,
    amount: Amount,
    currency: Currency,
}

impl From<&Expense> for StoredExpense {
    fn from(expense: &Expense) -> Self {
        Self {
            name: expense.name.clone(),
            date: expense.date,
            category: expense.category.clone(),
            amount: expense.amount,
            currency: expense.currency,
            created_at: expense.created_at.clone(),
            created_by: expense.created_by.clone(),
        }
    }
}

fn decode(item: Item) -> Result<Expense, BackendFault> {
    let (sort_key, stored) = from_item::<StoredExpense>(item)?;
    let expected = keys::sort_key(stored.date, &stored.created_at)?;
    if expected != sort_key {
        return Err(BackendFault::Corrupt(format!(
            "expense stored under {sort_key} belongs to {expected}"
        )));
    }
    Ok(Expense {
        sort_key,
        name: stored.name,
        date: stored.date,
        category: stored.category,
        amount: stored.amount,
        currency: stored.currency,
        created_at: stored.created_at,
        created_by: stored.created_by,
    })
}

fn encode(pk: &str, expense: &Expense) -> Result<Item, BackendFault> {
    Ok(Item {
        key: ItemKey::new(pk, expense.sort_key.as_str()),
        attrs: to_attributes(&StoredExpense::from(expense))?,
    })
}

/// Expense store on top of a remote [`Table`].
///
/// Moving an expense to a new date is a single two-item transaction, so the
/// expense is always visible under exactly one sort key.
#[derive(Clone, Debug)]
pub struct RemoteExpenseStore<T> {
    table: T,
    options: StoreOptions,
}

impl<T: Table> RemoteExpenseStore<T> {
    pub fn new(table: T, options: StoreOptions) -> Self {
        Self { table, options }
    }

    fn scan_request(
        &self,
        pk: String,
        range: SortKeyRange,
        filter: Option<AttributeFilter>,
    ) -> ScanRequest {
        ScanRequest {
            pk,
            range,
            filter,
            page_size: self.options.page_size,
        }
    }

    async fn get(&self, vault_id: &str, sort_key: &str) -> ResultLedger<Expense> {
        let key = ItemKey::new(keys::expense_partition(vault_id)?, sort_key);
        match self.table.get_item(&key).await.map_err(fault)? {
            Some(item) => Ok(decode(item)?),
            None => Err(LedgerError::NotFound(sort_key.to_string())),
        }
    }

    async fn ensure_month_capacity(&self, vault_id: &str, date: NaiveDate) -> ResultLedger<()> {
        let (first, next) = dates::month_bounds(date)?;
        let request = self.scan_request(
            keys::expense_partition(vault_id)?,
            SortKeyRange::between(keys::date_prefix(first), keys::date_prefix(next)),
            None,
        );
        let count = scan_all(&self.table, &request).await.map_err(fault)?.len();
        if count >= self.options.month_limit {
            return Err(LedgerError::MonthLimitExceeded {
                month: dates::month_of(date),
                vault: vault_id.to_string(),
            });
        }
        Ok(())
    }

    async fn update_in_place(&self, pk: &str, expense: &Expense) -> ResultLedger<()> {
        let set = to_attributes(&MutableFields {
            name: &expense.name,
            category: &expense.category,
            amount: expense.amount,
            currency: expense.currency,
        })?;
        let key = ItemKey::new(pk, expense.sort_key.as_str());
        match self.table.update_item(&key, set, Condition::Exists).await {
            Ok(_) => Ok(()),
            Err(TableError::ConditionFailed) => {
                tracing::warn!(sort_key = %expense.sort_key, "expense vanished before update");
                Err(LedgerError::NotFound(expense.sort_key.clone()))
            }
            Err(err) => Err(fault(err).into()),
        }
    }

    async fn relocate(&self, pk: &str, old_sort_key: &str, expense: &Expense) -> ResultLedger<()> {
        let writes = vec![
            TransactItem::Delete {
                key: ItemKey::new(pk, old_sort_key),
                condition: Condition::Exists,
            },
            TransactItem::Put {
                item: encode(pk, expense)?,
                condition: Condition::None,
            },
        ];
        match self.table.transact_write(writes).await {
            Ok(()) => Ok(()),
            Err(TableError::Canceled(reasons))
                if reasons.first() == Some(&CancellationReason::ConditionalCheckFailed) =>
            {
                tracing::warn!(sort_key = %old_sort_key, "expense vanished before relocation");
                Err(LedgerError::NotFound(old_sort_key.to_string()))
            }
            Err(err) => Err(fault(err).into()),
        }
    }
}

#[async_trait]
impl<T: Table> ExpenseStore for RemoteExpenseStore<T> {
    async fn create(
        &self,
        vault_id: &str,
        mut expense: Expense,
        user_id: &str,
    ) -> ResultLedger<Expense> {
        bounded(self.options.timeout, async move {
            self.ensure_month_capacity(vault_id, expense.date).await?;

            expense.created_by = user_id.to_string();
            expense.sort_key = keys::sort_key(expense.date, &expense.created_at)?;
            let pk = keys::expense_partition(vault_id)?;

            match self
                .table
                .put_item(encode(&pk, &expense)?, Condition::NotExists)
                .await
            {
                Ok(()) => {
                    tracing::debug!(%pk, sort_key = %expense.sort_key, "expense created");
                    Ok(expense)
                }
                Err(TableError::ConditionFailed) => {
                    tracing::warn!(%pk, sort_key = %expense.sort_key, "expense key already taken");
                    Err(LedgerError::AlreadyExists(expense.sort_key))
                }
                Err(err) => Err(fault(err).into()),
            }
        })
        .await
    }

    async fn find_one(&self, vault_id: &str, sort_key: &str) -> ResultLedger<Expense> {
        bounded(self.options.timeout, self.get(vault_id, sort_key)).await
    }

    async fn update(&self, vault_id: &str, mut expense: Expense) -> ResultLedger<Expense> {
        bounded(self.options.timeout, async move {
            let found = self.get(vault_id, &expense.sort_key).await?;
            if dates::month_of(found.date) != dates::month_of(expense.date) {
                self.ensure_month_capacity(vault_id, expense.date).await?;
            }

            expense.created_at = found.created_at;
            expense.created_by = found.created_by;
            let pk = keys::expense_partition(vault_id)?;
            let candidate = keys::sort_key(expense.date, &expense.created_at)?;

            if candidate == found.sort_key {
                self.update_in_place(&pk, &expense).await?;
            } else {
                expense.sort_key = candidate;
                self.relocate(&pk, &found.sort_key, &expense).await?;
            }
            tracing::debug!(%pk, sort_key = %expense.sort_key, "expense updated");
            Ok(expense)
        })
        .await
    }

    async fn delete(&self, vault_id: &str, sort_key: &str) -> ResultLedger<()> {
        bounded(self.options.timeout, async {
            self.get(vault_id, sort_key).await?;

            let key = ItemKey::new(keys::expense_partition(vault_id)?, sort_key);
            match self.table.delete_item(&key, Condition::Exists).await {
                Ok(()) => {
                    tracing::debug!(pk = %key.pk, %sort_key, "expense deleted");
                    Ok(())
                }
                Err(TableError::ConditionFailed) => {
                    tracing::warn!(%sort_key, "expense vanished before delete");
                    Err(LedgerError::NotFound(sort_key.to_string()))
                }
                Err(err) => Err(fault(err).into()),
            }
        })
        .await
    }

    async fn query(
        &self,
        vault_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        categories: &[String],
    ) -> ResultLedger<Vec<Expense>> {
        let window = DateWindow::new(from, to)?;
        let categories = CategoryFilter::new(categories);
        let filter = (!categories.is_empty()).then(|| AttributeFilter {
            attribute: "category".to_string(),
            any_of: categories
                .categories()
                .iter()
                .map(|category| Value::String(category.clone()))
                .collect(),
        });
        let request = self.scan_request(
            keys::expense_partition(vault_id)?,
            window.sort_key_range()?,
            filter,
        );

        let items = bounded(self.options.timeout, async {
            scan_all(&self.table, &request)
                .await
                .map_err(|err| LedgerError::from(fault(err)))
        })
        .await?;

        let mut expenses = items
            .into_iter()
            .map(decode)
            .collect::<Result<Vec<_>, _>>()?;
        expenses.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));
        Ok(expenses)
    }

    fn clock(&self) -> &Clock {
        &self.options.clock
    }
}
