use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    Expense, LedgerError, ResultLedger,
    dates::{self, Clock},
    keys,
    range::{CategoryFilter, DateWindow},
    store::{ExpenseStore, StoreOptions},
};

use super::Partitions;

/// Expense store kept in memory, for tests and embedded use.
#[derive(Debug, Default)]
pub struct LocalExpenseStore {
    partitions: Partitions<Expense>,
    options: StoreOptions,
}

impl LocalExpenseStore {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            partitions: Partitions::default(),
            options,
        }
    }

    fn ensure_month_capacity<'a>(
        &self,
        records: impl Iterator<Item = &'a Expense>,
        vault_id: &str,
        date: NaiveDate,
    ) -> ResultLedger<()> {
        let (first, next) = dates::month_bounds(date)?;
        let count = records
            .filter(|expense| first <= expense.date && expense.date < next)
            .count();
        if count >= self.options.month_limit {
            return Err(LedgerError::MonthLimitExceeded {
                month: dates::month_of(date),
                vault: vault_id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ExpenseStore for LocalExpenseStore {
    async fn create(
        &self,
        vault_id: &str,
        mut expense: Expense,
        user_id: &str,
    ) -> ResultLedger<Expense> {
        let partition = self
            .partitions
            .get(keys::expense_partition(vault_id)?)
            .await;
        let mut records = partition.lock().await;
        self.ensure_month_capacity(records.values(), vault_id, expense.date)?;

        expense.created_by = user_id.to_string();
        expense.sort_key = keys::sort_key(expense.date, &expense.created_at)?;
        if records.contains_key(&expense.sort_key) {
            return Err(LedgerError::AlreadyExists(expense.sort_key));
        }
        records.insert(expense.sort_key.clone(), expense.clone());
        tracing::debug!(vault = %vault_id, sort_key = %expense.sort_key, "expense created");
        Ok(expense)
    }

    async fn find_one(&self, vault_id: &str, sort_key: &str) -> ResultLedger<Expense> {
        let partition = self
            .partitions
            .get(keys::expense_partition(vault_id)?)
            .await;
        let records = partition.lock().await;
        records
            .get(sort_key)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(sort_key.to_string()))
    }

    async fn update(&self, vault_id: &str, mut expense: Expense) -> ResultLedger<Expense> {
        let partition = self
            .partitions
            .get(keys::expense_partition(vault_id)?)
            .await;
        let mut records = partition.lock().await;
        let found = records
            .get(&expense.sort_key)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(expense.sort_key.clone()))?;
        if dates::month_of(found.date) != dates::month_of(expense.date) {
            self.ensure_month_capacity(records.values(), vault_id, expense.date)?;
        }

        expense.created_at = found.created_at;
        expense.created_by = found.created_by;
        let candidate = keys::sort_key(expense.date, &expense.created_at)?;
        if candidate != found.sort_key {
            records.remove(&found.sort_key);
            expense.sort_key = candidate;
        }
        records.insert(expense.sort_key.clone(), expense.clone());
        tracing::debug!(vault = %vault_id, sort_key = %expense.sort_key, "expense updated");
        Ok(expense)
    }

    async fn delete(&self, vault_id: &str, sort_key: &str) -> ResultLedger<()> {
        let partition = self
            .partitions
            .get(keys::expense_partition(vault_id)?)
            .await;
        let mut records = partition.lock().await;
        match records.remove(sort_key) {
            Some(_) => {
                tracing::debug!(vault = %vault_id, %sort_key, "expense deleted");
                Ok(())
            }
            None => Err(LedgerError::NotFound(sort_key.to_string())),
        }
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
        let partition = self
            .partitions
            .get(keys::expense_partition(vault_id)?)
            .await;
        let records = partition.lock().await;

        // Newest first, matching the remote store.
        Ok(records
            .values()
            .rev()
            .filter(|expense| window.contains(expense.date) && categories.matches(&expense.category))
            .cloned()
            .collect())
    }

    fn clock(&self) -> &Clock {
        &self.options.clock
    }
}
