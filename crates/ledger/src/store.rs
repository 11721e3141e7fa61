//! Capability contracts implemented by every storage backend.
//!
//! The surrounding request layer only ever talks to these traits; whether a
//! vault lives in the remote table or in process is decided when the store is
//! constructed.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    Category, Expense, MonthlySum, ResultLedger, aggregate, dates::Clock, range::DateWindow,
};

pub const DEFAULT_PAGE_SIZE: u64 = 100;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MONTH_LIMIT: usize = 1000;

/// Knobs shared by the store implementations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreOptions {
    pub clock: Clock,
    /// Upper bound of a whole remote operation, every scan page included.
    pub timeout: Duration,
    /// Items fetched per remote scan page.
    pub page_size: u64,
    /// Maximum number of expenses a vault may book in one month.
    pub month_limit: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            clock: Clock::default(),
            timeout: DEFAULT_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
            month_limit: DEFAULT_MONTH_LIMIT,
        }
    }
}

#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Persist a new expense created by `user_id`.
    ///
    /// Fails with `AlreadyExists` when its sort key is taken.
    async fn create(&self, vault_id: &str, expense: Expense, user_id: &str)
    -> ResultLedger<Expense>;

    async fn find_one(&self, vault_id: &str, sort_key: &str) -> ResultLedger<Expense>;

    /// Replace the mutable fields of the expense stored under
    /// `expense.sort_key`, moving it to a new sort key when its date changed.
    ///
    /// Returns the stored expense.
    async fn update(&self, vault_id: &str, expense: Expense) -> ResultLedger<Expense>;

    async fn delete(&self, vault_id: &str, sort_key: &str) -> ResultLedger<()>;

    /// Expenses dated inside `[from, to]`, newest first, optionally restricted
    /// to `categories`.
    async fn query(
        &self,
        vault_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        categories: &[String],
    ) -> ResultLedger<Vec<Expense>>;

    fn clock(&self) -> &Clock;

    /// Per-month per-category sums over the last `months_back` months,
    /// recomputed from a range query on every call.
    async fn monthly_sums(&self, vault_id: &str, months_back: u32) -> ResultLedger<Vec<MonthlySum>> {
        let window = DateWindow::months_back(self.clock(), months_back)?;
        let expenses = self
            .query(vault_id, window.from(), window.to(), &[])
            .await?;
        aggregate::monthly_sums(&expenses)
    }
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Fails with `AlreadyExists` when the vault already has the name.
    async fn create(
        &self,
        vault_id: &str,
        category: Category,
        user_id: &str,
    ) -> ResultLedger<Category>;

    /// Deleting a category that does not exist succeeds.
    async fn delete(&self, vault_id: &str, name: &str) -> ResultLedger<()>;

    /// Every category of the vault, ordered by name.
    async fn find_all(&self, vault_id: &str) -> ResultLedger<Vec<Category>>;
}
