//! Storage core of a multi-tenant expense ledger.
//!
//! Every vault owns two partitions: its expenses, ordered by business date and
//! creation instant, and its categories, keyed by name. The crate exposes the
//! record types, the [`ExpenseStore`] and [`CategoryStore`] contracts, and two
//! implementations of each: a remote one on top of a partitioned [`Table`]
//! and an in-process one.
//!
//! ```no_run
//! use ledger::{Amount, Currency, Expense, ExpenseStore, LocalExpenseStore};
//!
//! # async fn run() -> Result<(), ledger::LedgerError> {
//! let store = LocalExpenseStore::default();
//! let expense = Expense::new(
//!     "Groceries",
//!     "2024-01-15",
//!     "Food",
//!     "24.99".parse::<Amount>()?,
//!     Currency::Pln,
//! )?;
//! let stored = store.create("vault-1", expense, "user-1").await?;
//! assert_eq!(store.find_one("vault-1", &stored.sort_key).await?, stored);
//! # Ok(())
//! # }
//! ```

pub use amount::Amount;
pub use category::Category;
pub use currency::Currency;
pub use dates::Clock;
pub use error::{BackendFault, LedgerError};
pub use expense::{Expense, MonthlySum};
pub use local::{LocalCategoryStore, LocalExpenseStore};
pub use range::DateWindow;
pub use remote::{RemoteCategoryStore, RemoteExpenseStore};
pub use store::{CategoryStore, ExpenseStore, StoreOptions};
pub use table::{SqlTable, Table};

pub mod aggregate;
mod amount;
mod category;
mod currency;
pub mod dates;
mod error;
mod expense;
pub mod keys;
mod local;
pub mod range;
mod remote;
pub mod store;
pub mod table;
mod validation;

pub type ResultLedger<T> = Result<T, LedgerError>;
