#![allow(dead_code, unused_macros)]

use ledger::{
    Amount, CategoryStore, Currency, Expense, ExpenseStore, LocalCategoryStore, LocalExpenseStore,
    RemoteCategoryStore, RemoteExpenseStore, SqlTable, StoreOptions,
};
use migration::MigratorTrait;
use sea_orm::Database;

#[derive(Clone, Copy, Debug)]
pub enum Kind {
    Local,
    Remote,
}

pub struct Stores {
    pub expenses: Box<dyn ExpenseStore>,
    pub categories: Box<dyn CategoryStore>,
}

pub async fn sql_table() -> SqlTable {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    SqlTable::new(db)
}

pub async fn stores_with(kind: Kind, options: StoreOptions) -> Stores {
    match kind {
        Kind::Local => Stores {
            expenses: Box::new(LocalExpenseStore::new(options)),
            categories: Box::new(LocalCategoryStore::new()),
        },
        Kind::Remote => {
            let table = sql_table().await;
            Stores {
                expenses: Box::new(RemoteExpenseStore::new(table.clone(), options)),
                categories: Box::new(RemoteCategoryStore::new(table, options)),
            }
        }
    }
}

pub async fn stores(kind: Kind) -> Stores {
    stores_with(kind, StoreOptions::default()).await
}

pub fn vault() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Expense with a deterministic creation timestamp, unique per `seq`.
pub fn expense(date: &str, category: &str, minor: i64, seq: u32) -> Expense {
    let mut expense = Expense::new(
        &format!("Expense {seq}"),
        date,
        category,
        Amount::from_minor(minor),
        Currency::Pln,
    )
    .unwrap();
    expense.created_at = format!("2024-01-01T10:00:00.{seq:09}+01:00");
    expense.sort_key = ledger::keys::sort_key(expense.date, &expense.created_at).unwrap();
    expense
}

/// Generate one `#[tokio::test]` per backend for each scenario function.
macro_rules! for_each_backend {
    ($($scenario:ident),+ $(,)?) => {
        mod local {
            $(
                #[tokio::test]
                async fn $scenario() {
                    super::$scenario(crate::common::Kind::Local).await;
                }
            )+
        }

        mod remote {
            $(
                #[tokio::test]
                async fn $scenario() {
                    super::$scenario(crate::common::Kind::Remote).await;
                }
            )+
        }
    };
}
