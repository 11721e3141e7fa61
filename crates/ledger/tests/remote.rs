use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use ledger::{
    BackendFault, Category, CategoryStore, Expense, ExpenseStore, LedgerError,
    RemoteCategoryStore, RemoteExpenseStore, SqlTable, StoreOptions,
    dates::parse_date,
    keys,
    table::{
        CancellationReason, Condition, Item, ItemKey, Page, ScanRequest, Table, TableError,
        TransactItem,
    },
};
use serde_json::json;

mod common;

use common::{expense, sql_table, vault};

/// Delegates to a real table, slowing down or failing scans and scripting
/// transactions.
#[derive(Clone)]
struct ScriptedTable {
    inner: SqlTable,
    page_delay: Option<Duration>,
    /// 1-based index of the scanned page that fails.
    fail_on_page: Option<usize>,
    pages_served: Arc<AtomicUsize>,
    cancel_with: Option<Vec<CancellationReason>>,
}

impl ScriptedTable {
    fn new(inner: SqlTable) -> Self {
        Self {
            inner,
            page_delay: None,
            fail_on_page: None,
            pages_served: Arc::new(AtomicUsize::new(0)),
            cancel_with: None,
        }
    }
}

#[async_trait]
impl Table for ScriptedTable {
    async fn get_item(&self, key: &ItemKey) -> Result<Option<Item>, TableError> {
        self.inner.get_item(key).await
    }

    async fn put_item(&self, item: Item, condition: Condition) -> Result<(), TableError> {
        self.inner.put_item(item, condition).await
    }

    async fn update_item(
        &self,
        key: &ItemKey,
        set: ledger::table::Attributes,
        condition: Condition,
    ) -> Result<Item, TableError> {
        self.inner.update_item(key, set, condition).await
    }

    async fn delete_item(&self, key: &ItemKey, condition: Condition) -> Result<(), TableError> {
        self.inner.delete_item(key, condition).await
    }

    async fn transact_write(&self, items: Vec<TransactItem>) -> Result<(), TableError> {
        match &self.cancel_with {
            Some(reasons) => Err(TableError::Canceled(reasons.clone())),
            None => self.inner.transact_write(items).await,
        }
    }

    async fn query_page(
        &self,
        request: &ScanRequest,
        start_after: Option<&str>,
    ) -> Result<Page, TableError> {
        if let Some(delay) = self.page_delay {
            tokio::time::sleep(delay).await;
        }
        let page = self.pages_served.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_page == Some(page) {
            return Err(TableError::Fault(BackendFault::Corrupt(format!(
                "page {page} unreadable"
            ))));
        }
        self.inner.query_page(request, start_after).await
    }
}

fn move_to(expense: &Expense, date: &str) -> Expense {
    Expense::for_update(
        &expense.sort_key,
        &expense.name,
        date,
        &expense.category,
        expense.amount,
        expense.currency,
    )
    .unwrap()
}

#[tokio::test]
async fn query_accumulates_every_page() {
    let options = StoreOptions {
        page_size: 1,
        ..StoreOptions::default()
    };
    let store = RemoteExpenseStore::new(sql_table().await, options);
    let vault = vault();
    for seq in 0..6 {
        let category = if seq % 2 == 0 { "Food" } else { "Rent" };
        let date = format!("2024-03-{:02}", seq + 10);
        store
            .create(&vault, expense(&date, category, 100, seq), "alice")
            .await
            .unwrap();
    }
    let (from, to) = (
        parse_date("2024-03-11").unwrap(),
        parse_date("2024-03-15").unwrap(),
    );

    assert_eq!(store.query(&vault, from, to, &[]).await.unwrap().len(), 5);
    let food = store
        .query(&vault, from, to, &["Food".to_string()])
        .await
        .unwrap();
    assert_eq!(food.len(), 2);
    assert!(food.iter().all(|e| e.category == "Food"));
}

#[tokio::test]
async fn failing_page_fails_the_whole_query() {
    let inner = sql_table().await;
    let vault = vault();
    let seeding = RemoteExpenseStore::new(inner.clone(), StoreOptions::default());
    for seq in 0..3 {
        let date = format!("2024-04-{:02}", seq + 1);
        seeding
            .create(&vault, expense(&date, "Food", 100, seq), "alice")
            .await
            .unwrap();
    }

    let mut table = ScriptedTable::new(inner);
    table.fail_on_page = Some(2);
    let options = StoreOptions {
        page_size: 1,
        ..StoreOptions::default()
    };
    let store = RemoteExpenseStore::new(table, options);
    let result = store
        .query(
            &vault,
            parse_date("2024-04-01").unwrap(),
            parse_date("2024-04-30").unwrap(),
            &[],
        )
        .await;
    assert!(matches!(
        result,
        Err(LedgerError::Backend(BackendFault::Corrupt(_)))
    ));
}

#[tokio::test]
async fn failing_page_fails_the_whole_category_listing() {
    let inner = sql_table().await;
    let vault = vault();
    let seeding = RemoteCategoryStore::new(inner.clone(), StoreOptions::default());
    for name in ["Food", "Rent", "Travel"] {
        seeding
            .create(&vault, Category::new(name).unwrap(), "alice")
            .await
            .unwrap();
    }

    let mut table = ScriptedTable::new(inner);
    table.fail_on_page = Some(2);
    let options = StoreOptions {
        page_size: 1,
        ..StoreOptions::default()
    };
    let store = RemoteCategoryStore::new(table, options);
    assert!(matches!(
        store.find_all(&vault).await,
        Err(LedgerError::Backend(_))
    ));
}

#[tokio::test]
async fn slow_scans_time_out_as_a_whole() {
    let mut table = ScriptedTable::new(sql_table().await);
    table.page_delay = Some(Duration::from_millis(200));
    let options = StoreOptions {
        timeout: Duration::from_millis(50),
        ..StoreOptions::default()
    };
    let store = RemoteExpenseStore::new(table, options);
    let day = parse_date("2024-01-15").unwrap();

    let err = store.query(&vault(), day, day, &[]).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Backend(BackendFault::Timeout(timeout)) if timeout == Duration::from_millis(50)
    ));
}

#[tokio::test]
async fn unmapped_cancellation_is_a_backend_fault() {
    let mut table = ScriptedTable::new(sql_table().await);
    let store = RemoteExpenseStore::new(table.clone(), StoreOptions::default());
    let vault = vault();
    let created = store
        .create(&vault, expense("2024-01-15", "Food", 100, 1), "alice")
        .await
        .unwrap();

    table.cancel_with = Some(vec![
        CancellationReason::None,
        CancellationReason::ConditionalCheckFailed,
    ]);
    let store = RemoteExpenseStore::new(table.clone(), StoreOptions::default());
    let err = store
        .update(&vault, move_to(&created, "2024-01-20"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Backend(BackendFault::Transaction(_))
    ));

    table.cancel_with = Some(vec![
        CancellationReason::ConditionalCheckFailed,
        CancellationReason::None,
    ]);
    let store = RemoteExpenseStore::new(table, StoreOptions::default());
    let err = store
        .update(&vault, move_to(&created, "2024-01-20"))
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::NotFound(created.sort_key.clone()));

    assert_eq!(
        store.find_one(&vault, &created.sort_key).await.unwrap(),
        created
    );
}

#[tokio::test]
async fn mismatched_sort_key_is_reported_as_corrupt() {
    let table = sql_table().await;
    let vault = vault();
    let item = Item {
        key: ItemKey::new(keys::expense_partition(&vault).unwrap(), "2024-01-15::bogus"),
        attrs: json!({
            "name": "Groceries",
            "date": "2024-01-16",
            "category": "Food",
            "amount": 2499,
            "currency": "PLN",
            "createdAt": "2024-01-16T10:00:00.000000000+01:00",
            "createdBy": "alice",
        })
        .as_object()
        .unwrap()
        .clone(),
    };
    table.put_item(item, Condition::None).await.unwrap();

    let store = RemoteExpenseStore::new(table, StoreOptions::default());
    let err = store
        .find_one(&vault, "2024-01-15::bogus")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Backend(BackendFault::Corrupt(_))));
}

#[tokio::test]
async fn empty_vault_is_an_invalid_key() {
    let store = RemoteExpenseStore::new(sql_table().await, StoreOptions::default());
    let err = store
        .create("", expense("2024-01-15", "Food", 100, 1), "alice")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Backend(BackendFault::InvalidKey(_))
    ));
}

#[tokio::test]
async fn stored_attributes_use_the_wire_names() {
    let table = sql_table().await;
    let store = RemoteExpenseStore::new(table.clone(), StoreOptions::default());
    let vault = vault();
    let created = store
        .create(&vault, expense("2024-01-15", "Food", 2499, 1), "alice")
        .await
        .unwrap();

    let item = table
        .get_item(&ItemKey::new(
            keys::expense_partition(&vault).unwrap(),
            created.sort_key.as_str(),
        ))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.attrs["amount"], json!(2499));
    assert_eq!(item.attrs["currency"], json!("PLN"));
    assert_eq!(item.attrs["createdBy"], json!("alice"));
    assert_eq!(item.attrs["createdAt"], json!(created.created_at));
}
