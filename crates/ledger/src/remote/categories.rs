use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    Category, LedgerError, ResultLedger, keys,
    store::{CategoryStore, StoreOptions},
    table::{Condition, Item, ItemKey, ScanRequest, SortKeyRange, Table, TableError, scan_all},
};

use super::{bounded, fault, from_item, to_attributes};

/// Persisted attributes of a category; its name is the sort key.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCategory {
    created_by: String,
}

#[derive(Clone, Debug)]
pub struct RemoteCategoryStore<T> {
    table: T,
    options: StoreOptions,
}

impl<T: Table> RemoteCategoryStore<T> {
    pub fn new(table: T, options: StoreOptions) -> Self {
        Self { table, options }
    }
}

#[async_trait]
impl<T: Table> CategoryStore for RemoteCategoryStore<T> {
    async fn create(
        &self,
        vault_id: &str,
        mut category: Category,
        user_id: &str,
    ) -> ResultLedger<Category> {
        category.created_by = user_id.to_string();
        let item = Item {
            key: ItemKey::new(keys::category_partition(vault_id)?, category.name.as_str()),
            attrs: to_attributes(&StoredCategory {
                created_by: category.created_by.clone(),
            })?,
        };

        bounded(self.options.timeout, async move {
            match self.table.put_item(item, Condition::NotExists).await {
                Ok(()) => {
                    tracing::debug!(vault = %vault_id, name = %category.name, "category created");
                    Ok(category)
                }
                Err(TableError::ConditionFailed) => {
                    tracing::warn!(vault = %vault_id, name = %category.name, "category already present");
                    Err(LedgerError::AlreadyExists(category.name))
                }
                Err(err) => Err(fault(err).into()),
            }
        })
        .await
    }

    async fn delete(&self, vault_id: &str, name: &str) -> ResultLedger<()> {
        let name = name.trim();
        let key = ItemKey::new(keys::category_partition(vault_id)?, name);
        bounded(self.options.timeout, async {
            self.table
                .delete_item(&key, Condition::None)
                .await
                .map_err(fault)?;
            tracing::debug!(vault = %vault_id, %name, "category deleted");
            Ok(())
        })
        .await
    }

    async fn find_all(&self, vault_id: &str) -> ResultLedger<Vec<Category>> {
        let request = ScanRequest {
            pk: keys::category_partition(vault_id)?,
            range: SortKeyRange::all(),
            filter: None,
            page_size: self.options.page_size,
        };
        let items = bounded(self.options.timeout, async {
            scan_all(&self.table, &request)
                .await
                .map_err(|err| LedgerError::from(fault(err)))
        })
        .await?;

        items
            .into_iter()
            .map(|item| -> ResultLedger<Category> {
                let (name, stored) = from_item::<StoredCategory>(item)?;
                Ok(Category {
                    name,
                    created_by: stored.created_by,
                })
            })
            .collect()
    }
}
