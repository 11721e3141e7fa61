use async_trait::async_trait;

use crate::{Category, LedgerError, ResultLedger, keys, store::CategoryStore};

use super::Partitions;

#[derive(Debug, Default)]
pub struct LocalCategoryStore {
    partitions: Partitions<Category>,
}

impl LocalCategoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategoryStore for LocalCategoryStore {
    async fn create(
        &self,
        vault_id: &str,
        mut category: Category,
        user_id: &str,
    ) -> ResultLedger<Category> {
        let partition = self
            .partitions
            .get(keys::category_partition(vault_id)?)
            .await;
        let mut records = partition.lock().await;
        if records.contains_key(&category.name) {
            tracing::warn!(vault = %vault_id, name = %category.name, "category already present");
            return Err(LedgerError::AlreadyExists(category.name));
        }
        category.created_by = user_id.to_string();
        records.insert(category.name.clone(), category.clone());
        tracing::debug!(vault = %vault_id, name = %category.name, "category created");
        Ok(category)
    }

    async fn delete(&self, vault_id: &str, name: &str) -> ResultLedger<()> {
        let partition = self
            .partitions
            .get(keys::category_partition(vault_id)?)
            .await;
        let name = name.trim();
        if partition.lock().await.remove(name).is_some() {
            tracing::debug!(vault = %vault_id, %name, "category deleted");
        }
        Ok(())
    }

    async fn find_all(&self, vault_id: &str) -> ResultLedger<Vec<Category>> {
        let partition = self
            .partitions
            .get(keys::category_partition(vault_id)?)
            .await;
        let records = partition.lock().await;
        Ok(records.values().cloned().collect())
    }
}
