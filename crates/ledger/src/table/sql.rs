//! [`Table`] on top of a SQL database through `sea-orm`.
//!
//! Every item is one row of `items` keyed by `(pk, sk)`. Conditional writes
//! are single statements whose affected-row count tells whether the condition
//! held; read-modify-write updates and transactions run inside a database
//! transaction that is rolled back when any step fails.

use async_trait::async_trait;
use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseConnection, DbErr, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
    prelude::*,
    sea_query::{Expr, OnConflict},
};

use super::{
    Attributes, CancellationReason, Condition, Item, ItemKey, Page, ScanRequest, Table,
    TableError, TransactItem, check_transaction, items,
};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

#[derive(Clone, Debug)]
pub struct SqlTable {
    database: DatabaseConnection,
}

impl SqlTable {
    /// Wrap a connection whose schema was created by the `migration` crate.
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

#[async_trait]
impl Table for SqlTable {
    async fn get_item(&self, key: &ItemKey) -> Result<Option<Item>, TableError> {
        find(&self.database, key)
            .await?
            .map(decode)
            .transpose()
    }

    async fn put_item(&self, item: Item, condition: Condition) -> Result<(), TableError> {
        put(&self.database, &item, condition).await
    }

    async fn update_item(
        &self,
        key: &ItemKey,
        set: Attributes,
        condition: Condition,
    ) -> Result<Item, TableError> {
        with_tx!(self, |db_tx| merge(&db_tx, key, set, condition).await)
    }

    async fn delete_item(&self, key: &ItemKey, condition: Condition) -> Result<(), TableError> {
        delete(&self.database, key, condition).await
    }

    async fn transact_write(&self, items: Vec<TransactItem>) -> Result<(), TableError> {
        check_transaction(&items)?;
        with_tx!(self, |db_tx| {
            let mut outcome = Ok(());
            for (index, write) in items.iter().enumerate() {
                let result = match write {
                    TransactItem::Put { item, condition } => put(&db_tx, item, *condition).await,
                    TransactItem::Delete { key, condition } => {
                        delete(&db_tx, key, *condition).await
                    }
                };
                match result {
                    Ok(()) => {}
                    Err(TableError::ConditionFailed) => {
                        let mut reasons = vec![CancellationReason::None; items.len()];
                        reasons[index] = CancellationReason::ConditionalCheckFailed;
                        tracing::warn!(index, "transaction canceled by failed condition");
                        outcome = Err(TableError::Canceled(reasons));
                        break;
                    }
                    Err(err) => {
                        outcome = Err(err);
                        break;
                    }
                }
            }
            outcome
        })
    }

    async fn query_page(
        &self,
        request: &ScanRequest,
        start_after: Option<&str>,
    ) -> Result<Page, TableError> {
        let mut query = items::Entity::find().filter(items::Column::Pk.eq(request.pk.as_str()));
        if let Some(start) = request.range.start.as_deref() {
            query = query.filter(items::Column::Sk.gte(start));
        }
        if let Some(end) = request.range.end.as_deref() {
            query = query.filter(items::Column::Sk.lt(end));
        }
        if let Some(after) = start_after {
            query = query.filter(items::Column::Sk.gt(after));
        }

        let page_size = request.page_size.max(1);
        let mut rows = query
            .order_by_asc(items::Column::Sk)
            .limit(page_size.saturating_add(1))
            .all(&self.database)
            .await?;

        let last_key = if rows.len() as u64 > page_size {
            rows.truncate(page_size as usize);
            rows.last().map(|row| row.sk.clone())
        } else {
            None
        };

        let mut page = Page {
            items: Vec::with_capacity(rows.len()),
            last_key,
        };
        for row in rows {
            let item = decode(row)?;
            if request
                .filter
                .as_ref()
                .is_none_or(|filter| filter.matches(&item.attrs))
            {
                page.items.push(item);
            }
        }
        Ok(page)
    }
}

async fn find<C: ConnectionTrait>(db: &C, key: &ItemKey) -> Result<Option<items::Model>, DbErr> {
    items::Entity::find_by_id((key.pk.clone(), key.sk.clone()))
        .one(db)
        .await
}

fn decode(row: items::Model) -> Result<Item, TableError> {
    let attrs: Attributes = serde_json::from_str(&row.attrs)?;
    Ok(Item {
        key: ItemKey::new(row.pk, row.sk),
        attrs,
    })
}

fn active_model(key: &ItemKey, attrs: String) -> items::ActiveModel {
    items::ActiveModel {
        pk: ActiveValue::Set(key.pk.clone()),
        sk: ActiveValue::Set(key.sk.clone()),
        attrs: ActiveValue::Set(attrs),
    }
}

fn key_conflict() -> OnConflict {
    OnConflict::columns([items::Column::Pk, items::Column::Sk])
}

async fn put<C: ConnectionTrait>(
    db: &C,
    item: &Item,
    condition: Condition,
) -> Result<(), TableError> {
    let attrs = serde_json::to_string(&item.attrs)?;
    match condition {
        Condition::NotExists => {
            let inserted = items::Entity::insert(active_model(&item.key, attrs))
                .on_conflict(key_conflict().do_nothing().to_owned())
                .exec_without_returning(db)
                .await;
            match inserted {
                Ok(0) | Err(DbErr::RecordNotInserted) => Err(TableError::ConditionFailed),
                Ok(_) => Ok(()),
                Err(err) => Err(err.into()),
            }
        }
        Condition::Exists => {
            let updated = items::Entity::update_many()
                .col_expr(items::Column::Attrs, Expr::value(attrs))
                .filter(items::Column::Pk.eq(item.key.pk.as_str()))
                .filter(items::Column::Sk.eq(item.key.sk.as_str()))
                .exec(db)
                .await?;
            if updated.rows_affected == 0 {
                return Err(TableError::ConditionFailed);
            }
            Ok(())
        }
        Condition::None => {
            items::Entity::insert(active_model(&item.key, attrs))
                .on_conflict(
                    key_conflict()
                        .update_column(items::Column::Attrs)
                        .to_owned(),
                )
                .exec_without_returning(db)
                .await?;
            Ok(())
        }
    }
}

async fn delete<C: ConnectionTrait>(
    db: &C,
    key: &ItemKey,
    condition: Condition,
) -> Result<(), TableError> {
    if condition == Condition::NotExists {
        if find(db, key).await?.is_some() {
            return Err(TableError::ConditionFailed);
        }
        return Ok(());
    }

    let deleted = items::Entity::delete_many()
        .filter(items::Column::Pk.eq(key.pk.as_str()))
        .filter(items::Column::Sk.eq(key.sk.as_str()))
        .exec(db)
        .await?;
    if condition == Condition::Exists && deleted.rows_affected == 0 {
        return Err(TableError::ConditionFailed);
    }
    Ok(())
}

async fn merge<C: ConnectionTrait>(
    db: &C,
    key: &ItemKey,
    set: Attributes,
    condition: Condition,
) -> Result<Item, TableError> {
    let current = find(db, key).await?.map(decode).transpose()?;
    let mut attrs = match (current, condition) {
        (None, Condition::Exists) | (Some(_), Condition::NotExists) => {
            return Err(TableError::ConditionFailed);
        }
        (Some(item), _) => item.attrs,
        (None, _) => Attributes::new(),
    };
    attrs.extend(set);

    let item = Item {
        key: key.clone(),
        attrs,
    };
    put(db, &item, Condition::None).await?;
    Ok(item)
}
