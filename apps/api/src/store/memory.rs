use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::store::{item_id, updated_at_token, ItemStore, Table};

/// In-process store for local runs and tests. Contents vanish on restart.
#[derive(Default)]
pub struct MemoryItemStore {
    items: RwLock<BTreeMap<(Table, String), Value>>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn get(&self, table: Table, id: &str) -> Result<Option<Value>, AppError> {
        let items = self.items.read().await;
        Ok(items.get(&(table, id.to_string())).cloned())
    }

    async fn put(&self, table: Table, item: &Value) -> Result<(), AppError> {
        let id = item_id(item)?.to_string();
        self.items.write().await.insert((table, id), item.clone());
        Ok(())
    }

    async fn scan(&self, table: Table) -> Result<Vec<Value>, AppError> {
        let items = self.items.read().await;
        Ok(items
            .iter()
            .filter(|((t, _), _)| *t == table)
            .map(|(_, v)| v.clone())
            .collect())
    }

    async fn delete(&self, table: Table, id: &str) -> Result<(), AppError> {
        self.items.write().await.remove(&(table, id.to_string()));
        Ok(())
    }

    async fn replace(
        &self,
        table: Table,
        item: &Value,
        expected_updated_at: Option<&str>,
    ) -> Result<(), AppError> {
        let key = (table, item_id(item)?.to_string());
        let mut items = self.items.write().await;

        let stored = items.get(&key).ok_or_else(|| {
            AppError::Conflict(format!("{} {} no longer exists", table.as_str(), key.1))
        })?;
        if updated_at_token(stored).as_deref() != expected_updated_at {
            return Err(AppError::Conflict(format!(
                "{} {} was modified concurrently",
                table.as_str(),
                key.1
            )));
        }

        items.insert(key, item.clone());
        Ok(())
    }
}
