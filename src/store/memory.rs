//! In-memory [`KeyValueStore`] backend.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{AttrValue, Item, KeySchema, KeyValueStore, StoreError};

/// Table held in process memory, ordered by (partition, sort). Conditional
/// writes take the write lock for the whole check-and-insert, which makes
/// them atomic with respect to concurrent writers.
pub struct MemoryStore {
    schema: KeySchema,
    rows: RwLock<BTreeMap<(String, String), Item>>,
}

impl MemoryStore {
    pub fn new(schema: KeySchema) -> Self {
        Self {
            schema,
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    fn key_of(&self, item: &Item) -> Result<(String, String), StoreError> {
        let partition = item
            .get(self.schema.partition)
            .and_then(AttrValue::as_s)
            .ok_or_else(|| StoreError::MissingKeyAttribute(self.schema.partition.to_string()))?
            .to_string();
        let sort = match self.schema.sort {
            Some(attr) => item
                .get(attr)
                .and_then(AttrValue::as_s)
                .ok_or_else(|| StoreError::MissingKeyAttribute(attr.to_string()))?
                .to_string(),
            None => String::new(),
        };
        Ok((partition, sort))
    }

    fn lock_poisoned() -> StoreError {
        StoreError::Unavailable("memory store lock poisoned".to_string())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_item(
        &self,
        partition: &str,
        sort: Option<&str>,
    ) -> Result<Option<Item>, StoreError> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        let key = (partition.to_string(), sort.unwrap_or("").to_string());
        Ok(rows.get(&key).cloned())
    }

    async fn put_item(&self, item: Item) -> Result<(), StoreError> {
        let key = self.key_of(&item)?;
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        rows.insert(key, item);
        Ok(())
    }

    async fn put_item_if_absent(&self, item: Item) -> Result<(), StoreError> {
        let key = self.key_of(&item)?;
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        if rows.contains_key(&key) {
            return Err(StoreError::PreconditionFailed);
        }
        rows.insert(key, item);
        Ok(())
    }

    async fn query_partition(&self, partition: &str) -> Result<Vec<Item>, StoreError> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        Ok(rows
            .iter()
            .filter(|((p, _), _)| p.as_str() == partition)
            .map(|(_, item)| item.clone())
            .collect())
    }
}
