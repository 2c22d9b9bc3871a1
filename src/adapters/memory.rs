use crate::domain::model::{DataArray, Params};
use crate::domain::ports::{value_to_param, AccessService};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::Mutex;

pub const DEFAULT_ID_COLUMN: &str = "id";

#[derive(Debug, Default)]
struct Store {
    collections: BTreeMap<String, Vec<DataArray>>,
    next_id: u64,
}

/// Access service backed by process memory.
///
/// Rows are kept per resource in insertion order. New rows get sequential
/// integer ids under `id_column`. Lookup params act as equality filters.
#[derive(Debug)]
pub struct InMemoryAccessService {
    id_column: String,
    aliases: BTreeMap<String, String>,
    store: Mutex<Store>,
}

impl Default for InMemoryAccessService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAccessService {
    pub fn new() -> Self {
        Self {
            id_column: DEFAULT_ID_COLUMN.to_string(),
            aliases: BTreeMap::new(),
            store: Mutex::new(Store {
                collections: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = column.into();
        self
    }

    /// Makes `resource` read and write the rows of `target`, e.g. an entity
    /// resource pointing at its collection.
    pub fn with_alias(mut self, resource: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.insert(resource.into(), target.into());
        self
    }

    /// Seeds a resource with rows as-is.
    pub fn with_rows(mut self, resource: &str, rows: Vec<DataArray>) -> Self {
        let key = self.resolve(resource).to_string();
        self.store
            .get_mut()
            .collections
            .entry(key)
            .or_default()
            .extend(rows);
        self
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub async fn rows(&self, resource: &str) -> Vec<DataArray> {
        let store = self.store.lock().await;
        store
            .collections
            .get(self.resolve(resource))
            .cloned()
            .unwrap_or_default()
    }

    fn resolve<'a>(&'a self, resource: &'a str) -> &'a str {
        self.aliases
            .get(resource)
            .map(String::as_str)
            .unwrap_or(resource)
    }

    fn matches(row: &DataArray, key: &str, expected: &str) -> bool {
        row.get(key)
            .map(|value| value_to_param(value) == expected)
            .unwrap_or(false)
    }

    fn filtered(rows: &[DataArray], params: &Params) -> Vec<DataArray> {
        rows.iter()
            .filter(|row| params.iter().all(|(k, v)| Self::matches(row, k, v)))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AccessService for InMemoryAccessService {
    async fn find_all(&self, resource: &str, params: &Params) -> Result<Vec<DataArray>> {
        let store = self.store.lock().await;
        let rows = store
            .collections
            .get(self.resolve(resource))
            .map(|rows| Self::filtered(rows, params))
            .unwrap_or_default();
        tracing::debug!("memory find_all {}: {} rows", resource, rows.len());
        Ok(rows)
    }

    async fn find_one_by_id(
        &self,
        resource: &str,
        id: &Value,
        params: &Params,
    ) -> Result<Option<DataArray>> {
        let wanted = value_to_param(id);
        let store = self.store.lock().await;
        let found = store.collections.get(self.resolve(resource)).and_then(|rows| {
            Self::filtered(rows, params)
                .into_iter()
                .find(|row| Self::matches(row, &self.id_column, &wanted))
        });
        Ok(found)
    }

    async fn find_by_key_val(
        &self,
        resource: &str,
        key: &str,
        val: &Value,
        params: &Params,
    ) -> Result<Vec<DataArray>> {
        let wanted = value_to_param(val);
        let store = self.store.lock().await;
        let rows = store
            .collections
            .get(self.resolve(resource))
            .map(|rows| {
                Self::filtered(rows, params)
                    .into_iter()
                    .filter(|row| Self::matches(row, key, &wanted))
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }

    async fn save(
        &self,
        data: &DataArray,
        id: Option<&Value>,
        resource: &str,
    ) -> Result<DataArray> {
        let mut store = self.store.lock().await;
        let key = self.resolve(resource).to_string();

        let id = match id {
            Some(id) => id.clone(),
            None => {
                // Seeded or explicitly saved rows may already hold ids
                let taken: BTreeSet<String> = store
                    .collections
                    .get(&key)
                    .map(|rows| {
                        rows.iter()
                            .filter_map(|row| row.get(&self.id_column))
                            .map(value_to_param)
                            .collect()
                    })
                    .unwrap_or_default();

                let mut next = store.next_id;
                while taken.contains(&next.to_string()) {
                    next += 1;
                }
                store.next_id = next + 1;
                Value::from(next)
            }
        };

        let mut row = data.clone();
        row.insert(self.id_column.clone(), id.clone());

        let wanted = value_to_param(&id);
        let rows = store.collections.entry(key).or_default();

        match rows
            .iter_mut()
            .find(|existing| Self::matches(existing, &self.id_column, &wanted))
        {
            Some(existing) => *existing = row.clone(),
            None => rows.push(row.clone()),
        }

        tracing::debug!("memory save {} id={}", resource, id);
        Ok(row)
    }

    async fn remove(&self, id: &Value, resource: &str) -> Result<bool> {
        let wanted = value_to_param(id);
        let mut store = self.store.lock().await;

        let Some(rows) = store.collections.get_mut(self.resolve(resource)) else {
            return Ok(false);
        };

        let before = rows.len();
        rows.retain(|row| !Self::matches(row, &self.id_column, &wanted));
        Ok(rows.len() < before)
    }
}
