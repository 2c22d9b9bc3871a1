use crate::domain::model::{DataArray, Params};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Performs the actual storage or network work behind a manager.
#[async_trait]
pub trait AccessService: Send + Sync {
    async fn find_all(&self, resource: &str, params: &Params) -> Result<Vec<DataArray>>;

    async fn find_one_by_id(
        &self,
        resource: &str,
        id: &Value,
        params: &Params,
    ) -> Result<Option<DataArray>>;

    async fn find_by_key_val(
        &self,
        resource: &str,
        key: &str,
        val: &Value,
        params: &Params,
    ) -> Result<Vec<DataArray>>;

    /// Inserts when `id` is `None`, updates otherwise. Returns the stored data,
    /// which carries the identifier assigned by the backend for new objects.
    async fn save(&self, data: &DataArray, id: Option<&Value>, resource: &str)
        -> Result<DataArray>;

    async fn remove(&self, id: &Value, resource: &str) -> Result<bool>;
}

/// Renders a scalar JSON value the way it appears in a path or query string.
pub fn value_to_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
