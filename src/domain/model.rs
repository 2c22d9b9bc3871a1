use crate::domain::schema::ModelSchema;
use crate::utils::error::Result;
use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Flat associative representation of a model, used for transport.
pub type DataArray = serde_json::Map<String, Value>;

/// Extra parameters forwarded to the access service with every lookup.
pub type Params = BTreeMap<String, String>;

/// An object a manager can load from and store to a data array.
pub trait StorableObject: Any + Send + Sync {
    /// Name of the model schema this object belongs to.
    fn model_name(&self) -> &str;

    fn from_data_array(&mut self, data: &DataArray) -> Result<()>;

    fn to_data_array(&self) -> DataArray;

    /// Reads a property by its schema name. `None` when absent.
    fn property(&self, name: &str) -> Option<Value>;

    fn set_property(&mut self, name: &str, value: Value) -> Result<()>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A storable object a manager can instantiate.
pub trait Model: StorableObject + Sized {
    fn instantiate(schema: &Arc<ModelSchema>) -> Self;
}

/// Whether an identifier value counts as assigned.
///
/// Absent, `null` and empty strings are unset; `0` and `false` are real values.
pub fn is_identifier_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}
