use crate::domain::model::{DataArray, Model, StorableObject};
use crate::domain::schema::{FieldKind, FieldSchema, ModelSchema};
use crate::models::array_model::ArrayModel;
use crate::utils::error::Result;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

pub const EXAMPLE_MODEL: &str = "Example";

static EXAMPLE_SCHEMA: Lazy<Arc<ModelSchema>> = Lazy::new(|| Arc::new(Example::schema()));

/// Static configuration entry. Has no identifier, so every save is an insert
/// and it can never be removed through a manager.
///
/// Backed by an [`ArrayModel`] over a fixed schema with typed accessors on
/// top.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    values: ArrayModel,
}

impl Default for Example {
    fn default() -> Self {
        Self {
            values: ArrayModel::new(Arc::clone(&EXAMPLE_SCHEMA)),
        }
    }
}

impl Example {
    pub fn schema() -> ModelSchema {
        ModelSchema::new(EXAMPLE_MODEL)
            .field(FieldSchema::new("Name", FieldKind::Text))
            .field(FieldSchema::new("Number", FieldKind::Integer))
            .field(FieldSchema::new("Comment", FieldKind::Text))
            .field(FieldSchema::new("Foo", FieldKind::Text))
    }

    pub fn name(&self) -> Option<&str> {
        self.values.get("Name").and_then(Value::as_str)
    }

    pub fn number(&self) -> Option<i64> {
        self.values.get("Number").and_then(Value::as_i64)
    }

    pub fn comment(&self) -> Option<&str> {
        self.values.get("Comment").and_then(Value::as_str)
    }

    pub fn foo(&self) -> Option<&str> {
        self.values.get("Foo").and_then(Value::as_str)
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        self.values.set("Name", name.into())
    }

    pub fn set_number(&mut self, number: i64) -> Result<()> {
        self.values.set("Number", number)
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) -> Result<()> {
        self.values.set("Comment", comment.into())
    }

    pub fn set_foo(&mut self, foo: impl Into<String>) -> Result<()> {
        self.values.set("Foo", foo.into())
    }
}

impl StorableObject for Example {
    fn model_name(&self) -> &str {
        EXAMPLE_MODEL
    }

    fn from_data_array(&mut self, data: &DataArray) -> Result<()> {
        self.values.from_data_array(data)
    }

    fn to_data_array(&self) -> DataArray {
        self.values.to_data_array()
    }

    fn property(&self, name: &str) -> Option<Value> {
        self.values.property(name)
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<()> {
        self.values.set_property(name, value)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Model for Example {
    fn instantiate(schema: &Arc<ModelSchema>) -> Self {
        Self {
            values: ArrayModel::new(Arc::clone(schema)),
        }
    }
}
