use crate::domain::model::{DataArray, Model, StorableObject};
use crate::domain::schema::ModelSchema;
use crate::utils::error::{GamineError, Result};
use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Schema-driven model that stores its fields as JSON values.
///
/// Only fields declared in the schema are kept; values are checked against
/// the field kind on the way in. A key present with `null` is kept as `null`
/// and clears the field; absent keys leave the field untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayModel {
    schema: Arc<ModelSchema>,
    values: BTreeMap<String, Value>,
}

impl ArrayModel {
    pub fn new(schema: Arc<ModelSchema>) -> Self {
        Self {
            schema,
            values: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    pub fn get(&self, property: &str) -> Option<&Value> {
        self.values.get(property)
    }

    pub fn set(&mut self, property: &str, value: impl Into<Value>) -> Result<()> {
        self.set_property(property, value.into())
    }

    fn checked(&self, property: &str, value: &Value) -> Result<()> {
        let field = self
            .schema
            .get_field(property)
            .ok_or_else(|| self.invalid(property, "property is not declared in the schema"))?;

        field
            .kind
            .check(value)
            .map_err(|message| self.invalid(property, &message))
    }

    fn invalid(&self, field: &str, message: &str) -> GamineError {
        GamineError::InvalidData {
            model: self.schema.name.clone(),
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl StorableObject for ArrayModel {
    fn model_name(&self) -> &str {
        &self.schema.name
    }

    fn from_data_array(&mut self, data: &DataArray) -> Result<()> {
        let schema = Arc::clone(&self.schema);
        for field in &schema.fields {
            if let Some(value) = data.get(field.column_name()) {
                self.checked(&field.property, value)?;
                self.values.insert(field.property.clone(), value.clone());
            }
        }
        Ok(())
    }

    fn to_data_array(&self) -> DataArray {
        let mut data = DataArray::new();
        for field in &self.schema.fields {
            if let Some(value) = self.values.get(&field.property) {
                data.insert(field.column_name().to_string(), value.clone());
            }
        }
        data
    }

    fn property(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<()> {
        self.checked(name, &value)?;
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Model for ArrayModel {
    fn instantiate(schema: &Arc<ModelSchema>) -> Self {
        Self::new(Arc::clone(schema))
    }
}
