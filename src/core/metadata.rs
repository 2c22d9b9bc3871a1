use crate::domain::schema::ModelSchema;
use crate::utils::error::{GamineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Where a model keeps its identifier: the property on the object and the
/// key it is stored under in a data array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierMetadata {
    pub property: String,
    pub column: String,
}

/// Finds the identifier field of a schema.
///
/// The first field marked `id` wins. It must also carry a column marker,
/// otherwise resolution fails with `MissingAnnotationConfig`.
pub fn resolve_identifier(schema: &ModelSchema) -> Result<Option<IdentifierMetadata>> {
    let Some(field) = schema.fields.iter().find(|f| f.id) else {
        tracing::debug!("Model {} declares no identifier", schema.name);
        return Ok(None);
    };

    if field.column.is_none() {
        return Err(GamineError::MissingAnnotationConfig {
            model: schema.name.clone(),
            property: field.property.clone(),
        });
    }

    let metadata = IdentifierMetadata {
        property: field.property.clone(),
        column: field.column_name().to_string(),
    };
    tracing::debug!(
        "Model {} identifier: property={} column={}",
        schema.name,
        metadata.property,
        metadata.column
    );
    Ok(Some(metadata))
}

/// Resource names, bound model and named routes of one manager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerDefinition {
    pub name: String,
    pub model: String,
    pub collection: Option<String>,
    pub entity: Option<String>,
    #[serde(default)]
    pub routes: BTreeMap<String, String>,
}

impl ManagerDefinition {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn collection(mut self, resource: impl Into<String>) -> Self {
        self.collection = Some(resource.into());
        self
    }

    pub fn entity(mut self, resource: impl Into<String>) -> Self {
        self.entity = Some(resource.into());
        self
    }

    pub fn route(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.routes.insert(name.into(), path.into());
        self
    }
}

/// Model schemas and manager definitions known to the process.
///
/// Built once at startup and shared by reference; later registrations of the
/// same name replace the earlier entry.
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    models: BTreeMap<String, Arc<ModelSchema>>,
    managers: BTreeMap<String, ManagerDefinition>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_model(&mut self, schema: ModelSchema) -> Arc<ModelSchema> {
        let schema = Arc::new(schema);
        self.models.insert(schema.name.clone(), Arc::clone(&schema));
        schema
    }

    pub fn register_manager(&mut self, definition: ManagerDefinition) {
        self.managers.insert(definition.name.clone(), definition);
    }

    pub fn model(&self, name: &str) -> Result<Arc<ModelSchema>> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| GamineError::UnknownModel {
                name: name.to_string(),
            })
    }

    pub fn manager_definition(&self, name: &str) -> Result<&ManagerDefinition> {
        self.managers
            .get(name)
            .ok_or_else(|| GamineError::UnknownManager {
                name: name.to_string(),
            })
    }

    pub fn models(&self) -> impl Iterator<Item = &Arc<ModelSchema>> {
        self.models.values()
    }

    pub fn managers(&self) -> impl Iterator<Item = &ManagerDefinition> {
        self.managers.values()
    }

    /// Resolves every registered model's identifier, surfacing schema errors
    /// before any manager is used.
    pub fn check(&self) -> Result<()> {
        for schema in self.models.values() {
            resolve_identifier(schema)?;
        }
        for definition in self.managers.values() {
            self.model(&definition.model)?;
        }
        Ok(())
    }
}
