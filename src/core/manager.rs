use crate::core::metadata::{resolve_identifier, IdentifierMetadata, ManagerDefinition};
use crate::domain::model::{is_identifier_set, DataArray, Model, Params, StorableObject};
use crate::domain::ports::AccessService;
use crate::domain::schema::ModelSchema;
use crate::utils::error::{GamineError, Result};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// Optional callbacks around the fixed save/remove sequence of a manager.
///
/// Every method has a no-op default, so an implementation only overrides the
/// steps it cares about.
pub trait ManagerHooks<M>: Send + Sync {
    /// Returning `false` aborts the save; the manager then returns `Ok(false)`.
    fn before_save(&self, _object: &mut M) -> bool {
        true
    }

    fn after_save(&self, _object: &mut M, _is_new: bool) {}

    fn before_remove(&self, _object: &mut M) {}

    /// May replace the status reported by the access service.
    fn after_remove(&self, _object: &mut M, status: bool) -> bool {
        status
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl<M> ManagerHooks<M> for NoHooks {}

/// Per-model façade over an access service.
///
/// A manager is bound to one model type `M` and one schema for its whole
/// life. The identifier metadata of that schema is resolved on first use and
/// cached.
pub struct Manager<M, H = NoHooks> {
    access_service: Arc<dyn AccessService>,
    definition: ManagerDefinition,
    schema: Arc<ModelSchema>,
    identifier: OnceCell<Option<IdentifierMetadata>>,
    hooks: H,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Manager<M, NoHooks> {
    pub fn new(
        access_service: Arc<dyn AccessService>,
        definition: ManagerDefinition,
        schema: Arc<ModelSchema>,
    ) -> Result<Self> {
        if definition.model != schema.name {
            return Err(GamineError::ConfigValidationError {
                field: format!("managers.{}.model", definition.name),
                message: format!(
                    "manager is declared for model `{}` but was given schema `{}`",
                    definition.model, schema.name
                ),
            });
        }

        Ok(Self {
            access_service,
            definition,
            schema,
            identifier: OnceCell::new(),
            hooks: NoHooks,
            _model: PhantomData,
        })
    }
}

impl<M: Model, H: ManagerHooks<M>> Manager<M, H> {
    pub fn with_hooks<H2: ManagerHooks<M>>(self, hooks: H2) -> Manager<M, H2> {
        Manager {
            access_service: self.access_service,
            definition: self.definition,
            schema: self.schema,
            identifier: self.identifier,
            hooks,
            _model: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &ManagerDefinition {
        &self.definition
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    pub fn model_name(&self) -> &str {
        &self.schema.name
    }

    pub fn collection_resource(&self) -> Option<&str> {
        self.definition.collection.as_deref()
    }

    pub fn entity_resource(&self) -> Option<&str> {
        self.definition.entity.as_deref()
    }

    pub fn access_service(&self) -> &Arc<dyn AccessService> {
        &self.access_service
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn resource_route(&self, route: &str) -> Result<&str> {
        self.definition
            .routes
            .get(route)
            .map(String::as_str)
            .ok_or_else(|| GamineError::UnknownRoute {
                manager: self.definition.name.clone(),
                route: route.to_string(),
            })
    }

    pub fn identifier(&self) -> Result<Option<&IdentifierMetadata>> {
        self.identifier
            .get_or_try_init(|| resolve_identifier(&self.schema))
            .map(Option::as_ref)
    }

    pub fn has_data_array_identifier_property(&self) -> Result<bool> {
        Ok(self.identifier()?.is_some())
    }

    /// Data array key holding the identifier, `None` when the model has none.
    pub fn data_array_identifier_column(&self) -> Result<Option<&str>> {
        Ok(self.identifier()?.map(|m| m.column.as_str()))
    }

    /// Object property holding the identifier, `None` when the model has none.
    pub fn data_array_identifier_property(&self) -> Result<Option<&str>> {
        Ok(self.identifier()?.map(|m| m.property.as_str()))
    }

    /// Current identifier of `object`, `None` while it is unsaved.
    pub fn identifier_value(&self, object: &M) -> Result<Option<Value>> {
        let Some(metadata) = self.identifier()? else {
            return Ok(None);
        };
        let value = object.property(&metadata.property);
        Ok(value.filter(|v| is_identifier_set(Some(v))))
    }

    /// Writes `value` into the identifier property of `object`, converted to
    /// the identifier field's kind. Fails with `MissingIdentifier` when the
    /// model declares no identifier.
    pub fn set_identifier_value(&self, object: &mut M, value: Value) -> Result<()> {
        let Some(metadata) = self.identifier()? else {
            return Err(GamineError::MissingIdentifier {
                model: self.schema.name.clone(),
            });
        };
        let value = match self.schema.get_field(&metadata.property) {
            Some(field) => field.kind.coerce(value),
            None => value,
        };
        object.set_property(&metadata.property, value)
    }

    pub fn instantiate(&self) -> M {
        M::instantiate(&self.schema)
    }

    pub async fn find_all(&self, params: &Params) -> Result<Vec<M>> {
        let resource = self.collection()?;
        tracing::debug!("{}: find_all on {}", self.definition.name, resource);

        let rows = self.access_service.find_all(resource, params).await?;
        self.hydrate_all(&rows)
    }

    pub async fn find_one_by_id(&self, id: impl Into<Value>, params: &Params) -> Result<Option<M>> {
        let id = id.into();
        let resource = self.entity()?;
        tracing::debug!("{}: find_one_by_id {} on {}", self.definition.name, id, resource);

        match self.access_service.find_one_by_id(resource, &id, params).await? {
            Some(data) if !data.is_empty() => Ok(Some(self.hydrate(&data)?)),
            _ => Ok(None),
        }
    }

    pub async fn find_by_key_val(
        &self,
        key: &str,
        val: impl Into<Value>,
        params: &Params,
    ) -> Result<Vec<M>> {
        let val = val.into();
        let resource = self.collection()?;
        tracing::debug!(
            "{}: find_by_key_val {}={} on {}",
            self.definition.name,
            key,
            val,
            resource
        );

        let rows = self
            .access_service
            .find_by_key_val(resource, key, &val, params)
            .await?;
        self.hydrate_all(&rows)
    }

    /// Inserts or updates `object`.
    ///
    /// The object is new when its identifier is unset. Any identifier returned
    /// by the access service is written back into the object. Returns `false`
    /// only when `before_save` vetoed the operation.
    pub async fn save(&self, object: &mut dyn StorableObject) -> Result<bool> {
        let object = self.bind(object)?;
        let resource = self.entity()?;
        let id = self.identifier_value(object)?;
        let is_new = id.is_none();

        if !self.hooks.before_save(object) {
            tracing::info!("{}: save aborted by before_save hook", self.definition.name);
            return Ok(false);
        }

        let data = object.to_data_array();
        let new_data = self
            .access_service
            .save(&data, id.as_ref(), resource)
            .await?;

        if let Some(metadata) = self.identifier()? {
            if let Some(value) = new_data.get(&metadata.column).filter(|v| !v.is_null()) {
                self.set_identifier_value(object, value.clone())?;
            }
        }

        tracing::info!(
            "{}: saved {} object ({})",
            self.definition.name,
            self.schema.name,
            if is_new { "insert" } else { "update" }
        );
        self.hooks.after_save(object, is_new);

        Ok(true)
    }

    /// Deletes `object` through the access service and returns its status,
    /// possibly overridden by `after_remove`.
    pub async fn remove(&self, object: &mut dyn StorableObject) -> Result<bool> {
        let object = self.bind(object)?;
        let id = self
            .identifier_value(object)?
            .ok_or_else(|| GamineError::MissingIdentifier {
                model: self.schema.name.clone(),
            })?;
        let resource = self.entity()?;

        self.hooks.before_remove(object);
        let status = self.access_service.remove(&id, resource).await?;
        let status = self.hooks.after_remove(object, status);

        tracing::info!(
            "{}: removed {} {} (status={})",
            self.definition.name,
            self.schema.name,
            id,
            status
        );
        Ok(status)
    }

    fn bind<'a>(&self, object: &'a mut dyn StorableObject) -> Result<&'a mut M> {
        let found = object.model_name().to_string();
        let mismatch = || GamineError::TypeMismatch {
            expected: self.schema.name.clone(),
            found: found.clone(),
        };

        if found != self.schema.name {
            return Err(mismatch());
        }
        object.as_any_mut().downcast_mut::<M>().ok_or_else(mismatch)
    }

    fn hydrate(&self, data: &DataArray) -> Result<M> {
        let mut object = self.instantiate();
        object.from_data_array(data)?;
        Ok(object)
    }

    fn hydrate_all(&self, rows: &[DataArray]) -> Result<Vec<M>> {
        rows.iter().map(|row| self.hydrate(row)).collect()
    }

    fn collection(&self) -> Result<&str> {
        self.collection_resource()
            .ok_or_else(|| self.missing_resource("collection"))
    }

    fn entity(&self) -> Result<&str> {
        self.entity_resource()
            .ok_or_else(|| self.missing_resource("entity"))
    }

    fn missing_resource(&self, kind: &str) -> GamineError {
        GamineError::MissingResource {
            manager: self.definition.name.clone(),
            kind: kind.to_string(),
        }
    }
}
