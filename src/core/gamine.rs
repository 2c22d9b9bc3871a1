use crate::adapters::http::HttpAccessService;
use crate::config::toml_config::GamineConfig;
use crate::core::manager::Manager;
use crate::core::metadata::MetadataRegistry;
use crate::domain::model::Model;
use crate::domain::ports::AccessService;
use crate::models::ArrayModel;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use std::sync::Arc;

/// Service container: one metadata registry, one access service, and
/// managers handed out by name.
#[derive(Clone)]
pub struct Gamine {
    registry: Arc<MetadataRegistry>,
    access_service: Arc<dyn AccessService>,
}

impl Gamine {
    pub fn new(registry: MetadataRegistry, access_service: Arc<dyn AccessService>) -> Self {
        Self {
            registry: Arc::new(registry),
            access_service,
        }
    }

    /// Validates the configuration and connects an HTTP access service to it.
    pub fn from_config(config: &GamineConfig) -> Result<Self> {
        config.validate()?;
        let service = HttpAccessService::from_config(&config.service)?;
        tracing::info!(
            "Gamine ready: {} models, {} managers, base_url={}",
            config.models.len(),
            config.managers.len(),
            config.base_url()
        );
        Ok(Self::new(config.registry(), Arc::new(service)))
    }

    pub fn registry(&self) -> &Arc<MetadataRegistry> {
        &self.registry
    }

    pub fn access_service(&self) -> &Arc<dyn AccessService> {
        &self.access_service
    }

    pub fn manager<M: Model>(&self, name: &str) -> Result<Manager<M>> {
        let definition = self.registry.manager_definition(name)?.clone();
        let schema = self.registry.model(&definition.model)?;
        Manager::new(Arc::clone(&self.access_service), definition, schema)
    }

    pub fn array_manager(&self, name: &str) -> Result<Manager<ArrayModel>> {
        self.manager(name)
    }
}
