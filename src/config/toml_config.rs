use crate::core::metadata::{ManagerDefinition, MetadataRegistry};
use crate::domain::schema::ModelSchema;
use crate::utils::error::{GamineError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_resource_name,
    validate_unique_names, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamineConfig {
    pub service: ServiceConfig,
    #[serde(default)]
    pub models: Vec<ModelSchema>,
    #[serde(default)]
    pub managers: Vec<ManagerDefinition>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    /// "compact" (default) or "json"
    pub format: Option<String>,
}

impl GamineConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(GamineError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| GamineError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_TOKEN})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| GamineError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        if self.service.base_url.trim().is_empty() {
            return Err(GamineError::MissingConfigError {
                field: "service.base_url".to_string(),
            });
        }
        validate_url("service.base_url", &self.service.base_url)?;

        if let Some(timeout) = self.service.timeout_seconds {
            validate_positive_number("service.timeout_seconds", timeout, 1)?;
        }

        validate_unique_names("models.name", self.models.iter().map(|m| m.name.as_str()))?;
        for model in &self.models {
            validate_non_empty_string("models.name", &model.name)?;
            validate_unique_names(
                &format!("models.{}.fields.property", model.name),
                model.fields.iter().map(|f| f.property.as_str()),
            )?;
        }

        validate_unique_names(
            "managers.name",
            self.managers.iter().map(|m| m.name.as_str()),
        )?;
        for manager in &self.managers {
            validate_non_empty_string("managers.name", &manager.name)?;
            if let Some(collection) = &manager.collection {
                validate_resource_name(&format!("managers.{}.collection", manager.name), collection)?;
            }
            if let Some(entity) = &manager.entity {
                validate_resource_name(&format!("managers.{}.entity", manager.name), entity)?;
            }
        }

        // 識別欄位設定與 model 參照
        self.registry().check()
    }

    /// Builds the metadata registry declared by this configuration.
    pub fn registry(&self) -> MetadataRegistry {
        let mut registry = MetadataRegistry::new();
        for model in &self.models {
            registry.register_model(model.clone());
        }
        for manager in &self.managers {
            registry.register_manager(manager.clone());
        }
        registry
    }

    pub fn base_url(&self) -> &str {
        &self.service.base_url
    }

    pub fn verbose_logging(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.verbose)
            .unwrap_or(false)
    }

    pub fn json_logging(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.format.as_deref())
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }
}

impl Validate for GamineConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
