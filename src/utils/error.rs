use thiserror::Error;

#[derive(Error, Debug)]
pub enum GamineError {
    #[error("Type mismatch: manager is bound to `{expected}`, got `{found}`")]
    TypeMismatch { expected: String, found: String },

    #[error("Missing identifier: `{model}` object has no identifier value")]
    MissingIdentifier { model: String },

    #[error("Identifier field `{model}.{property}` has no column marker")]
    MissingAnnotationConfig { model: String, property: String },

    #[error("Route `{route}` is not defined on manager `{manager}`")]
    UnknownRoute { manager: String, route: String },

    #[error("Model `{name}` is not registered")]
    UnknownModel { name: String },

    #[error("Manager `{name}` is not registered")]
    UnknownManager { name: String },

    #[error("Manager `{manager}` has no {kind} resource")]
    MissingResource { manager: String, kind: String },

    #[error("Invalid data for `{model}.{field}`: {message}")]
    InvalidData {
        model: String,
        field: String,
        message: String,
    },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned status {status} for {url}")]
    ApiStatusError { status: u16, url: String },

    #[error("Unexpected response from {url}: {message}")]
    UnexpectedResponse { url: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in `{field}`: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value `{value}` for `{field}`: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration `{field}`")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Mapping,
    Metadata,
    Network,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl GamineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TypeMismatch { .. } | Self::MissingIdentifier { .. } => ErrorCategory::Mapping,
            Self::MissingAnnotationConfig { .. }
            | Self::UnknownRoute { .. }
            | Self::UnknownModel { .. }
            | Self::UnknownManager { .. }
            | Self::MissingResource { .. } => ErrorCategory::Metadata,
            Self::ApiError(_) | Self::ApiStatusError { .. } => ErrorCategory::Network,
            Self::InvalidData { .. }
            | Self::UnexpectedResponse { .. }
            | Self::SerializationError(_) => ErrorCategory::Data,
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Mapping | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Metadata | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::TypeMismatch { .. } => "Pass an object of the model type the manager is bound to",
            Self::MissingIdentifier { .. } => "Save the object before removing it",
            Self::MissingAnnotationConfig { .. } => {
                "Add a column marker to the identifier field in the model schema"
            }
            Self::UnknownRoute { .. } => "Declare the route under the manager's `routes` table",
            Self::UnknownModel { .. } => "Register the model schema under `[[models]]`",
            Self::UnknownManager { .. } => "Declare the manager under `[[managers]]`",
            Self::MissingResource { .. } => {
                "Set `collection` and `entity` resources on the manager definition"
            }
            Self::InvalidData { .. } => "Check that the payload matches the model schema field kinds",
            Self::ApiError(_) => "Check network connectivity and the service base URL",
            Self::ApiStatusError { .. } => "Check the resource path and service credentials",
            Self::UnexpectedResponse { .. } => {
                "Check that the resource returns JSON objects or arrays of objects"
            }
            Self::IoError(_) => "Check file paths and permissions",
            Self::SerializationError(_) => "Check that the service returns valid JSON",
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Fix the configuration file and try again",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach the data service: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GamineError>;
