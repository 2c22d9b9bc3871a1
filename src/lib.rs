pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod models;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{HttpAccessService, InMemoryAccessService};
pub use config::GamineConfig;
pub use core::gamine::Gamine;
pub use core::manager::{Manager, ManagerHooks, NoHooks};
pub use core::metadata::{resolve_identifier, IdentifierMetadata, ManagerDefinition, MetadataRegistry};
pub use domain::model::{DataArray, Model, Params, StorableObject};
pub use domain::ports::AccessService;
pub use domain::schema::{ColumnMarker, FieldKind, FieldSchema, ModelSchema};
pub use models::{ArrayModel, Example};
pub use utils::error::{GamineError, Result};
