pub mod gamine;
pub mod manager;
pub mod metadata;

pub use crate::domain::model::{DataArray, Model, Params, StorableObject};
pub use crate::domain::ports::AccessService;
pub use crate::utils::error::Result;
