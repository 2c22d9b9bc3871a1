// Domain layer: model traits, schemas and the access service port.

pub mod model;
pub mod ports;
pub mod schema;
