pub mod array_model;
pub mod example;

pub use array_model::ArrayModel;
pub use example::Example;
