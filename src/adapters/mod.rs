// Adapters layer: concrete access services (HTTP REST, in-memory).

pub mod http;
pub mod memory;

pub use http::HttpAccessService;
pub use memory::InMemoryAccessService;
