// Adapters layer: concrete implementations for external systems (WFS endpoint, area store)

pub mod http;
pub mod store;

pub use http::WfsFetcher;
pub use store::JsonAreaStore;
