//! Health-aware model router library.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod upstream;

pub use config::RouterConfig;
pub use health::HealthRegistry;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::Selector;
