//! Virtual-host static content server library.

// Core subsystems
pub mod config;
pub mod content;
pub mod http;
pub mod net;
pub mod registry;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::{ServerConfig, SiteConfig};
pub use content::{Resource, Scheme};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use registry::SiteRegistry;
