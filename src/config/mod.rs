//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! server file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → command-line overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!
//! <root>/<host>/config.toml (TOML), on every reload:
//!     → loader.rs (parse & deserialize)
//!     → SiteConfig, shared via Arc by the host's Site and Resources
//!     → on any failure: SiteConfig::default()
//!
//! On content change (watch = true):
//!     watcher.rs detects change
//!     → SiteRegistry::reload
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{check_config, load_config, load_site_config, ConfigError};
pub use schema::{
    CacheConfig, CommandConfig, CompressionConfig, GeneralConfig, HttpListenerConfig,
    HttpsListenerConfig, LogConfig, MetricsConfig, ServerConfig, SiteConfig,
};
