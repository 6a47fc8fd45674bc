//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP / HTTPS listener (scheme fixed per listener)
//!     → resolver.rs (method check, host + path extraction)
//!     → SiteRegistry::fetch → (resource, status)
//!     → resolver.rs (variant, headers, 304, HEAD)
//!     → body.rs (disk-backed resources only)
//!     → access.rs (one record per request)
//!
//! Command listener
//!     → command.rs (/devel, /prod, /reload, /status, /status.json)
//! ```

pub mod access;
pub mod body;
pub mod command;
pub mod resolver;
pub mod server;

pub use access::{AccessLog, AccessRecord, TracingAccessLog};
pub use command::command_router;
pub use resolver::{build_response, ServeState};
pub use server::{content_router, HttpServer, ServerError};
