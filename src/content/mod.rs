//! Content subsystem: resources, policy and site building.
//!
//! # Data Flow
//! ```text
//! <root>/<host>/{http,https,common}/...
//!     → builder.rs (walk, read, dedup by SHA-256, gzip, tag)
//!     → policy.rs (cache-control, gzip eligibility)
//!     → resource.rs (immutable Resource)
//!     → site.rs (per-scheme path → Arc<Resource> maps)
//! ```
//!
//! # Design Decisions
//! - Resources are immutable; reloads build new ones
//! - Identical bytes share buffers and tags within one load pass
//! - Entity tags are per variant (plain, gzip)

pub mod builder;
pub mod path;
pub mod policy;
pub mod resource;
pub mod site;

pub use builder::{ContentStats, DedupCache, LoadError, SiteBuilder};
pub use resource::{Origin, Payload, Resource};
pub use site::{Scheme, SchemeSet, Site};
