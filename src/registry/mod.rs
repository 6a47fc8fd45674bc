//! Site registry subsystem.
//!
//! # Data Flow
//! ```text
//! load():
//!     list <root>
//!     → 404.html / 403.html → global fallbacks
//!     → <host>/config.toml → SiteConfig (default on failure)
//!     → SiteBuilder per host (shared DedupCache for the pass)
//!     → Generation → single atomic store
//!
//! fetch(scheme, host, path):
//!     [dev mode: load()]
//!     → snapshot current Generation
//!     → host → default host → 403 fallback
//!     → clean path
//!     → fancy prefix? stream from disk : scheme map lookup
//!     → site /404.html → global 404 → built-in
//! ```
//!
//! # Design Decisions
//! - Generations are immutable and swapped whole
//! - No lock is held while reading or compressing files
//! - A failed load never replaces the current generation
//! - fetch is total: every input maps to a resource and a status

pub mod sites;
pub mod status;

pub use sites::{normalize_host, Fetched, Generation, SiteRegistry};
pub use status::{HostStatus, StatusSnapshot};
