//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (diagnostics; access records under target "access")
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → logging.rs (stderr, or rotate.rs for a log file)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event
//! - Metrics are cheap (atomic increments) and optional

pub mod logging;
pub mod metrics;
pub mod rotate;

pub use logging::init_logging;
pub use rotate::RotateWriter;
