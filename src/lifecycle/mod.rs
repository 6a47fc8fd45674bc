//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → every listener stops accepting → in-flight requests drain
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!     SIGHUP → SiteRegistry::reload
//! ```
//!
//! # Design Decisions
//! - One broadcast coordinator shared by all listeners and background tasks
//! - A failing listener triggers shutdown for the others
//! - SIGHUP reloads content, never configuration

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
