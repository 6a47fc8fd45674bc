//! Network layer subsystem.
//!
//! Plain listeners are bound directly by the HTTP server; this module only
//! prepares TLS material for the HTTPS listener.

pub mod tls;

pub use tls::load_tls_config;
