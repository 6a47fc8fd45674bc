//! Access logging.
//!
//! Every request produces exactly one [`AccessRecord`], whatever its outcome.
//! Where the record goes is up to the [`AccessLog`] implementation; the
//! default emits a `tracing` event under the `access` target so it can be
//! filtered or routed separately from diagnostics.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{header, request::Parts, StatusCode};

/// Placeholder for absent header values.
pub const MISSING: &str = "-";

/// One line of the access log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    pub client: String,
    /// Last `X-Forwarded-For` value.
    pub forwarded_for: String,
    pub status: u16,
    pub method: String,
    pub uri: String,
    pub version: String,
    /// First `User-Agent` value.
    pub user_agent: String,
}

impl AccessRecord {
    pub fn new(parts: &Parts, status: StatusCode) -> Self {
        let client = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_else(|| MISSING.to_string());

        let forwarded_for = parts
            .headers
            .get_all("x-forwarded-for")
            .iter()
            .last()
            .and_then(|v| v.to_str().ok())
            .unwrap_or(MISSING)
            .to_string();

        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(MISSING)
            .to_string();

        Self {
            client,
            forwarded_for,
            status: status.as_u16(),
            method: parts.method.to_string(),
            uri: parts.uri.to_string(),
            version: format!("{:?}", parts.version),
            user_agent,
        }
    }
}

impl std::fmt::Display for AccessRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] ({}): {} \"{} {} {}\" \"{}\"",
            self.client,
            self.forwarded_for,
            self.status,
            self.method,
            self.uri,
            self.version,
            self.user_agent
        )
    }
}

/// Sink for access records.
pub trait AccessLog: Send + Sync + std::fmt::Debug {
    fn record(&self, record: &AccessRecord);
}

/// Writes access records as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAccessLog;

impl AccessLog for TracingAccessLog {
    fn record(&self, record: &AccessRecord) {
        tracing::info!(
            target: "access",
            client = %record.client,
            forwarded_for = %record.forwarded_for,
            status = record.status,
            method = %record.method,
            uri = %record.uri,
            version = %record.version,
            user_agent = %record.user_agent,
            "{}",
            record
        );
    }
}
