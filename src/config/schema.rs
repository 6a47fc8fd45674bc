//! Configuration schema definitions.
//!
//! Two documents are described here: the server configuration read at
//! startup, and the per-host policy (`<root>/<host>/config.toml`) read on
//! every reload. All types derive Serde traits for deserialization from
//! TOML.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration for the server process.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Directory holding one subdirectory per virtual host.
    pub root: PathBuf,

    /// Host used when the request host is unknown or absent.
    pub default_host: String,

    /// Reload the whole root before every request.
    pub development: bool,

    /// Reload automatically when the root changes on disk.
    pub watch: bool,

    /// Plain HTTP listener.
    pub http: HttpListenerConfig,

    /// TLS listener.
    pub https: HttpsListenerConfig,

    /// Command (control) listener.
    pub command: CommandConfig,

    /// Log output settings.
    pub log: LogConfig,

    /// Metrics exporter settings.
    pub metrics: MetricsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/srv/web"),
            default_host: String::new(),
            development: false,
            watch: false,
            http: HttpListenerConfig::default(),
            https: HttpsListenerConfig::default(),
            command: CommandConfig::default(),
            log: LogConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Plain HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpListenerConfig {
    /// Bind address (e.g., "0.0.0.0:80"). Empty disables the listener.
    pub address: String,
}

impl Default for HttpListenerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:80".to_string(),
        }
    }
}

/// TLS listener configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpsListenerConfig {
    /// Bind address. Empty disables the listener.
    pub address: String,

    /// Path to certificate file (PEM).
    pub cert: String,

    /// Path to private key file (PEM).
    pub key: String,
}

/// Command server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Bind address. Empty disables the command server.
    pub address: String,

    /// Per-command timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:65001".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log file. Empty logs to stderr.
    pub file: String,

    /// Lines per log file before rotation.
    pub lines: usize,

    /// Default filter when `RUST_LOG` is unset.
    pub level: String,

    /// Discard all log output.
    pub quiet: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: String::new(),
            lines: 100_000,
            level: "info".to_string(),
            quiet: false,
        }
    }
}

/// Metrics exporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable the Prometheus scrape endpoint.
    pub enabled: bool,

    /// Scrape endpoint bind address.
    pub address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "127.0.0.1:9090".to_string(),
        }
    }
}

const THREE_MONTHS_SECS: u64 = 90 * 24 * 60 * 60;
const ONE_WEEK_SECS: u64 = 7 * 24 * 60 * 60;
const ONE_HOUR_SECS: u64 = 60 * 60;

/// Minimum plain size, in bytes, before gzip is considered.
pub const DEFAULT_MIN_COMPRESS_SIZE: usize = 1024;

/// Gzip must beat the plain size by at least this factor.
pub const DEFAULT_MIN_COMPRESS_RATIO: f64 = 1.1;

/// Per-host serving policy.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    pub general: GeneralConfig,
    pub cache: CacheConfig,
    pub compression: CompressionConfig,
}

/// Path handling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// File served for a directory request.
    pub default_file: String,

    /// Request prefix served straight from the host's `fancy` directory.
    /// Empty disables disk streaming.
    pub fancy_folder: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_file: "index.html".to_string(),
            fancy_folder: "/f/".to_string(),
        }
    }
}

/// Cache-Control policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Max-age per extension (".css"), in seconds.
    pub times: HashMap<String, u64>,

    /// Max-age for extensions not in `times`, in seconds.
    pub default_secs: u64,

    /// Serve in-memory resources with no-cache.
    pub no_cache_from_mem: bool,

    /// Serve disk-streamed resources with no-cache.
    pub no_cache_from_disk: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let mut times = HashMap::new();
        for ext in [".woff", ".woff2", ".ttf", ".eot", ".otf", ".jpg", ".png"] {
            times.insert(ext.to_string(), THREE_MONTHS_SECS);
        }
        times.insert(".css".to_string(), ONE_WEEK_SECS);

        Self {
            times,
            default_secs: ONE_HOUR_SECS,
            no_cache_from_mem: false,
            no_cache_from_disk: true,
        }
    }
}

/// Gzip policy.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Minimum plain size in bytes. Zero means the default.
    pub min_size: usize,

    /// Minimum plain/gzip size ratio. Zero means the default.
    pub min_ratio: f64,

    /// Extensions never served compressed (".png").
    pub blacklist: Vec<String>,

    /// Never compress in-memory resources.
    pub no_compress_from_mem: bool,

    /// Never compress disk-streamed resources.
    pub no_compress_from_disk: bool,
}

impl CompressionConfig {
    /// Effective minimum size.
    pub fn min_size(&self) -> usize {
        if self.min_size == 0 {
            DEFAULT_MIN_COMPRESS_SIZE
        } else {
            self.min_size
        }
    }

    /// Effective minimum ratio.
    pub fn min_ratio(&self) -> f64 {
        if self.min_ratio <= 0.0 {
            DEFAULT_MIN_COMPRESS_RATIO
        } else {
            self.min_ratio
        }
    }

    /// Whether `ext` (with its leading dot) is blacklisted.
    pub fn is_blacklisted(&self, ext: &str) -> bool {
        self.blacklist.iter().any(|b| b == ext)
    }
}
