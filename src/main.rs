//! Virtual-host static content server.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!   HTTP  :80  ─────────▶│  http::resolver (scheme = http)              │
//!   HTTPS :443 ─────────▶│  http::resolver (scheme = https)             │
//!                        │        │                                     │
//!                        │        ▼                                     │
//!                        │  registry::SiteRegistry ── ArcSwap<Generation>│
//!                        │        ▲                        │            │
//!   command :65001 ─────▶│  http::command (reload)         ▼            │
//!   SIGHUP / watcher ───▶│  registry::load ── content::SiteBuilder      │
//!                        │                      + DedupCache            │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use vhost_static::config::watcher::{reload_on_change, RootWatcher};
use vhost_static::config::{check_config, load_config, ServerConfig};
use vhost_static::lifecycle::signals::handle_signals;
use vhost_static::observability::{init_logging, metrics};
use vhost_static::{HttpServer, Shutdown, SiteRegistry};

#[derive(Parser, Debug)]
#[command(name = "vhost-static")]
#[command(about = "Serve static sites per virtual host from a content root", long_about = None)]
struct Args {
    /// Server configuration file
    #[arg(short, long, default_value = "vhost-static.toml")]
    config: PathBuf,

    /// Content root (one directory per host)
    #[arg(long)]
    root: Option<PathBuf>,

    /// HTTP listen address; empty disables
    #[arg(long)]
    http: Option<String>,

    /// HTTPS listen address; empty disables
    #[arg(long)]
    https: Option<String>,

    /// TLS certificate (PEM)
    #[arg(long)]
    cert: Option<String>,

    /// TLS private key (PEM)
    #[arg(long)]
    key: Option<String>,

    /// Command server listen address; empty disables
    #[arg(long)]
    command: Option<String>,

    /// Host served when the requested one is unknown
    #[arg(long)]
    default_host: Option<String>,

    /// Log file, rotated by line count
    #[arg(long)]
    log_file: Option<String>,

    /// Reload the root before every request
    #[arg(long)]
    dev: bool,

    /// Reload when the root changes on disk
    #[arg(long)]
    watch: bool,

    /// Discard log output
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(root) = self.root {
            config.root = root;
        }
        if let Some(address) = self.http {
            config.http.address = address;
        }
        if let Some(address) = self.https {
            config.https.address = address;
        }
        if let Some(cert) = self.cert {
            config.https.cert = cert;
        }
        if let Some(key) = self.key {
            config.https.key = key;
        }
        if let Some(address) = self.command {
            config.command.address = address;
        }
        if let Some(host) = self.default_host {
            config.default_host = host;
        }
        if let Some(file) = self.log_file {
            config.log.file = file;
        }
        config.development |= self.dev;
        config.watch |= self.watch;
        config.log.quiet |= self.quiet;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let (mut config, load_error) = match load_config(&args.config) {
        Ok(config) => (config, None),
        Err(e) if e.is_not_found() => (ServerConfig::default(), Some(e)),
        Err(e) => return Err(e.into()),
    };
    let config_path = args.config.clone();
    args.apply(&mut config);
    check_config(&config)?;

    init_logging(&config.log)?;
    if let Some(e) = load_error {
        tracing::warn!(path = ?config_path, error = %e, "Configuration file not found, using defaults");
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        root = ?config.root,
        http = %config.http.address,
        https = %config.https.address,
        command = %config.command.address,
        "vhost-static starting"
    );

    if config.metrics.enabled {
        match config.metrics.address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.metrics.address,
                "Failed to parse metrics address"
            ),
        }
    }

    let registry = Arc::new(SiteRegistry::new(&config.root, &config.default_host));
    registry.reload().await?;
    registry.set_development_mode(config.development);

    let shutdown = Shutdown::new();
    tokio::spawn(handle_signals(registry.clone(), shutdown.clone()));

    // Dropping the watcher stops it; keep it for the life of the server.
    let _watcher = if config.watch {
        let (watcher, changes) = RootWatcher::new(&config.root);
        let watcher = watcher.run()?;
        tokio::spawn(reload_on_change(
            registry.clone(),
            changes,
            shutdown.subscribe(),
        ));
        Some(watcher)
    } else {
        None
    };

    HttpServer::new(config, registry).run(&shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
