//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the content router for each scheme
//! - Bind the HTTP, HTTPS and command listeners
//! - Drain every listener on shutdown

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

use crate::config::ServerConfig;
use crate::content::Scheme;
use crate::http::access::{AccessLog, TracingAccessLog};
use crate::http::command::command_router;
use crate::http::resolver::{serve, ServeState};
use crate::lifecycle::Shutdown;
use crate::net::tls::load_tls_config;
use crate::registry::SiteRegistry;

/// How long the HTTPS listener waits for open connections on shutdown.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Server startup and runtime errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("cannot bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("TLS error: {0}")]
    Tls(#[source] io::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Build the router serving static content for one scheme.
pub fn content_router(
    registry: Arc<SiteRegistry>,
    scheme: Scheme,
    access_log: Arc<dyn AccessLog>,
) -> Router {
    Router::new().fallback(serve).with_state(ServeState {
        registry,
        scheme,
        access_log,
    })
}

/// The static content server and its command listener.
pub struct HttpServer {
    config: ServerConfig,
    registry: Arc<SiteRegistry>,
    access_log: Arc<dyn AccessLog>,
}

impl HttpServer {
    pub fn new(config: ServerConfig, registry: Arc<SiteRegistry>) -> Self {
        Self {
            config,
            registry,
            access_log: Arc::new(TracingAccessLog),
        }
    }

    fn router(&self, scheme: Scheme) -> Router {
        content_router(self.registry.clone(), scheme, self.access_log.clone())
    }

    /// Run every configured listener until shutdown is triggered.
    ///
    /// A listener that fails triggers shutdown of the others; the first
    /// error is returned once all have stopped.
    pub async fn run(self, shutdown: &Shutdown) -> Result<(), ServerError> {
        let mut tasks: JoinSet<Result<(), ServerError>> = JoinSet::new();

        let http = &self.config.http;
        if !http.address.is_empty() {
            let listener = bind(&http.address).await?;
            tracing::info!(address = %listener.local_addr()?, "HTTP listener started");

            let app = self.router(Scheme::Http);
            let signal = shutdown.signalled();
            tasks.spawn(async move {
                axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                    .with_graceful_shutdown(signal)
                    .await?;
                tracing::info!("HTTP listener stopped");
                Ok::<(), ServerError>(())
            });
        }

        let https = &self.config.https;
        if !https.address.is_empty() {
            let tls = load_tls_config(https).await.map_err(ServerError::Tls)?;
            let addr: SocketAddr = https.address.parse().map_err(|e| ServerError::Bind {
                address: https.address.clone(),
                source: io::Error::new(io::ErrorKind::InvalidInput, e),
            })?;
            tracing::info!(address = %addr, "HTTPS listener starting");

            let handle = axum_server::Handle::new();
            let signal = shutdown.signalled();
            let drain = handle.clone();
            tokio::spawn(async move {
                signal.await;
                drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
            });

            let app = self.router(Scheme::Https);
            tasks.spawn(async move {
                axum_server::bind_rustls(addr, tls)
                    .handle(handle)
                    .serve(app.into_make_service_with_connect_info::<SocketAddr>())
                    .await?;
                tracing::info!("HTTPS listener stopped");
                Ok::<(), ServerError>(())
            });
        }

        let command = &self.config.command;
        if !command.address.is_empty() {
            let listener = bind(&command.address).await?;
            tracing::info!(address = %listener.local_addr()?, "Command listener started");

            let app = command_router(
                self.registry.clone(),
                Duration::from_secs(command.timeout_secs),
            );
            let signal = shutdown.signalled();
            tasks.spawn(async move {
                axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                    .with_graceful_shutdown(signal)
                    .await?;
                tracing::info!("Command listener stopped");
                Ok::<(), ServerError>(())
            });
        }

        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => Err(ServerError::Io(io::Error::other(e))),
            };
            if let Err(e) = outcome {
                tracing::error!(error = %e, "Listener failed, shutting down");
                shutdown.trigger();
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

async fn bind(address: &str) -> Result<TcpListener, ServerError> {
    TcpListener::bind(address)
        .await
        .map_err(|source| ServerError::Bind {
            address: address.to_string(),
            source,
        })
}
