//! OS signal handling.
//!
//! # Responsibilities
//! - SIGINT/SIGTERM → trigger graceful shutdown
//! - SIGHUP → reload the content root

use std::sync::Arc;

use crate::lifecycle::Shutdown;
use crate::registry::SiteRegistry;

/// Handle process signals until one of them asks for shutdown.
pub async fn handle_signals(registry: Arc<SiteRegistry>, shutdown: Shutdown) {
    wait_for_termination(&registry).await;
    tracing::info!("Shutdown signal received");
    shutdown.trigger();
}

#[cfg(unix)]
async fn wait_for_termination(registry: &Arc<SiteRegistry>) {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut term, mut hup) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::hangup()),
    ) {
        (Ok(term), Ok(hup)) => (term, hup),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!(error = %e, "Cannot install signal handlers, only Ctrl+C is handled");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return,
            _ = term.recv() => return,
            _ = hup.recv() => {
                tracing::info!("SIGHUP received, reloading");
                if let Err(e) = registry.reload().await {
                    tracing::error!(error = %e, "Reload failed, keeping current generation");
                }
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_termination(_registry: &Arc<SiteRegistry>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
