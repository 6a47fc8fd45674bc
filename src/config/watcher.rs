//! Content root watcher for hot reload.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};

use crate::registry::SiteRegistry;

/// Events arriving within this window are folded into one reload.
const DEBOUNCE: Duration = Duration::from_millis(250);

/// A watcher that monitors the content root for changes.
pub struct RootWatcher {
    path: PathBuf,
    change_tx: mpsc::UnboundedSender<()>,
}

impl RootWatcher {
    /// Create a new RootWatcher.
    ///
    /// Returns the watcher and a receiver that yields once per relevant
    /// filesystem event.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (change_tx, change_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                change_tx,
            },
            change_rx,
        )
    }

    /// Start watching the root in a background thread.
    ///
    /// The returned handle must be kept alive for as long as events are
    /// wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.change_tx.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove() {
                        let _ = tx.send(());
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::Recursive)?;

        tracing::info!(path = ?self.path, "Root watcher started");
        Ok(watcher)
    }
}

/// Reload `registry` for every burst of change notifications until the
/// channel closes or shutdown is signalled.
pub async fn reload_on_change(
    registry: Arc<SiteRegistry>,
    changes: mpsc::UnboundedReceiver<()>,
    shutdown: broadcast::Receiver<()>,
) {
    debounce_changes(changes, shutdown, move || {
        let registry = registry.clone();
        async move {
            tracing::info!("Content change detected, reloading");
            if let Err(e) = registry.reload().await {
                tracing::error!(error = %e, "Reload after change failed, keeping current generation");
            }
        }
    })
    .await;
}

/// Run `on_change` once per burst of notifications. A burst is the first
/// notification plus everything that arrives within `DEBOUNCE` of it.
async fn debounce_changes<F, Fut>(
    mut changes: mpsc::UnboundedReceiver<()>,
    mut shutdown: broadcast::Receiver<()>,
    mut on_change: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        tokio::select! {
            change = changes.recv() => {
                if change.is_none() {
                    break;
                }
            }
            _ = shutdown.recv() => break,
        }

        tokio::select! {
            _ = tokio::time::sleep(DEBOUNCE) => {}
            _ = shutdown.recv() => break,
        }
        while changes.try_recv().is_ok() {}

        on_change().await;
    }
    tracing::debug!("Root watcher loop stopped");
}
