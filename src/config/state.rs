// Application state module
// Shared by every connection: configuration, catalog snapshot, lifecycle signals

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

use super::types::Config;
use crate::error::{MediaError, Result};
use crate::media::Catalog;

/// Application state
pub struct AppState {
    pub config: Config,
    catalog: RwLock<Arc<Catalog>>,
    /// Flips to `true` once; the accept loop and every connection watch it
    shutdown: watch::Sender<bool>,

    // Cached config values for fast access without locks
    pub cached_access_log: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: Config, catalog: Catalog) -> Self {
        let cached_access_log = Arc::new(AtomicBool::new(config.logging.access_log));
        Self {
            config,
            catalog: RwLock::new(Arc::new(catalog)),
            shutdown: watch::Sender::new(false),
            cached_access_log,
        }
    }

    /// Current catalog snapshot; stays valid across reloads
    pub async fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&*self.catalog.read().await)
    }

    /// Rebuild the catalog from storage and swap it in
    ///
    /// On failure the previous catalog stays active.
    pub async fn reload_catalog(&self) -> Result<usize> {
        let storage = self.config.storage.clone();
        let catalog = tokio::task::spawn_blocking(move || Catalog::load(&storage))
            .await
            .map_err(|e| MediaError::Catalog(format!("catalog reload task failed: {e}")))??;

        let count = catalog.len();
        *self.catalog.write().await = Arc::new(catalog);
        Ok(count)
    }

    /// Ask the server loop and open connections to stop
    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Resolves once shutdown has been requested, immediately if it already was
    pub async fn shutdown_requested(&self) {
        let mut rx = self.shutdown.subscribe();
        // The sender lives as long as `self`, so an error cannot happen here
        let _ = rx.wait_for(|stop| *stop).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_for(dir: &std::path::Path) -> AppState {
        let mut config = Config::load_from(dir.join("absent").to_str().unwrap()).unwrap();
        config.storage.media_dir = dir.to_string_lossy().into_owned();
        let catalog = Catalog::load(&config.storage).unwrap();
        AppState::new(config, catalog)
    }

    #[tokio::test]
    async fn test_reload_picks_up_new_files() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path());
        let before = state.catalog().await;
        assert!(before.is_empty());

        std::fs::write(dir.path().join("new.mp4"), b"video").unwrap();
        assert_eq!(state.reload_catalog().await.unwrap(), 1);

        // Old snapshot is unaffected, new one sees the file
        assert!(before.is_empty());
        assert!(state.catalog().await.get("new.mp4").is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_flag() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path());
        let state = Arc::new(state);
        assert!(!state.is_shutting_down());

        let waiter = {
            let state = Arc::clone(&state);
            tokio::spawn(async move { state.shutdown_requested().await })
        };
        tokio::task::yield_now().await;
        state.request_shutdown();
        assert!(state.is_shutting_down());

        // Waiters registered before and after the request both complete
        waiter.await.unwrap();
        state.shutdown_requested().await;
    }
}
