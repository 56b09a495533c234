use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal::ctrl_c;
use tokio::sync::Notify;
use tracing::{info, warn};

/// Ctrl-C flag shared between the signal task and the export loop.
///
/// The export checks the flag between orders so the current order is
/// written and the cookie jar saved before exiting.
#[derive(Clone)]
pub struct ShutdownManager {
    shutdown_flag: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
}

impl ShutdownManager {
    pub fn new() -> Self {
        Self {
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            shutdown_notify: Arc::new(Notify::new()),
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown_flag.load(Ordering::SeqCst)
    }

    /// Resolves once shutdown was requested, including before this call.
    pub async fn wait_for_shutdown(&self) {
        let notified = self.shutdown_notify.notified();
        if self.is_shutdown() {
            return;
        }
        notified.await;
    }

    pub fn shutdown(&self) {
        if !self.shutdown_flag.swap(true, Ordering::SeqCst) {
            info!("Stopping after the current order (press Ctrl-C again to abort)");
            self.shutdown_notify.notify_waiters();
        }
    }

    pub async fn wait_for_signal(&self) -> Result<(), std::io::Error> {
        ctrl_c().await?;
        info!("Received shutdown signal (Ctrl-C)");
        self.shutdown();

        // A second Ctrl-C skips the cleanup.
        ctrl_c().await?;
        warn!("Aborting without saving the session");
        std::process::exit(130);
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn setup_shutdown_handler() -> Result<ShutdownManager, Box<dyn std::error::Error>> {
    let shutdown_manager = ShutdownManager::new();

    // Spawn a task to listen for shutdown signals
    let shutdown_manager_clone = shutdown_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = shutdown_manager_clone.wait_for_signal().await {
            warn!("Error setting up signal handler: {}", e);
        }
    });

    Ok(shutdown_manager)
}
