use anyhow::Result;
use tokio::sync::watch;
use tracing::info;

/// Graceful shutdown coordinator for deskflow
///
/// Long-running commands (notification watch) hold a `ShutdownSignal` and
/// stop when Ctrl-C arrives or `trigger` is called.
pub struct ShutdownCoordinator {
    tx: watch::Sender<bool>,
}

/// Receiving side handed to background loops.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    pub fn trigger(&self) {
        // send_replace works even when nobody is subscribed yet
        self.tx.send_replace(true);
    }

    /// Wait for Ctrl-C, then notify every subscriber.
    pub async fn wait_for_ctrl_c(&self) -> Result<()> {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl-C, shutting down");
        self.trigger();
        Ok(())
    }

    /// Final cleanup once the command has finished.
    pub fn shutdown_all_services() {
        info!("Initiating graceful shutdown...");
        crate::telemetry::shutdown_telemetry();
        info!("Graceful shutdown completed successfully");
    }
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been requested. A dropped coordinator
    /// counts as a request.
    pub async fn wait(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}
