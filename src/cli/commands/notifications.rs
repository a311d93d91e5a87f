use anyhow::Result;
use std::time::Duration;
use tracing::warn;

use crate::cli::commands::{Command, Session};
use crate::notifications::{NotificationPoller, NotificationSource};
use crate::shutdown::ShutdownCoordinator;

pub struct NotificationsCommand {
    watch: bool,
}

impl NotificationsCommand {
    pub fn new(watch: bool) -> Self {
        Self { watch }
    }
}

impl Command for NotificationsCommand {
    async fn execute(&self) -> Result<()> {
        let session = Session::connect()?;

        if !self.watch {
            let count = session.client.unread_count().await?;
            println!("🔔 {count} unread notification(s)");
            return Ok(());
        }

        let every = Duration::from_secs(session.config.notifications.poll_interval_seconds);
        println!(
            "🔔 Watching unread notifications every {}s (Ctrl-C to stop)",
            every.as_secs()
        );

        let coordinator = ShutdownCoordinator::new();
        let poller = NotificationPoller::new(session.client.clone(), every);
        let run = poller.run(coordinator.subscribe(), |count| {
            println!("🔔 {count} unread notification(s)");
        });

        tokio::select! {
            _ = run => {}
            result = coordinator.wait_for_ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "Could not listen for Ctrl-C");
                }
            }
        }

        Ok(())
    }
}
