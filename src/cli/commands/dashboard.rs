use anyhow::Result;

use crate::cli::commands::{workflow::queue_counts, Command, Session};
use crate::notifications::NotificationSource;
use crate::screens::{Badged, QueueBoard};
use crate::workflow::{ContactSuggestions, MemoRouting, WorkflowStatus};

pub struct DashboardCommand;

impl DashboardCommand {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DashboardCommand {
    fn default() -> Self {
        Self::new()
    }
}

fn print_counts<S: Badged>(title: &str, counts: &Result<Vec<(S, usize)>, String>) {
    println!("{title}");
    println!("────────────────────");
    match counts {
        Ok(counts) => {
            for (status, count) in counts {
                let name = status.queue_name().unwrap_or(status.as_str());
                let marker = if *count == 0 { "🟢" } else { "🟡" };
                println!("{marker} {name}: {count} waiting");
            }
        }
        Err(message) => println!("❌ Unavailable: {message}"),
    }
    println!();
}

impl Command for DashboardCommand {
    async fn execute(&self) -> Result<()> {
        let session = Session::connect()?;

        println!("🗂️  DESKFLOW DASHBOARD");
        println!("======================");
        println!(
            "👤 {} ({})",
            session.auth.actor(),
            session.auth.role()
        );
        println!();

        let mut suggestions = QueueBoard::new(session.backend::<ContactSuggestions>());
        let mut memos = QueueBoard::new(session.backend::<MemoRouting>());
        let (suggestion_counts, memo_counts, unread) = tokio::join!(
            queue_counts(&mut suggestions),
            queue_counts(&mut memos),
            session.client.unread_count()
        );

        print_counts("📇 CONTACT SUGGESTIONS:", &suggestion_counts);
        print_counts("📨 MEMO ROUTING:", &memo_counts);

        match unread {
            Ok(count) => println!("🔔 Unread notifications: {count}"),
            Err(e) => println!("🔔 Notifications unavailable: {e}"),
        }

        if suggestion_counts.is_err() || memo_counts.is_err() {
            println!();
            println!("💡 Some queues failed to load; run the pending command for details");
        }
        Ok(())
    }
}
