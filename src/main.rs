use anyhow::Result;
use clap::Parser;

use deskflow::cli::commands::{
    config::ConfigCommand, dashboard::DashboardCommand, memos::MemosCommand,
    notifications::NotificationsCommand, suggestions::SuggestionsCommand, Command,
};
use deskflow::cli::{Cli, Commands};
use deskflow::config::{DeskflowConfig, ObservabilityConfig};
use deskflow::{init_telemetry, ShutdownCoordinator};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _ = DeskflowConfig::load_env_file();
    let observability = deskflow::config()
        .map(|cfg| cfg.observability.clone())
        .unwrap_or_else(|_| ObservabilityConfig {
            log_level: "warn".to_string(),
            json_logs: false,
        });
    if let Err(e) = init_telemetry(&observability) {
        eprintln!("Warning: could not initialize logging: {e}");
    }

    let result = match cli.command {
        None => {
            println!("🗂️  deskflow - office dashboard approvals");
            println!();
            println!("   deskflow dashboard             what is waiting on you");
            println!("   deskflow suggestions pending   contact changes awaiting admin review");
            println!("   deskflow memos pending         memos at desk-head and LEO review");
            println!("   deskflow config init           write a deskflow.toml to edit");
            println!();
            println!("💡 Run 'deskflow --help' for every command");
            Ok(())
        }
        Some(Commands::Suggestions { action }) => SuggestionsCommand::new(action).execute().await,
        Some(Commands::Memos { action }) => MemosCommand::new(action).execute().await,
        Some(Commands::Dashboard) => DashboardCommand::new().execute().await,
        Some(Commands::Notifications { watch }) => NotificationsCommand::new(watch).execute().await,
        Some(Commands::Config { action }) => ConfigCommand::new(action).execute().await,
    };

    ShutdownCoordinator::shutdown_all_services();
    result
}
