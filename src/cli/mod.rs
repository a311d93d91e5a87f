use clap::{Parser, Subcommand};

pub mod commands;

#[derive(Parser)]
#[command(name = "deskflow")]
#[command(about = "Office dashboard approvals from the terminal")]
#[command(long_about = "deskflow works the office dashboard's approval workflows: contact \
                       suggestions reviewed by admins, and memos routed through desk-head and LEO \
                       review. Start with 'deskflow dashboard' to see what is waiting on you.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Contact change suggestions (staff propose, admins review)
    Suggestions {
        #[command(subcommand)]
        action: SuggestionAction,
    },
    /// Memos routed through desk-head and LEO approval
    Memos {
        #[command(subcommand)]
        action: MemoAction,
    },
    /// Overview of every pending queue and unread notifications
    Dashboard,
    /// Show the unread notification count
    Notifications {
        /// Keep polling until Ctrl-C
        #[arg(long, help = "Poll on the configured interval until interrupted")]
        watch: bool,
    },
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum SuggestionAction {
    /// List suggestions, newest first
    List {
        /// Status filter: all, pending, approved, rejected
        #[arg(long, default_value = "all")]
        status: String,
    },
    /// Suggestions waiting for admin review
    Pending,
    /// Show one suggestion with its review history
    Show { id: String },
    /// Propose a change to a directory contact
    Submit {
        /// Contact id
        contact_id: String,
        /// Contact name shown to reviewers
        #[arg(long, default_value = "")]
        contact_name: String,
        /// Why the change is needed
        #[arg(long, default_value = "")]
        reason: String,
        /// Proposed change as field=value (repeatable)
        #[arg(long = "change", value_parser = parse_change)]
        changes: Vec<(String, String)>,
    },
    /// Approve or reject a pending suggestion (admins)
    Review {
        id: String,
        /// approve or reject
        #[arg(long)]
        decision: String,
        /// Comment shown to the submitter
        #[arg(long)]
        comment: Option<String>,
    },
    /// Remove a suggestion outside the review flow
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum MemoAction {
    /// List memos, newest first
    List {
        /// Status filter: all, draft, pending_desk_head, pending_leo, approved, rejected
        #[arg(long, default_value = "all")]
        status: String,
    },
    /// Memos waiting at desk-head and LEO review
    Pending,
    /// Show one memo with its routing history
    Show { id: String },
    /// Create a memo draft
    Create {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        department: String,
        #[arg(long, default_value = "")]
        body: String,
    },
    /// Send your draft to desk-head review
    Submit { id: String },
    /// Approve or reject a memo at your review stage
    Review {
        id: String,
        /// approve or reject
        #[arg(long)]
        decision: String,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Remove a memo outside the routing flow
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write a deskflow.toml with default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration (token redacted)
    Show,
}

fn parse_change(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected field=value, got '{raw}'")),
    }
}
