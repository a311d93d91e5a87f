// Screen hosting shared by the suggestion and memo commands.

use anyhow::{anyhow, bail, Result};
use tracing::Instrument;

use crate::cli::commands::Session;
use crate::observability::{create_workflow_span, OperationTimer};
use crate::screens::detail::{self, Describe};
use crate::screens::{Badged, BoardState, ListView, LoadState, QueueBoard, ReviewError, ReviewSession};
use crate::services::{RestResource, StatusFilter};
use crate::telemetry::generate_correlation_id;
use crate::workflow::{Decision, ItemId, Workflow, WorkflowItem, WorkflowStatus};

/// Workflows the terminal can host.
pub trait Hosted: RestResource + Describe {}

impl<W: RestResource + Describe> Hosted for W {}

pub fn parse_filter<S: WorkflowStatus>(raw: &str) -> Result<StatusFilter<S>> {
    StatusFilter::parse(raw).ok_or_else(|| {
        let known: Vec<String> = S::ALL
            .iter()
            .map(|s| s.as_str().to_ascii_lowercase())
            .collect();
        anyhow!("Unknown status '{}'; use all or one of: {}", raw, known.join(", "))
    })
}

pub fn parse_decision(raw: &str) -> Result<Decision> {
    match Decision::parse(raw) {
        Some(Decision::Submit) | None => bail!("Unknown decision '{raw}'; use approve or reject"),
        Some(decision) => Ok(decision),
    }
}

fn print_failure(what: &str, message: &str) -> anyhow::Error {
    println!("❌ Failed to load {what}: {message}");
    anyhow!("failed to load {what}")
}

pub async fn list<W: Hosted>(session: &Session, filter: StatusFilter<W::Status>) -> Result<()>
where
    W::Status: Badged,
{
    let span = create_workflow_span(W::NOUN, "list", &generate_correlation_id());
    let mut view = ListView::new(session.backend::<W>());
    view.set_filter(filter).instrument(span).await;

    match view.state() {
        LoadState::Ready(items) => {
            println!("📋 {} {}s ({})", items.len(), W::NOUN, filter);
            println!();
            for item in items {
                println!("{}", detail::row(item));
            }
            Ok(())
        }
        LoadState::Empty => {
            println!("📭 No {}s match filter '{}'", W::NOUN, filter);
            println!("   💡 {}", empty_hint::<W>(filter));
            Ok(())
        }
        LoadState::Failed(message) => Err(print_failure(&format!("{}s", W::NOUN), message)),
        LoadState::Idle | LoadState::Loading => Ok(()),
    }
}

/// Next step to offer when a list comes back empty.
fn empty_hint<W: Hosted>(filter: StatusFilter<W::Status>) -> String {
    match filter {
        StatusFilter::Only(_) => format!(
            "Try 'deskflow {}s list --status all', or start one: {}",
            W::NOUN,
            W::CREATE_COMMAND
        ),
        StatusFilter::All => format!("Start one: {}", W::CREATE_COMMAND),
    }
}

pub async fn pending<W: Hosted>(session: &Session) -> Result<()>
where
    W::Status: Badged,
{
    let timer = OperationTimer::new(&format!("{}_pending_queues", W::NOUN));
    let mut board = QueueBoard::new(session.backend::<W>());
    board.refresh().await;
    timer.finish();

    match board.state() {
        BoardState::Ready(queues) => {
            for queue in queues {
                let title = queue.status.queue_name().unwrap_or(queue.status.as_str());
                println!("⏳ {} ({} waiting)", title, queue.items.len());
                println!("────────────────────");
                if queue.items.is_empty() {
                    println!("   Nothing waiting");
                }
                for item in &queue.items {
                    println!("{}", detail::row(item));
                }
                println!();
            }
            Ok(())
        }
        BoardState::Failed(message) => Err(print_failure("pending queues", message)),
        BoardState::Idle | BoardState::Loading => Ok(()),
    }
}

async fn fetch_one<W: Hosted>(session: &Session, id: &ItemId) -> Result<(ListView<W>, WorkflowItem<W>)>
where
    W::Status: Badged,
{
    let mut view = ListView::new(session.backend::<W>());
    view.refresh().await;
    if let LoadState::Failed(message) = view.state() {
        return Err(print_failure(&format!("{} {}", W::NOUN, id), message));
    }
    let item = view
        .find(id)
        .cloned()
        .ok_or_else(|| anyhow!("{} #{} not found", W::NOUN, id))?;
    Ok((view, item))
}

pub async fn show<W: Hosted>(session: &Session, id: &str) -> Result<()>
where
    W::Status: Badged,
{
    let (_, item) = fetch_one::<W>(session, &ItemId::new(id)).await?;
    for line in detail::detail(&item, &session.auth) {
        println!("{line}");
    }
    Ok(())
}

/// Open the review dialog on `id` and submit one decision.
pub async fn review<W: Hosted>(
    session: &Session,
    id: &str,
    decision: Decision,
    comment: Option<String>,
) -> Result<()>
where
    W::Status: Badged,
{
    let id = ItemId::new(id);
    let span = create_workflow_span(W::NOUN, decision.as_str(), &generate_correlation_id());
    let (mut view, item) = fetch_one::<W>(session, &id).instrument(span.clone()).await?;

    let mut dialog = ReviewSession::new(session.backend::<W>(), session.auth.clone());
    if let Err(e) = dialog.open(&item) {
        println!("🚫 Cannot {} {} #{}: {}", decision, W::NOUN, id, e);
        return Err(e.into());
    }

    println!("📝 Sending '{}' for {} #{}...", decision, W::NOUN, id);
    match dialog
        .submit(&mut view, decision, comment)
        .instrument(span)
        .await
    {
        Ok(updated) => {
            println!("✅ Done");
            println!();
            for line in detail::detail(&updated, &session.auth) {
                println!("{line}");
            }
            Ok(())
        }
        Err(ReviewError::Backend(e)) => {
            println!("❌ {}", e);
            println!("   💡 {}", e.hint());
            println!("   Status unchanged: {}", item.status());
            Err(e.into())
        }
        Err(e) => {
            println!("🚫 {}", e);
            Err(e.into())
        }
    }
}

pub async fn delete<W: Hosted>(session: &Session, id: &str) -> Result<()>
where
    W::Status: Badged,
{
    let id = ItemId::new(id);
    let mut view = ListView::new(session.backend::<W>());
    match view.delete(&id).await {
        Ok(()) => {
            println!("🗑️  Deleted {} #{}", W::NOUN, id);
            Ok(())
        }
        Err(e) => {
            println!("❌ Could not delete {} #{}: {}", W::NOUN, id, e);
            println!("   💡 {}", e.hint());
            Err(e.into())
        }
    }
}

/// Count of items waiting in each queue, for the dashboard.
pub async fn queue_counts<W: Workflow>(board: &mut QueueBoard<W>) -> Result<Vec<(W::Status, usize)>, String> {
    board.refresh().await;
    match board.state() {
        BoardState::Ready(queues) => Ok(queues.iter().map(|q| (q.status, q.items.len())).collect()),
        BoardState::Failed(message) => Err(message.clone()),
        BoardState::Idle | BoardState::Loading => Ok(Vec::new()),
    }
}
