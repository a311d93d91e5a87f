// Plain-text rendering of rows and detail panes.

use crate::auth::AuthContext;
use crate::screens::badge::{self, Badged};
use crate::workflow::{ContactSuggestions, ItemStatus, MemoRouting, Workflow, WorkflowItem};

/// Per-workflow text for list rows and detail panes.
pub trait Describe: Workflow {
    /// Heading under which the latest reviewer comment is shown.
    const COMMENT_LABEL: &'static str;

    /// Command line that starts a new item, offered on empty lists.
    const CREATE_COMMAND: &'static str;

    fn headline(item: &WorkflowItem<Self>) -> String;

    /// Label/value pairs shown in the detail pane.
    fn fields(item: &WorkflowItem<Self>) -> Vec<(&'static str, String)>;

    /// Reviewer comment to show, if any.
    fn comment(item: &WorkflowItem<Self>) -> Option<String> {
        item.latest_comment().map(str::to_string)
    }
}

impl Describe for ContactSuggestions {
    const COMMENT_LABEL: &'static str = "Admin Comment";
    const CREATE_COMMAND: &'static str =
        "deskflow suggestions submit <contact-id> --reason \"...\" --change field=value";

    fn headline(item: &WorkflowItem<Self>) -> String {
        let payload = item.payload();
        format!("{}: {}", payload.contact_name, payload.reason)
    }

    fn fields(item: &WorkflowItem<Self>) -> Vec<(&'static str, String)> {
        let payload = item.payload();
        let mut fields = vec![
            ("Contact", format!("{} ({})", payload.contact_name, payload.contact_id)),
            ("Reason", payload.reason.clone()),
        ];
        for (field, value) in &payload.changes {
            fields.push(("Change", format!("{field} → {value}")));
        }
        fields
    }

    fn comment(item: &WorkflowItem<Self>) -> Option<String> {
        item.payload()
            .admin_comment
            .clone()
            .or_else(|| item.latest_comment().map(str::to_string))
    }
}

impl Describe for MemoRouting {
    const COMMENT_LABEL: &'static str = "Reviewer Comment";
    const CREATE_COMMAND: &'static str =
        "deskflow memos create --title \"...\" --department \"...\"";

    fn headline(item: &WorkflowItem<Self>) -> String {
        let payload = item.payload();
        format!("{} ({})", payload.title, payload.department)
    }

    fn fields(item: &WorkflowItem<Self>) -> Vec<(&'static str, String)> {
        let payload = item.payload();
        let mut fields = vec![
            ("Title", payload.title.clone()),
            ("Department", payload.department.clone()),
        ];
        if !payload.body.is_empty() {
            fields.push(("Body", payload.body.clone()));
        }
        if let Some(gate) = item.current_reviewer() {
            fields.push(("Waiting on", gate.to_string()));
        }
        fields
    }
}

/// One list row: id, badge, headline, author and date.
pub fn row<W>(item: &WorkflowItem<W>) -> String
where
    W: Describe,
    W::Status: Badged,
{
    format!(
        "#{:<6} {:<22} {}  · {} · {}",
        item.id(),
        badge::render(item.status()).to_string(),
        W::headline(item),
        item.created_by(),
        item.created_at().format("%Y-%m-%d %H:%M")
    )
}

/// Detail pane for `item` as seen by `actor`.
///
/// Review actions are only listed when the actor can take one; terminal and
/// unrecognized statuses never show them.
pub fn detail<W>(item: &WorkflowItem<W>, actor: &AuthContext) -> Vec<String>
where
    W: Describe,
    W::Status: Badged,
{
    let mut lines = vec![format!(
        "{} #{} {}",
        W::NOUN,
        item.id(),
        badge::render(item.status())
    )];
    if let ItemStatus::Unrecognized(raw) = item.status() {
        lines.push(format!("Status: {raw}"));
    }
    for (label, value) in W::fields(item) {
        lines.push(format!("{label}: {value}"));
    }
    lines.push(format!(
        "Created: {} by {}",
        item.created_at().format("%Y-%m-%d %H:%M"),
        item.created_by()
    ));

    if let Some(comment) = W::comment(item) {
        lines.push(format!("{}: {}", W::COMMENT_LABEL, comment));
    }

    for entry in item.review_history() {
        lines.push(format!(
            "  {} {} by {} → {}",
            entry.at.format("%Y-%m-%d %H:%M"),
            entry.decision,
            entry.actor,
            entry.resulting_status
        ));
    }

    let decisions = item.available_decisions(actor);
    if !decisions.is_empty() {
        let names: Vec<&str> = decisions.iter().map(|d| d.as_str()).collect();
        lines.push(format!("Actions: {}", names.join(", ")));
    }
    lines
}
