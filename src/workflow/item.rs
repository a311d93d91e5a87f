use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::fmt;

use crate::auth::{ActorRef, AuthContext};
use crate::workflow::status::{Decision, ItemStatus, WorkflowStatus};
use crate::workflow::transition::{authorize, Gate, TransitionError};

/// Describes one workflow instance: its status set and what it carries.
pub trait Workflow: fmt::Debug + Clone + Copy + PartialEq + Send + Sync + 'static {
    type Status: WorkflowStatus;
    type Payload: fmt::Debug + Clone + PartialEq + Send + Sync + 'static;

    /// Singular noun used in messages ("suggestion", "memo").
    const NOUN: &'static str;

    /// Statuses with a dedicated reviewer queue, in display order.
    const QUEUES: &'static [Self::Status];
}

/// Opaque item identifier.
///
/// Numeric ids order numerically (`9` before `10`) and sort ahead of
/// non-numeric ids, which order lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for ItemId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.parse::<u64>(), other.0.parse::<u64>()) {
            (Ok(a), Ok(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for ItemId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        ItemId::new(id)
    }
}

/// One entry of an item's append-only review history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEntry {
    pub actor: ActorRef,
    pub decision: Decision,
    pub comment: Option<String>,
    pub at: DateTime<Utc>,
    /// Status the item moved into, as the backend spelled it.
    pub resulting_status: String,
}

/// Everything needed to rebuild an item that already exists on the backend.
#[derive(Debug, Clone)]
pub struct ItemParts<W: Workflow> {
    pub id: ItemId,
    pub status: ItemStatus<W::Status>,
    pub payload: W::Payload,
    pub created_at: DateTime<Utc>,
    pub created_by: ActorRef,
    pub review_history: Vec<ReviewEntry>,
    pub version: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowItem<W: Workflow> {
    id: ItemId,
    status: ItemStatus<W::Status>,
    payload: W::Payload,
    created_at: DateTime<Utc>,
    created_by: ActorRef,
    review_history: Vec<ReviewEntry>,
    version: Option<u64>,
}

impl<W: Workflow> WorkflowItem<W> {
    /// A freshly created item in the workflow's initial status.
    pub fn new(
        id: ItemId,
        payload: W::Payload,
        created_by: ActorRef,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            status: ItemStatus::Known(W::Status::initial()),
            payload,
            created_at,
            created_by,
            review_history: Vec::new(),
            version: Some(1),
        }
    }

    pub fn from_parts(parts: ItemParts<W>) -> Self {
        Self {
            id: parts.id,
            status: parts.status,
            payload: parts.payload,
            created_at: parts.created_at,
            created_by: parts.created_by,
            review_history: parts.review_history,
            version: parts.version,
        }
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn status(&self) -> &ItemStatus<W::Status> {
        &self.status
    }

    pub fn payload(&self) -> &W::Payload {
        &self.payload
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn created_by(&self) -> &ActorRef {
        &self.created_by
    }

    pub fn review_history(&self) -> &[ReviewEntry] {
        &self.review_history
    }

    pub fn version(&self) -> Option<u64> {
        self.version
    }

    pub fn current_reviewer(&self) -> Option<Gate> {
        self.status.known().and_then(|status| status.current_reviewer())
    }

    /// Most recent reviewer comment, if any.
    pub fn latest_comment(&self) -> Option<&str> {
        self.review_history
            .iter()
            .rev()
            .find_map(|entry| entry.comment.as_deref())
    }

    /// Decisions `actor` may take right now. Empty for terminal or
    /// unrecognized statuses and for actors outside the current gate.
    pub fn available_decisions(&self, actor: &AuthContext) -> Vec<Decision> {
        let Some(status) = self.status.known() else {
            return Vec::new();
        };
        status
            .decisions()
            .into_iter()
            .filter(|decision| authorize(status, *decision, actor, &self.created_by).is_ok())
            .collect()
    }

    /// Apply a decision locally, appending exactly one history entry.
    ///
    /// Used where the client is the source of truth for a transition, e.g.
    /// test backends. Screens replace items with the backend's copy instead.
    pub fn apply(
        &mut self,
        decision: Decision,
        actor: &AuthContext,
        comment: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<W::Status, TransitionError> {
        let from = self
            .status
            .known()
            .ok_or_else(|| TransitionError::UnrecognizedStatus {
                status: self.status.as_str().to_string(),
            })?;
        let rule = authorize(from, decision, actor, &self.created_by)?;

        self.status = ItemStatus::Known(rule.to);
        self.review_history.push(ReviewEntry {
            actor: actor.actor().clone(),
            decision,
            comment: comment
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            at,
            resulting_status: rule.to.as_str().to_string(),
        });
        if let Some(version) = self.version.as_mut() {
            *version += 1;
        }

        Ok(rule.to)
    }
}

/// Newest first, ties broken by id so re-fetching never reorders equal rows.
pub fn sort_newest_first<W: Workflow>(items: &mut [WorkflowItem<W>]) {
    items.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
