//! Wire shapes returned by the dashboard backend.
//!
//! The backend is loosely typed: ids arrive as strings or numbers, actors
//! as bare ids or objects, and names as either `name` or
//! `first_name`/`last_name`. Everything is normalized here, once, into the
//! canonical workflow types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::api::ApiError;
use crate::auth::ActorRef;
use crate::workflow::{
    Decision, ItemId, ItemParts, ItemStatus, MemoPayload, ReviewEntry, SuggestionPayload,
    Workflow, WorkflowItem,
};

/// Identifier that may be encoded as a JSON string or number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Text(text) => text,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn join_name(
    name: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
) -> Option<String> {
    if let Some(name) = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
        return Some(name);
    }
    let joined = [first_name, last_name]
        .into_iter()
        .flatten()
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!joined.is_empty()).then_some(joined)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireActor {
    Id(RawId),
    Detailed {
        id: RawId,
        #[serde(default, alias = "username")]
        name: Option<String>,
        #[serde(default)]
        first_name: Option<String>,
        #[serde(default)]
        last_name: Option<String>,
    },
}

impl From<WireActor> for ActorRef {
    fn from(actor: WireActor) -> Self {
        match actor {
            WireActor::Id(id) => ActorRef::new(String::from(id)),
            WireActor::Detailed {
                id,
                name,
                first_name,
                last_name,
            } => {
                let actor = ActorRef::new(String::from(id));
                match join_name(name, first_name, last_name) {
                    Some(display) => actor.with_display_name(display),
                    None => actor,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireReview {
    #[serde(alias = "reviewer", alias = "reviewed_by")]
    pub actor: WireActor,
    pub decision: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(alias = "timestamp", alias = "reviewed_at", alias = "created_at")]
    pub at: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Common envelope of every workflow item.
#[derive(Debug, Clone, Deserialize)]
pub struct WireItem<P> {
    pub id: RawId,
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[serde(alias = "submitted_by", alias = "author")]
    pub created_by: WireActor,
    #[serde(default, alias = "reviews", alias = "history")]
    pub review_history: Vec<WireReview>,
    #[serde(default)]
    pub version: Option<u64>,
    #[serde(flatten)]
    pub payload: P,
}

/// List responses are either a bare array or one page of a paged result.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Bare(Vec<T>),
    Page {
        #[serde(alias = "results", alias = "data")]
        items: Vec<T>,
        /// Link to the following page, absolute or relative to the API base.
        #[serde(default)]
        next: Option<String>,
        #[serde(default, alias = "total")]
        count: Option<u64>,
    },
}

impl<T> ListEnvelope<T> {
    /// Items on this page and the link to the next one, if any.
    pub fn into_parts(self) -> (Vec<T>, Option<String>) {
        match self {
            ListEnvelope::Bare(items) => (items, None),
            ListEnvelope::Page { items, next, .. } => {
                (items, next.filter(|link| !link.trim().is_empty()))
            }
        }
    }

    /// Total across all pages, when the backend reports it.
    pub fn total(&self) -> Option<u64> {
        match self {
            ListEnvelope::Bare(_) => None,
            ListEnvelope::Page { count, .. } => *count,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireContact {
    pub id: RawId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireSuggestion {
    #[serde(default)]
    pub contact_id: Option<RawId>,
    #[serde(default)]
    pub contact: Option<WireContact>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub reason: String,
    #[serde(default, alias = "proposed_changes")]
    pub changes: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub admin_comment: Option<String>,
}

impl TryFrom<WireSuggestion> for SuggestionPayload {
    type Error = ApiError;

    fn try_from(wire: WireSuggestion) -> Result<Self, Self::Error> {
        let (contact_id, nested_name) = match (wire.contact, wire.contact_id) {
            (Some(contact), _) => (
                String::from(contact.id),
                join_name(contact.name, contact.first_name, contact.last_name),
            ),
            (None, Some(id)) => (String::from(id), None),
            (None, None) => {
                return Err(ApiError::Decode(
                    "suggestion does not reference a contact".to_string(),
                ))
            }
        };

        let changes = wire
            .changes
            .into_iter()
            .map(|(field, value)| {
                let value = match value {
                    serde_json::Value::String(text) => text,
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                };
                (field, value)
            })
            .collect();

        Ok(SuggestionPayload {
            contact_id,
            contact_name: nested_name
                .or_else(|| join_name(wire.contact_name, None, None))
                .unwrap_or_default(),
            reason: wire.reason,
            changes,
            admin_comment: wire
                .admin_comment
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireMemo {
    pub title: String,
    #[serde(default)]
    pub department: Option<WireDepartment>,
    #[serde(default, alias = "content")]
    pub body: String,
}

/// Departments come back either as a plain name or as `{id, name}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireDepartment {
    Name(String),
    Object { name: String },
}

impl TryFrom<WireMemo> for MemoPayload {
    type Error = ApiError;

    fn try_from(wire: WireMemo) -> Result<Self, Self::Error> {
        if wire.title.trim().is_empty() {
            return Err(ApiError::Decode("memo without a title".to_string()));
        }
        Ok(MemoPayload {
            title: wire.title,
            department: match wire.department {
                Some(WireDepartment::Name(name)) | Some(WireDepartment::Object { name }) => name,
                None => String::new(),
            },
            body: wire.body,
        })
    }
}

/// Body of a transition call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRequest {
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
}

impl TransitionRequest {
    pub fn new(decision: Decision) -> Self {
        Self {
            decision,
            comment: None,
            expected_version: None,
        }
    }

    /// Blank comments are dropped rather than sent as empty strings.
    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        self
    }

    pub fn with_expected_version(mut self, version: Option<u64>) -> Self {
        self.expected_version = version;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSuggestionBody<'a> {
    pub contact_id: &'a str,
    pub reason: &'a str,
    pub changes: &'a BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateMemoBody<'a> {
    pub title: &'a str,
    pub department: &'a str,
    pub body: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnreadCount {
    #[serde(alias = "unread", alias = "unread_count")]
    pub count: u64,
}

/// Convert a wire item into the canonical item, validating the payload.
pub fn decode_item<W, P>(wire: WireItem<P>) -> Result<WorkflowItem<W>, ApiError>
where
    W: Workflow,
    P: TryInto<W::Payload, Error = ApiError>,
{
    let id = String::from(wire.id);
    let review_history = wire
        .review_history
        .into_iter()
        .map(|review| {
            let decision = Decision::parse(&review.decision).ok_or_else(|| {
                ApiError::Decode(format!(
                    "{} {} has unknown decision '{}' in its history",
                    W::NOUN,
                    id,
                    review.decision
                ))
            })?;
            Ok(ReviewEntry {
                actor: review.actor.into(),
                decision,
                comment: review
                    .comment
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty()),
                at: review.at,
                resulting_status: review.status.unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    Ok(WorkflowItem::from_parts(ItemParts {
        id: ItemId::new(id),
        status: ItemStatus::parse(&wire.status),
        payload: wire.payload.try_into()?,
        created_at: wire.created_at,
        created_by: wire.created_by.into(),
        review_history,
        version: wire.version,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{ContactSuggestions, MemoRouting, MemoStatus, SuggestionStatus};
    use serde_json::json;

    #[test]
    fn test_suggestion_with_split_name_and_numeric_ids() {
        let wire: WireItem<WireSuggestion> = serde_json::from_value(json!({
            "id": 17,
            "status": "PENDING",
            "created_at": "2026-03-02T09:00:00Z",
            "submitted_by": {"id": 5, "first_name": "Ama", "last_name": "Boateng"},
            "contact": {"id": "c-88", "first_name": "Kofi", "last_name": "Mensah"},
            "reason": "new office number",
            "changes": {"phone": "+233 20 000 0000", "floor": 3}
        }))
        .unwrap();

        let item: WorkflowItem<ContactSuggestions> = decode_item(wire).unwrap();
        assert_eq!(item.id().as_str(), "17");
        assert_eq!(item.status(), &ItemStatus::Known(SuggestionStatus::Pending));
        assert_eq!(item.created_by().id, "5");
        assert_eq!(item.created_by().label(), "Ama Boateng");
        assert_eq!(item.payload().contact_id, "c-88");
        assert_eq!(item.payload().contact_name, "Kofi Mensah");
        assert_eq!(item.payload().changes["floor"], "3");
        assert!(item.review_history().is_empty());
    }

    #[test]
    fn test_suggestion_with_flat_contact_fields() {
        let wire: WireItem<WireSuggestion> = serde_json::from_value(json!({
            "id": "s-2",
            "status": "REJECTED",
            "created_at": "2026-03-02T09:00:00Z",
            "created_by": "u-1",
            "contact_id": 12,
            "contact_name": "Efua Asante",
            "reason": "typo",
            "admin_comment": "duplicate entry",
            "reviews": [{
                "reviewer": {"id": "u-admin", "name": "Office Admin"},
                "decision": "REJECT",
                "comment": "duplicate entry",
                "timestamp": "2026-03-02T10:00:00Z",
                "status": "REJECTED"
            }]
        }))
        .unwrap();

        let item: WorkflowItem<ContactSuggestions> = decode_item(wire).unwrap();
        assert_eq!(item.payload().contact_id, "12");
        assert_eq!(item.payload().contact_name, "Efua Asante");
        assert_eq!(item.payload().admin_comment.as_deref(), Some("duplicate entry"));
        assert_eq!(item.review_history()[0].decision, Decision::Reject);
        assert_eq!(item.review_history()[0].actor.label(), "Office Admin");
    }

    #[test]
    fn test_suggestion_without_contact_is_rejected_at_boundary() {
        let wire: WireItem<WireSuggestion> = serde_json::from_value(json!({
            "id": 1,
            "status": "PENDING",
            "created_at": "2026-03-02T09:00:00Z",
            "created_by": 3,
            "reason": "?"
        }))
        .unwrap();

        let result: Result<WorkflowItem<ContactSuggestions>, _> = decode_item(wire);
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_memo_with_department_object_and_unknown_status() {
        let wire: WireItem<WireMemo> = serde_json::from_value(json!({
            "id": 9,
            "status": "ARCHIVED",
            "created_at": "2026-03-02T09:00:00Z",
            "author": 4,
            "title": "Fuel allowance",
            "department": {"id": 2, "name": "Finance"},
            "content": "Please review.",
            "version": 6
        }))
        .unwrap();

        let item: WorkflowItem<MemoRouting> = decode_item(wire).unwrap();
        assert_eq!(item.payload().department, "Finance");
        assert_eq!(item.payload().body, "Please review.");
        assert_eq!(item.version(), Some(6));
        assert_eq!(
            item.status(),
            &ItemStatus::<MemoStatus>::Unrecognized("ARCHIVED".to_string())
        );
    }

    #[test]
    fn test_page_envelope_keeps_next_link() {
        let page: ListEnvelope<u32> = serde_json::from_value(json!({
            "count": 3,
            "next": "/api/memos?page=2",
            "results": [1, 2]
        }))
        .unwrap();
        assert_eq!(page.total(), Some(3));
        assert_eq!(
            page.into_parts(),
            (vec![1, 2], Some("/api/memos?page=2".to_string()))
        );

        let last: ListEnvelope<u32> =
            serde_json::from_value(json!({"data": [4], "next": null})).unwrap();
        assert_eq!(last.into_parts(), (vec![4], None));

        let bare: ListEnvelope<u32> = serde_json::from_value(json!([3])).unwrap();
        assert_eq!(bare.total(), None);
        assert_eq!(bare.into_parts(), (vec![3], None));
    }

    #[test]
    fn test_transition_request_omits_blank_fields() {
        let request = TransitionRequest::new(Decision::Reject).with_comment(Some("   ".into()));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"decision": "reject"})
        );

        let request = TransitionRequest::new(Decision::Approve)
            .with_comment(Some(" fine ".into()))
            .with_expected_version(Some(3));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"decision": "approve", "comment": "fine", "expected_version": 3})
        );
    }
}
