// In-memory backend for screen tests - enforces the transition table the
// way the real server does and records every call.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::api::{ApiError, TransitionRequest};
use crate::auth::AuthContext;
use crate::services::{StatusFilter, WorkflowBackend};
use crate::workflow::{ItemId, Workflow, WorkflowItem};

#[derive(Debug, Clone, PartialEq)]
pub enum StubCall {
    List(String),
    Pending(String),
    Create,
    Transition { id: String, request: TransitionRequest },
    Delete(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Failure<S> {
    List,
    Queue(S),
    Create,
    Transition,
    Delete,
}

pub struct StubBackend<W: Workflow> {
    items: Mutex<Vec<WorkflowItem<W>>>,
    actor: AuthContext,
    calls: Mutex<Vec<StubCall>>,
    failures: Mutex<Vec<Failure<W::Status>>>,
    next_id: AtomicU64,
}

pub fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, minute, 0).unwrap()
}

impl<W: Workflow> StubBackend<W> {
    /// `actor` is who the server believes is calling.
    pub fn new(actor: AuthContext) -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            actor,
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(100),
        }
    }

    pub fn with_items(self, items: Vec<WorkflowItem<W>>) -> Self {
        *self.items.lock().unwrap() = items;
        self
    }

    pub fn fail(&self, failure: Failure<W::Status>) {
        self.failures.lock().unwrap().push(failure);
    }

    pub fn heal(&self) {
        self.failures.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<StubCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn stored(&self, id: &str) -> Option<WorkflowItem<W>> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|item| item.id().as_str() == id)
            .cloned()
    }

    fn record(&self, call: StubCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn failing(&self, failure: Failure<W::Status>) -> Result<(), ApiError> {
        if self.failures.lock().unwrap().contains(&failure) {
            return Err(ApiError::Status {
                status: 503,
                message: "stub outage".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<W: Workflow> WorkflowBackend<W> for StubBackend<W> {
    async fn list(&self, filter: StatusFilter<W::Status>) -> Result<Vec<WorkflowItem<W>>, ApiError> {
        self.record(StubCall::List(filter.to_string()));
        self.failing(Failure::List)?;
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|item| filter.matches(item.status()))
            .cloned()
            .collect())
    }

    async fn pending(&self, queue: W::Status) -> Result<Vec<WorkflowItem<W>>, ApiError> {
        self.record(StubCall::Pending(queue.to_string()));
        self.failing(Failure::Queue(queue))?;
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|item| item.status().known() == Some(queue))
            .cloned()
            .collect())
    }

    async fn create(&self, payload: W::Payload) -> Result<WorkflowItem<W>, ApiError> {
        self.record(StubCall::Create);
        self.failing(Failure::Create)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let item = WorkflowItem::new(
            ItemId::new(id.to_string()),
            payload,
            self.actor.actor().clone(),
            at(30),
        );
        self.items.lock().unwrap().push(item.clone());
        Ok(item)
    }

    async fn transition(
        &self,
        id: &ItemId,
        request: TransitionRequest,
    ) -> Result<WorkflowItem<W>, ApiError> {
        self.record(StubCall::Transition {
            id: id.to_string(),
            request: request.clone(),
        });
        self.failing(Failure::Transition)?;

        let mut items = self.items.lock().unwrap();
        let item = items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or_else(|| ApiError::NotFound {
                resource: format!("{} {}", W::NOUN, id),
            })?;

        if let (Some(expected), Some(current)) = (request.expected_version, item.version()) {
            if expected != current {
                return Err(ApiError::Conflict {
                    message: format!("expected version {expected}, found {current}"),
                });
            }
        }

        item.apply(request.decision, &self.actor, request.comment, at(45))
            .map_err(|e| ApiError::Status {
                status: 422,
                message: e.to_string(),
            })?;
        Ok(item.clone())
    }

    async fn delete(&self, id: &ItemId) -> Result<(), ApiError> {
        self.record(StubCall::Delete(id.to_string()));
        self.failing(Failure::Delete)?;
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|item| item.id() != id);
        if items.len() == before {
            return Err(ApiError::NotFound {
                resource: format!("{} {}", W::NOUN, id),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ActorRef, Role};
    use crate::workflow::{
        ContactSuggestions, Decision, ItemParts, ItemStatus, MemoPayload, MemoRouting, MemoStatus,
        SuggestionPayload, SuggestionStatus,
    };

    fn admin() -> AuthContext {
        AuthContext::new(ActorRef::new("admin-1"), Role::Admin)
    }

    fn suggestion(id: &str) -> WorkflowItem<ContactSuggestions> {
        WorkflowItem::new(
            ItemId::new(id),
            SuggestionPayload::new("c-9", "Ama Owusu", "moved office").with_change("room", "B12"),
            ActorRef::new("staff-2"),
            at(5),
        )
    }

    #[tokio::test]
    async fn test_second_decision_after_approval_is_refused() {
        let stub = StubBackend::new(admin()).with_items(vec![suggestion("7")]);
        let id = ItemId::new("7");

        let approved = stub
            .transition(&id, TransitionRequest::new(Decision::Approve))
            .await
            .unwrap();
        assert_eq!(approved.status(), &ItemStatus::Known(SuggestionStatus::Approved));
        let settled = stub.stored("7").unwrap();

        let again = stub
            .transition(
                &id,
                TransitionRequest::new(Decision::Reject).with_comment(Some("changed my mind".into())),
            )
            .await;
        assert!(matches!(again, Err(ApiError::Status { status: 422, .. })));
        assert_eq!(stub.stored("7").unwrap(), settled);
        assert_eq!(settled.review_history().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_memo_accepts_no_decision() {
        let leo = AuthContext::new(ActorRef::new("leo-1"), Role::Leo);
        let memo = WorkflowItem::<MemoRouting>::from_parts(ItemParts {
            id: ItemId::new("31"),
            status: ItemStatus::Known(MemoStatus::Rejected),
            payload: MemoPayload {
                title: "Vehicle pool".into(),
                department: "Logistics".into(),
                body: String::new(),
            },
            created_at: at(0),
            created_by: ActorRef::new("staff-2"),
            review_history: Vec::new(),
            version: Some(3),
        });
        let stub = StubBackend::new(leo).with_items(vec![memo.clone()]);

        for decision in [Decision::Submit, Decision::Approve, Decision::Reject] {
            let result = stub
                .transition(&ItemId::new("31"), TransitionRequest::new(decision))
                .await;
            assert!(
                matches!(result, Err(ApiError::Status { status: 422, .. })),
                "{decision} was accepted"
            );
        }
        assert_eq!(stub.stored("31"), Some(memo));
    }
}
