use statig::prelude::*;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiError, TransitionRequest};
use crate::auth::AuthContext;
use crate::screens::list::ListView;
use crate::services::WorkflowBackend;
use crate::workflow::{
    authorize, Decision, ItemId, TransitionError, Workflow, WorkflowItem, WorkflowStatus,
};

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("No review dialog is open")]
    NotOpen,
    #[error("A decision is already being submitted")]
    AlreadySubmitting,
    #[error(transparent)]
    Refused(#[from] TransitionError),
    #[error(transparent)]
    Backend(#[from] ApiError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewEvent {
    Open { item: ItemId },
    Submit,
    Succeeded,
    Failed { message: String },
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewPhase {
    #[default]
    Closed,
    Open,
    /// A decision is in flight; the submit control is disabled.
    Submitting,
}

/// Review dialog: closed, open, or waiting on the backend.
#[derive(Debug, Default)]
pub struct ReviewDialog {
    phase: ReviewPhase,
    item: Option<ItemId>,
    error: Option<String>,
}

#[state_machine(initial = "State::closed()")]
impl ReviewDialog {
    #[state]
    fn closed(&mut self, event: &ReviewEvent) -> Outcome<State> {
        match event {
            ReviewEvent::Open { item } => {
                self.item = Some(item.clone());
                self.error = None;
                self.phase = ReviewPhase::Open;
                tracing::debug!(item = %item, "Review dialog opened");
                Transition(State::open())
            }
            _ => Handled,
        }
    }

    #[state]
    fn open(&mut self, event: &ReviewEvent) -> Outcome<State> {
        match event {
            ReviewEvent::Submit => {
                self.error = None;
                self.phase = ReviewPhase::Submitting;
                Transition(State::submitting())
            }
            ReviewEvent::Open { item } => {
                self.item = Some(item.clone());
                self.error = None;
                Handled
            }
            ReviewEvent::Close => {
                self.reset();
                Transition(State::closed())
            }
            _ => Handled,
        }
    }

    #[state]
    fn submitting(&mut self, event: &ReviewEvent) -> Outcome<State> {
        match event {
            ReviewEvent::Succeeded => {
                tracing::info!(item = ?self.item, "Decision recorded, closing dialog");
                self.reset();
                Transition(State::closed())
            }
            ReviewEvent::Failed { message } => {
                tracing::warn!(item = ?self.item, error = %message, "Decision failed, dialog stays open");
                self.error = Some(message.clone());
                self.phase = ReviewPhase::Open;
                Transition(State::open())
            }
            // Submit and Close are ignored while the request is in flight.
            _ => Handled,
        }
    }
}

impl ReviewDialog {
    fn reset(&mut self) {
        self.phase = ReviewPhase::Closed;
        self.item = None;
        self.error = None;
    }

    pub fn phase(&self) -> ReviewPhase {
        self.phase
    }

    pub fn item(&self) -> Option<&ItemId> {
        self.item.as_ref()
    }

    /// Message from the last failed submit, shown inside the dialog.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Drives review decisions for one actor.
///
/// Nothing changes locally until the backend answers: on success the
/// backend's copy replaces the list entry and the dialog closes, on failure
/// the list is untouched and the dialog keeps the error for a retry.
pub struct ReviewSession<W: Workflow> {
    backend: Arc<dyn WorkflowBackend<W>>,
    actor: AuthContext,
    dialog: StateMachine<ReviewDialog>,
    target: Option<WorkflowItem<W>>,
}

impl<W: Workflow> ReviewSession<W> {
    pub fn new(backend: Arc<dyn WorkflowBackend<W>>, actor: AuthContext) -> Self {
        Self {
            backend,
            actor,
            dialog: ReviewDialog::default().state_machine(),
            target: None,
        }
    }

    pub fn dialog(&self) -> &ReviewDialog {
        self.dialog.inner()
    }

    pub fn phase(&self) -> ReviewPhase {
        self.dialog().phase()
    }

    pub fn target(&self) -> Option<&WorkflowItem<W>> {
        self.target.as_ref()
    }

    /// Decisions the actor may take on `item`. Empty means no review
    /// controls are rendered.
    pub fn controls(&self, item: &WorkflowItem<W>) -> Vec<Decision> {
        item.available_decisions(&self.actor)
    }

    /// Open the dialog for `item`, refusing items the actor cannot act on.
    pub fn open(&mut self, item: &WorkflowItem<W>) -> Result<Vec<Decision>, ReviewError> {
        if self.phase() == ReviewPhase::Submitting {
            return Err(ReviewError::AlreadySubmitting);
        }
        self.check_actionable(item)?;

        self.dialog.handle(&ReviewEvent::Open {
            item: item.id().clone(),
        });
        self.target = Some(item.clone());
        Ok(self.controls(item))
    }

    pub fn close(&mut self) {
        if self.phase() == ReviewPhase::Submitting {
            debug!("Ignoring close while a decision is in flight");
            return;
        }
        self.dialog.handle(&ReviewEvent::Close);
        self.target = None;
    }

    /// Validate locally and move the dialog into the submitting phase.
    ///
    /// Returns the request to send. A second call before `finish` fails
    /// with `AlreadySubmitting` and sends nothing.
    pub fn start(
        &mut self,
        decision: Decision,
        comment: Option<String>,
    ) -> Result<TransitionRequest, ReviewError> {
        match self.phase() {
            ReviewPhase::Closed => return Err(ReviewError::NotOpen),
            ReviewPhase::Submitting => {
                debug!(decision = %decision, "Duplicate submit ignored");
                return Err(ReviewError::AlreadySubmitting);
            }
            ReviewPhase::Open => {}
        }
        let target = self.target.as_ref().ok_or(ReviewError::NotOpen)?;

        let status = target
            .status()
            .known()
            .ok_or_else(|| TransitionError::UnrecognizedStatus {
                status: target.status().as_str().to_string(),
            })?;
        authorize(status, decision, &self.actor, target.created_by())?;

        let request = TransitionRequest::new(decision)
            .with_comment(comment)
            .with_expected_version(target.version());
        self.dialog.handle(&ReviewEvent::Submit);
        Ok(request)
    }

    /// Apply the backend's answer to a started submit.
    pub fn finish(
        &mut self,
        outcome: Result<WorkflowItem<W>, ApiError>,
        list: &mut ListView<W>,
    ) -> Result<WorkflowItem<W>, ReviewError> {
        if self.phase() != ReviewPhase::Submitting {
            return Err(ReviewError::NotOpen);
        }
        match outcome {
            Ok(updated) => {
                info!(
                    workflow = W::NOUN,
                    id = %updated.id(),
                    status = %updated.status(),
                    "Transition accepted"
                );
                list.replace(updated.clone());
                self.dialog.handle(&ReviewEvent::Succeeded);
                self.target = None;
                Ok(updated)
            }
            Err(e) => {
                warn!(workflow = W::NOUN, error = %e, "Transition rejected by backend");
                self.dialog.handle(&ReviewEvent::Failed {
                    message: e.to_string(),
                });
                Err(ReviewError::Backend(e))
            }
        }
    }

    /// `start`, send, `finish`.
    pub async fn submit(
        &mut self,
        list: &mut ListView<W>,
        decision: Decision,
        comment: Option<String>,
    ) -> Result<WorkflowItem<W>, ReviewError> {
        let request = self.start(decision, comment)?;
        let id = self
            .target
            .as_ref()
            .map(|item| item.id().clone())
            .ok_or(ReviewError::NotOpen)?;
        let outcome = self.backend.transition(&id, request).await;
        self.finish(outcome, list)
    }

    fn check_actionable(&self, item: &WorkflowItem<W>) -> Result<(), TransitionError> {
        let status = item
            .status()
            .known()
            .ok_or_else(|| TransitionError::UnrecognizedStatus {
                status: item.status().as_str().to_string(),
            })?;
        // Every decision out of a status shares one gate, so checking the
        // first is enough.
        let Some(decision) = status.decisions().first().copied() else {
            return Err(TransitionError::Terminal {
                status: status.as_str().to_string(),
            });
        };
        authorize(status, decision, &self.actor, item.created_by())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ActorRef, Role};
    use crate::services::stub::{at, Failure, StubBackend, StubCall};
    use crate::workflow::{
        ContactSuggestions, ItemParts, ItemStatus, MemoPayload, MemoRouting, MemoStatus,
        SuggestionPayload, SuggestionStatus,
    };

    fn admin() -> AuthContext {
        AuthContext::new(ActorRef::new("admin-1"), Role::Admin)
    }

    fn pending_suggestion(id: &str) -> WorkflowItem<ContactSuggestions> {
        WorkflowItem::new(
            ItemId::new(id),
            SuggestionPayload::new("c-3", "Yaw Boateng", "new extension").with_change("phone", "2231"),
            ActorRef::new("staff-4"),
            at(1),
        )
    }

    async fn loaded<W: Workflow>(stub: &Arc<StubBackend<W>>) -> ListView<W> {
        let mut list = ListView::new(stub.clone());
        list.refresh().await;
        list
    }

    fn transition_calls<W: Workflow>(stub: &StubBackend<W>) -> Vec<TransitionRequest> {
        stub.calls()
            .into_iter()
            .filter_map(|call| match call {
                StubCall::Transition { request, .. } => Some(request),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_admin_rejects_with_comment() {
        let stub = Arc::new(StubBackend::new(admin()).with_items(vec![pending_suggestion("12")]));
        let mut list = loaded(&stub).await;
        let mut session = ReviewSession::new(stub.clone(), admin());

        let item = list.find(&ItemId::new("12")).cloned().unwrap();
        assert_eq!(
            session.open(&item).unwrap(),
            vec![Decision::Approve, Decision::Reject]
        );

        let updated = session
            .submit(&mut list, Decision::Reject, Some("duplicate entry".into()))
            .await
            .unwrap();

        let sent = transition_calls(&stub);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].decision, Decision::Reject);
        assert_eq!(sent[0].comment.as_deref(), Some("duplicate entry"));
        assert_eq!(sent[0].expected_version, Some(1));

        assert_eq!(session.phase(), ReviewPhase::Closed);
        assert_eq!(updated.status(), &ItemStatus::Known(SuggestionStatus::Rejected));
        let shown = list.find(&ItemId::new("12")).unwrap();
        assert_eq!(shown.status().as_str(), "REJECTED");
        assert_eq!(shown.latest_comment(), Some("duplicate entry"));
    }

    #[tokio::test]
    async fn test_failed_transition_leaves_list_untouched() {
        let stub = Arc::new(StubBackend::new(admin()).with_items(vec![pending_suggestion("12")]));
        let mut list = loaded(&stub).await;
        let before = list.state().clone();
        let mut session = ReviewSession::new(stub.clone(), admin());

        stub.fail(Failure::Transition);
        let item = list.find(&ItemId::new("12")).cloned().unwrap();
        session.open(&item).unwrap();
        let err = session
            .submit(&mut list, Decision::Approve, None)
            .await
            .unwrap_err();

        assert!(matches!(err, ReviewError::Backend(ApiError::Status { status: 503, .. })));
        assert_eq!(list.state(), &before);
        assert_eq!(session.phase(), ReviewPhase::Open);
        assert!(session.dialog().error().unwrap().contains("stub outage"));

        // retry from the still-open dialog
        stub.heal();
        session.submit(&mut list, Decision::Approve, None).await.unwrap();
        assert_eq!(session.phase(), ReviewPhase::Closed);
        assert!(session.dialog().error().is_none());
    }

    #[tokio::test]
    async fn test_double_submit_sends_one_request() {
        let stub = Arc::new(StubBackend::new(admin()).with_items(vec![pending_suggestion("12")]));
        let mut list = loaded(&stub).await;
        let mut session = ReviewSession::new(stub.clone(), admin());
        session.open(&pending_suggestion("12")).unwrap();

        let request = session.start(Decision::Approve, None).unwrap();
        assert_eq!(session.phase(), ReviewPhase::Submitting);

        let second = session.submit(&mut list, Decision::Approve, None).await;
        assert!(matches!(second, Err(ReviewError::AlreadySubmitting)));
        session.close();
        assert_eq!(session.phase(), ReviewPhase::Submitting);

        let outcome = stub.transition(&ItemId::new("12"), request).await;
        session.finish(outcome, &mut list).unwrap();
        assert_eq!(transition_calls(&stub).len(), 1);
    }

    #[tokio::test]
    async fn test_terminal_items_get_no_controls_for_any_role() {
        let mut rejected = pending_suggestion("12");
        rejected.apply(Decision::Reject, &admin(), None, at(2)).unwrap();
        let stub = Arc::new(StubBackend::new(admin()).with_items(vec![rejected.clone()]));

        for role in [Role::Staff, Role::Admin, Role::DeskHead, Role::Leo] {
            let actor = AuthContext::new(ActorRef::new("staff-4"), role);
            let mut session = ReviewSession::new(stub.clone(), actor);
            assert!(session.controls(&rejected).is_empty());
            assert!(matches!(
                session.open(&rejected),
                Err(ReviewError::Refused(TransitionError::Terminal { .. }))
            ));
            assert!(matches!(
                session.start(Decision::Approve, None),
                Err(ReviewError::NotOpen)
            ));
        }
        assert!(transition_calls(&stub).is_empty());
    }

    #[tokio::test]
    async fn test_wrong_reviewer_is_refused_locally() {
        let author = AuthContext::new(ActorRef::new("staff-1"), Role::Staff);
        let mut memo = WorkflowItem::<MemoRouting>::new(
            ItemId::new("30"),
            MemoPayload {
                title: "Vehicle pool".into(),
                department: "Transport".into(),
                body: String::new(),
            },
            ActorRef::new("staff-1"),
            at(1),
        );
        memo.apply(Decision::Submit, &author, None, at(2)).unwrap();
        assert_eq!(memo.status(), &ItemStatus::Known(MemoStatus::PendingDeskHead));

        let leo = AuthContext::new(ActorRef::new("leo-1"), Role::Leo);
        let stub = Arc::new(StubBackend::new(leo.clone()).with_items(vec![memo.clone()]));
        let mut session = ReviewSession::new(stub.clone(), leo);

        assert!(matches!(
            session.open(&memo),
            Err(ReviewError::Refused(TransitionError::WrongReviewer { .. }))
        ));
        assert_eq!(session.phase(), ReviewPhase::Closed);
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unrecognized_status_is_never_reviewable() {
        let odd = WorkflowItem::<ContactSuggestions>::from_parts(ItemParts {
            id: ItemId::new("77"),
            status: ItemStatus::Unrecognized("ESCALATED".into()),
            payload: SuggestionPayload::new("c-1", "Efua Asante", "moved office"),
            created_at: at(4),
            created_by: ActorRef::new("staff-1"),
            review_history: Vec::new(),
            version: None,
        });
        let stub = Arc::new(StubBackend::new(admin()));
        let mut session = ReviewSession::new(stub, admin());

        assert!(session.controls(&odd).is_empty());
        assert!(matches!(
            session.open(&odd),
            Err(ReviewError::Refused(TransitionError::UnrecognizedStatus { .. }))
        ));
    }

    #[tokio::test]
    async fn test_stale_version_surfaces_conflict() {
        let stub = Arc::new(StubBackend::new(admin()).with_items(vec![pending_suggestion("12")]));
        let mut list = loaded(&stub).await;
        let mut session = ReviewSession::new(stub.clone(), admin());

        // someone else decided first
        let stale = pending_suggestion("12");
        let fresh = stub
            .transition(&ItemId::new("12"), TransitionRequest::new(Decision::Approve))
            .await
            .unwrap();
        assert_eq!(fresh.version(), Some(2));
        assert_eq!(stale.version(), Some(1));

        session.open(&stale).unwrap();
        let err = session
            .submit(&mut list, Decision::Reject, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::Backend(ApiError::Conflict { .. })));
        assert_eq!(
            list.find(&ItemId::new("12")).unwrap().status(),
            &ItemStatus::Known(SuggestionStatus::Pending)
        );
    }
}
