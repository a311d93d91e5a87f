use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::ApiError;
use crate::services::WorkflowBackend;
use crate::workflow::{sort_newest_first, Workflow, WorkflowItem};

/// Items waiting at one reviewer gate.
#[derive(Debug, Clone, PartialEq)]
pub struct Queue<W: Workflow> {
    pub status: W::Status,
    pub items: Vec<WorkflowItem<W>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoardState<W: Workflow> {
    Idle,
    Loading,
    Ready(Vec<Queue<W>>),
    Failed(String),
}

/// All pending queues of a workflow, loaded together.
///
/// Queues are fetched in parallel and the board only renders once every
/// fetch has succeeded. One failure fails the whole board.
pub struct QueueBoard<W: Workflow> {
    backend: Arc<dyn WorkflowBackend<W>>,
    state: BoardState<W>,
}

impl<W: Workflow> QueueBoard<W> {
    pub fn new(backend: Arc<dyn WorkflowBackend<W>>) -> Self {
        Self {
            backend,
            state: BoardState::Idle,
        }
    }

    pub fn state(&self) -> &BoardState<W> {
        &self.state
    }

    pub fn queue(&self, status: W::Status) -> Option<&Queue<W>> {
        match &self.state {
            BoardState::Ready(queues) => queues.iter().find(|q| q.status == status),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.state {
            BoardState::Ready(queues) => queues.iter().all(|q| q.items.is_empty()),
            _ => true,
        }
    }

    pub async fn refresh(&mut self) {
        self.state = BoardState::Loading;

        let backend = &self.backend;
        let fetches = W::QUEUES.iter().map(|status| async move {
            let mut items = backend.pending(*status).await?;
            sort_newest_first(&mut items);
            Ok::<_, ApiError>(Queue {
                status: *status,
                items,
            })
        });

        self.state = match try_join_all(fetches).await {
            Ok(queues) => {
                info!(
                    workflow = W::NOUN,
                    queues = queues.len(),
                    waiting = queues.iter().map(|q| q.items.len()).sum::<usize>(),
                    "Pending queues loaded"
                );
                BoardState::Ready(queues)
            }
            Err(e) => {
                warn!(workflow = W::NOUN, error = %e, "Pending queues failed to load");
                BoardState::Failed(e.to_string())
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ActorRef, AuthContext, Role};
    use crate::services::stub::{at, Failure, StubBackend};
    use crate::workflow::{Decision, ItemId, MemoPayload, MemoRouting, MemoStatus};

    fn memo_at(id: &str, stage: MemoStatus) -> WorkflowItem<MemoRouting> {
        let mut memo = WorkflowItem::new(
            ItemId::new(id),
            MemoPayload {
                title: format!("Memo {id}"),
                department: "Operations".into(),
                body: String::new(),
            },
            ActorRef::new("staff-1"),
            at(1),
        );
        let author = AuthContext::new(ActorRef::new("staff-1"), Role::Staff);
        let desk_head = AuthContext::new(ActorRef::new("dh-1"), Role::DeskHead);
        if stage != MemoStatus::Draft {
            memo.apply(Decision::Submit, &author, None, at(2)).unwrap();
        }
        if stage == MemoStatus::PendingLeo {
            memo.apply(Decision::Approve, &desk_head, None, at(3)).unwrap();
        }
        memo
    }

    fn board_over(stub: &Arc<StubBackend<MemoRouting>>) -> QueueBoard<MemoRouting> {
        QueueBoard::new(stub.clone())
    }

    fn leo() -> AuthContext {
        AuthContext::new(ActorRef::new("leo-1"), Role::Leo)
    }

    #[tokio::test]
    async fn test_both_queues_load_together() {
        let stub = Arc::new(StubBackend::new(leo()).with_items(vec![
            memo_at("1", MemoStatus::Draft),
            memo_at("2", MemoStatus::PendingDeskHead),
            memo_at("3", MemoStatus::PendingLeo),
            memo_at("4", MemoStatus::PendingLeo),
        ]));
        let mut board = board_over(&stub);
        assert_eq!(board.state(), &BoardState::Idle);

        board.refresh().await;

        let desk = board.queue(MemoStatus::PendingDeskHead).unwrap();
        let leo_queue = board.queue(MemoStatus::PendingLeo).unwrap();
        assert_eq!(desk.items.len(), 1);
        let leo_ids: Vec<&str> = leo_queue.items.iter().map(|i| i.id().as_str()).collect();
        assert_eq!(leo_ids, vec!["3", "4"]);
        assert!(!board.is_empty());
    }

    #[tokio::test]
    async fn test_one_failing_queue_fails_the_board() {
        let stub = Arc::new(StubBackend::new(leo()).with_items(vec![
            memo_at("2", MemoStatus::PendingDeskHead),
            memo_at("3", MemoStatus::PendingLeo),
        ]));
        let mut board = board_over(&stub);

        for failing in [MemoStatus::PendingDeskHead, MemoStatus::PendingLeo] {
            stub.heal();
            stub.fail(Failure::Queue(failing));
            board.refresh().await;

            assert!(matches!(board.state(), BoardState::Failed(_)));
            assert!(board.queue(MemoStatus::PendingDeskHead).is_none());
            assert!(board.queue(MemoStatus::PendingLeo).is_none());
        }
    }

    #[tokio::test]
    async fn test_board_recovers_after_failure() {
        let stub = Arc::new(StubBackend::new(leo()));
        let mut board = board_over(&stub);

        stub.fail(Failure::Queue(MemoStatus::PendingLeo));
        board.refresh().await;
        assert!(matches!(board.state(), BoardState::Failed(_)));

        stub.heal();
        board.refresh().await;
        assert!(matches!(board.state(), BoardState::Ready(queues) if queues.len() == 2));
        assert!(board.is_empty());
    }
}
