// Service seams between screens and the backend

pub mod rest;

#[cfg(test)]
pub mod stub;

use async_trait::async_trait;
use std::fmt;

use crate::api::{ApiError, TransitionRequest};
use crate::workflow::{ItemId, ItemStatus, Workflow, WorkflowItem, WorkflowStatus};

pub use rest::{RestBackend, RestResource};

/// Status filter for list views; `All` is the "no filter" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter<S> {
    All,
    Only(S),
}

impl<S: WorkflowStatus> StatusFilter<S> {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().eq_ignore_ascii_case("all") {
            return Some(StatusFilter::All);
        }
        S::parse(raw).map(StatusFilter::Only)
    }

    pub fn matches(&self, status: &ItemStatus<S>) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => status.known() == Some(*wanted),
        }
    }

    pub fn as_query(&self) -> Option<&'static str> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Only(status) => Some(status.as_str()),
        }
    }
}

impl<S: WorkflowStatus> fmt::Display for StatusFilter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => write!(f, "{status}"),
        }
    }
}

/// Backend operations one workflow needs.
///
/// The backend is authoritative for every transition; implementations
/// return the item exactly as the backend now holds it.
#[async_trait]
pub trait WorkflowBackend<W: Workflow>: Send + Sync {
    async fn list(&self, filter: StatusFilter<W::Status>) -> Result<Vec<WorkflowItem<W>>, ApiError>;

    /// Items awaiting action at the gate of `queue`.
    async fn pending(&self, queue: W::Status) -> Result<Vec<WorkflowItem<W>>, ApiError>;

    async fn create(&self, payload: W::Payload) -> Result<WorkflowItem<W>, ApiError>;

    async fn transition(
        &self,
        id: &ItemId,
        request: TransitionRequest,
    ) -> Result<WorkflowItem<W>, ApiError>;

    /// Administrative removal outside the normal lifecycle.
    async fn delete(&self, id: &ItemId) -> Result<(), ApiError>;
}
