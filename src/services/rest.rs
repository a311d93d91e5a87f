use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::wire::{CreateMemoBody, CreateSuggestionBody, WireMemo, WireSuggestion};
use crate::api::{decode_item, ApiError, ListEnvelope, TransitionRequest, WireItem};
use crate::http::{ApiPath, BackendClient};
use crate::services::{StatusFilter, WorkflowBackend};
use crate::workflow::{
    ContactSuggestions, ItemId, MemoPayload, MemoRouting, MemoStatus, SuggestionPayload,
    SuggestionStatus, Workflow, WorkflowItem,
};

/// Where a workflow lives on the REST backend and how its payload is encoded.
pub trait RestResource: Workflow {
    type Wire: DeserializeOwned + TryInto<Self::Payload, Error = ApiError> + Send + 'static;

    /// Collection path relative to the API base, e.g. `memos`.
    const COLLECTION: &'static str;

    /// Path segment appended to an item for transitions.
    const TRANSITION_SEGMENT: &'static str;

    /// Dedicated queue endpoint for a pending status, if the backend has one.
    fn queue_path(queue: Self::Status) -> Option<&'static str>;

    fn create_body(payload: &Self::Payload) -> Result<serde_json::Value, ApiError>;
}

impl RestResource for ContactSuggestions {
    type Wire = WireSuggestion;

    const COLLECTION: &'static str = "contacts/suggestions";
    const TRANSITION_SEGMENT: &'static str = "review";

    fn queue_path(queue: SuggestionStatus) -> Option<&'static str> {
        match queue {
            SuggestionStatus::Pending => Some("contacts/suggestions/pending"),
            _ => None,
        }
    }

    fn create_body(payload: &SuggestionPayload) -> Result<serde_json::Value, ApiError> {
        Ok(serde_json::to_value(CreateSuggestionBody {
            contact_id: &payload.contact_id,
            reason: &payload.reason,
            changes: &payload.changes,
        })?)
    }
}

impl RestResource for MemoRouting {
    type Wire = WireMemo;

    const COLLECTION: &'static str = "memos";
    const TRANSITION_SEGMENT: &'static str = "transition";

    fn queue_path(queue: MemoStatus) -> Option<&'static str> {
        match queue {
            MemoStatus::PendingDeskHead => Some("memos/pending/desk-head"),
            MemoStatus::PendingLeo => Some("memos/pending/leo"),
            _ => None,
        }
    }

    fn create_body(payload: &MemoPayload) -> Result<serde_json::Value, ApiError> {
        Ok(serde_json::to_value(CreateMemoBody {
            title: &payload.title,
            department: &payload.department,
            body: &payload.body,
        })?)
    }
}

/// Upper bound on `next` links followed for one list call.
const MAX_PAGES: usize = 200;

/// `WorkflowBackend` over the dashboard REST API
#[derive(Debug)]
pub struct RestBackend<W> {
    client: Arc<BackendClient>,
    _workflow: PhantomData<fn() -> W>,
}

impl<W: RestResource> RestBackend<W> {
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self {
            client,
            _workflow: PhantomData,
        }
    }

    /// Fetch every page of a list endpoint, following `next` links.
    async fn fetch_all(
        &self,
        path: ApiPath,
        query: &[(&str, String)],
    ) -> Result<Vec<WorkflowItem<W>>, ApiError> {
        let mut envelope: ListEnvelope<WireItem<W::Wire>> =
            self.client.get_json(path.clone(), query).await?;
        let total = envelope.total();
        let mut visited = HashSet::new();
        let mut items = Vec::new();

        loop {
            let (page, next) = envelope.into_parts();
            for wire in page {
                items.push(decode_item::<W, W::Wire>(wire)?);
            }
            let Some(next) = next else {
                break;
            };
            if visited.len() >= MAX_PAGES || !visited.insert(next.clone()) {
                return Err(ApiError::Decode(format!(
                    "{path} kept paging after {} pages (next: {next})",
                    visited.len()
                )));
            }
            debug!(workflow = W::NOUN, next = %next, fetched = items.len(), "Following next page");
            envelope = self.client.get_next_page(&next).await?;
        }

        if let Some(total) = total {
            if total != items.len() as u64 {
                warn!(
                    workflow = W::NOUN,
                    reported = total,
                    received = items.len(),
                    "Backend count does not match the items received"
                );
            }
        }
        Ok(items)
    }

    fn item_path(id: &ItemId) -> ApiPath {
        ApiPath::new(W::COLLECTION).push(id.as_str())
    }
}

#[async_trait]
impl<W: RestResource> WorkflowBackend<W> for RestBackend<W> {
    async fn list(&self, filter: StatusFilter<W::Status>) -> Result<Vec<WorkflowItem<W>>, ApiError> {
        let query: Vec<(&str, String)> = filter
            .as_query()
            .map(|status| vec![("status", status.to_string())])
            .unwrap_or_default();

        self.fetch_all(ApiPath::new(W::COLLECTION), &query).await
    }

    async fn pending(&self, queue: W::Status) -> Result<Vec<WorkflowItem<W>>, ApiError> {
        let items = match W::queue_path(queue) {
            Some(path) => self.fetch_all(ApiPath::new(path), &[]).await?,
            None => self.list(StatusFilter::Only(queue)).await?,
        };

        let total = items.len();
        let queued: Vec<_> = items
            .into_iter()
            .filter(|item| item.status().known() == Some(queue))
            .collect();
        if queued.len() != total {
            debug!(
                workflow = W::NOUN,
                queue = %queue,
                dropped = total - queued.len(),
                "Queue response contained items from other stages"
            );
        }
        Ok(queued)
    }

    async fn create(&self, payload: W::Payload) -> Result<WorkflowItem<W>, ApiError> {
        let body = W::create_body(&payload)?;
        let wire: WireItem<W::Wire> = self
            .client
            .post_json(W::COLLECTION, &body, W::COLLECTION)
            .await?;
        decode_item(wire)
    }

    async fn transition(
        &self,
        id: &ItemId,
        request: TransitionRequest,
    ) -> Result<WorkflowItem<W>, ApiError> {
        let path = Self::item_path(id).push(W::TRANSITION_SEGMENT);
        let wire: WireItem<W::Wire> = self
            .client
            .post_json(path, &request, W::COLLECTION)
            .await?;
        decode_item(wire)
    }

    async fn delete(&self, id: &ItemId) -> Result<(), ApiError> {
        self.client
            .delete(Self::item_path(id), W::COLLECTION)
            .await
    }
}
