use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::ApiError;
use crate::services::{StatusFilter, WorkflowBackend};
use crate::workflow::{sort_newest_first, ItemId, Workflow, WorkflowItem};

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<W: Workflow> {
    Idle,
    Loading,
    Ready(Vec<WorkflowItem<W>>),
    /// The fetch succeeded and matched nothing.
    Empty,
    Failed(String),
}

impl<W: Workflow> LoadState<W> {
    pub fn items(&self) -> &[WorkflowItem<W>] {
        match self {
            LoadState::Ready(items) => items,
            _ => &[],
        }
    }

    fn from_items(mut items: Vec<WorkflowItem<W>>) -> Self {
        if items.is_empty() {
            return LoadState::Empty;
        }
        sort_newest_first(&mut items);
        LoadState::Ready(items)
    }
}

/// A filtered, newest-first list of one workflow's items.
pub struct ListView<W: Workflow> {
    backend: Arc<dyn WorkflowBackend<W>>,
    filter: StatusFilter<W::Status>,
    state: LoadState<W>,
}

impl<W: Workflow> ListView<W> {
    pub fn new(backend: Arc<dyn WorkflowBackend<W>>) -> Self {
        Self {
            backend,
            filter: StatusFilter::All,
            state: LoadState::Idle,
        }
    }

    pub fn filter(&self) -> StatusFilter<W::Status> {
        self.filter
    }

    pub fn state(&self) -> &LoadState<W> {
        &self.state
    }

    pub fn items(&self) -> &[WorkflowItem<W>] {
        self.state.items()
    }

    pub fn find(&self, id: &ItemId) -> Option<&WorkflowItem<W>> {
        self.items().iter().find(|item| item.id() == id)
    }

    pub async fn refresh(&mut self) {
        self.state = LoadState::Loading;
        self.state = match self.backend.list(self.filter).await {
            Ok(items) => {
                debug!(workflow = W::NOUN, filter = %self.filter, count = items.len(), "List loaded");
                LoadState::from_items(items)
            }
            Err(e) => {
                warn!(workflow = W::NOUN, filter = %self.filter, error = %e, "Failed to load list");
                LoadState::Failed(e.to_string())
            }
        };
    }

    /// Changing the filter always re-fetches, even when it is unchanged.
    pub async fn set_filter(&mut self, filter: StatusFilter<W::Status>) {
        self.filter = filter;
        self.refresh().await;
    }

    /// Swap in the backend's copy of an item after a successful write.
    /// Items that no longer match the filter drop out of the list.
    pub fn replace(&mut self, updated: WorkflowItem<W>) {
        let LoadState::Ready(items) = &mut self.state else {
            return;
        };
        items.retain(|item| item.id() != updated.id());
        if self.filter.matches(updated.status()) {
            items.push(updated);
        }
        let items = std::mem::take(items);
        self.state = LoadState::from_items(items);
    }

    /// Administrative delete. The list only changes once the backend agrees.
    pub async fn delete(&mut self, id: &ItemId) -> Result<(), ApiError> {
        if let Err(e) = self.backend.delete(id).await {
            warn!(workflow = W::NOUN, id = %id, error = %e, "Delete failed");
            return Err(e);
        }
        if let LoadState::Ready(items) = &mut self.state {
            items.retain(|item| item.id() != id);
            let items = std::mem::take(items);
            self.state = LoadState::from_items(items);
        }
        Ok(())
    }
}
