// The two workflow instances the dashboard hosts.

use std::collections::BTreeMap;

use crate::workflow::item::Workflow;
use crate::workflow::status::{MemoStatus, SuggestionStatus};

/// Proposed change to a directory contact, reviewed by an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactSuggestions;

impl Workflow for ContactSuggestions {
    type Status = SuggestionStatus;
    type Payload = SuggestionPayload;

    const NOUN: &'static str = "suggestion";
    const QUEUES: &'static [SuggestionStatus] = &[SuggestionStatus::Pending];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionPayload {
    pub contact_id: String,
    pub contact_name: String,
    pub reason: String,
    /// Field name to proposed value.
    pub changes: BTreeMap<String, String>,
    pub admin_comment: Option<String>,
}

impl SuggestionPayload {
    pub fn new(
        contact_id: impl Into<String>,
        contact_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            contact_id: contact_id.into(),
            contact_name: contact_name.into(),
            reason: reason.into(),
            changes: BTreeMap::new(),
            admin_comment: None,
        }
    }

    pub fn with_change(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.changes.insert(field.into(), value.into());
        self
    }
}

/// Memo routed through desk-head and LEO review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoRouting;

impl Workflow for MemoRouting {
    type Status = MemoStatus;
    type Payload = MemoPayload;

    const NOUN: &'static str = "memo";
    const QUEUES: &'static [MemoStatus] = &[MemoStatus::PendingDeskHead, MemoStatus::PendingLeo];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoPayload {
    pub title: String,
    pub department: String,
    pub body: String,
}
