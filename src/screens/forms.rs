use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::api::ApiError;
use crate::services::WorkflowBackend;
use crate::workflow::{ContactSuggestions, MemoPayload, MemoRouting, SuggestionPayload, WorkflowItem};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Pick the contact this suggestion is about")]
    ContactRequired,
    #[error("Please give a reason for the change")]
    ReasonRequired,
    #[error("Propose at least one field change")]
    NoChanges,
    #[error("A memo needs a title")]
    TitleRequired,
    #[error("A memo needs a department")]
    DepartmentRequired,
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Backend(#[from] ApiError),
}

/// Where the shell goes after a successful create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    SuggestionsList,
    MemosList,
}

fn required(value: &str, missing: ValidationError) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(missing);
    }
    Ok(value.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionForm {
    pub contact_id: String,
    pub contact_name: String,
    pub reason: String,
    pub changes: BTreeMap<String, String>,
}

impl SuggestionForm {
    pub fn new(contact_id: impl Into<String>, contact_name: impl Into<String>) -> Self {
        Self {
            contact_id: contact_id.into(),
            contact_name: contact_name.into(),
            ..Default::default()
        }
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn change(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.changes.insert(field.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<SuggestionPayload, ValidationError> {
        let contact_id = required(&self.contact_id, ValidationError::ContactRequired)?;
        let reason = required(&self.reason, ValidationError::ReasonRequired)?;

        let changes: BTreeMap<String, String> = self
            .changes
            .iter()
            .filter(|(field, _)| !field.trim().is_empty())
            .map(|(field, value)| (field.trim().to_string(), value.trim().to_string()))
            .collect();
        if changes.is_empty() {
            return Err(ValidationError::NoChanges);
        }

        let mut payload = SuggestionPayload::new(contact_id, self.contact_name.trim(), reason);
        payload.changes = changes;
        Ok(payload)
    }

    /// Validate, then send exactly one create request.
    pub async fn submit(
        &self,
        backend: &Arc<dyn WorkflowBackend<ContactSuggestions>>,
    ) -> Result<(WorkflowItem<ContactSuggestions>, Navigation), FormError> {
        let payload = self.validate()?;
        let created = backend.create(payload).await?;
        info!(id = %created.id(), "Suggestion submitted");
        Ok((created, Navigation::SuggestionsList))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoForm {
    pub title: String,
    pub department: String,
    pub body: String,
}

impl MemoForm {
    pub fn validate(&self) -> Result<MemoPayload, ValidationError> {
        Ok(MemoPayload {
            title: required(&self.title, ValidationError::TitleRequired)?,
            department: required(&self.department, ValidationError::DepartmentRequired)?,
            body: self.body.trim_end().to_string(),
        })
    }

    /// Memos are created as drafts; submitting for review is a separate step.
    pub async fn submit(
        &self,
        backend: &Arc<dyn WorkflowBackend<MemoRouting>>,
    ) -> Result<(WorkflowItem<MemoRouting>, Navigation), FormError> {
        let payload = self.validate()?;
        let created = backend.create(payload).await?;
        info!(id = %created.id(), status = %created.status(), "Memo created");
        Ok((created, Navigation::MemosList))
    }
}
