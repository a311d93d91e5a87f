use anyhow::Result;
use std::collections::BTreeMap;

use crate::cli::commands::{workflow, Command, Session};
use crate::cli::SuggestionAction;
use crate::screens::{FormError, Navigation, SuggestionForm};
use crate::services::StatusFilter;
use crate::workflow::ContactSuggestions;

pub struct SuggestionsCommand {
    action: SuggestionAction,
}

impl SuggestionsCommand {
    pub fn new(action: SuggestionAction) -> Self {
        Self { action }
    }

    async fn submit(&self, session: &Session, form: SuggestionForm) -> Result<()> {
        let backend = session.backend::<ContactSuggestions>();
        match form.submit(&backend).await {
            Ok((created, next)) => {
                println!("✅ Suggestion #{} submitted for admin review", created.id());
                if next == Navigation::SuggestionsList {
                    println!();
                    workflow::list::<ContactSuggestions>(session, StatusFilter::All).await?;
                }
                Ok(())
            }
            Err(FormError::Invalid(e)) => {
                println!("⚠️  {e}");
                println!("   Nothing was sent.");
                Err(e.into())
            }
            Err(FormError::Backend(e)) => {
                println!("❌ Could not submit suggestion: {e}");
                println!("   💡 {}", e.hint());
                Err(e.into())
            }
        }
    }
}

impl Command for SuggestionsCommand {
    async fn execute(&self) -> Result<()> {
        let session = Session::connect()?;
        match &self.action {
            SuggestionAction::List { status } => {
                let filter = workflow::parse_filter(status)?;
                workflow::list::<ContactSuggestions>(&session, filter).await
            }
            SuggestionAction::Pending => workflow::pending::<ContactSuggestions>(&session).await,
            SuggestionAction::Show { id } => workflow::show::<ContactSuggestions>(&session, id).await,
            SuggestionAction::Submit {
                contact_id,
                contact_name,
                reason,
                changes,
            } => {
                let form = SuggestionForm {
                    contact_id: contact_id.clone(),
                    contact_name: contact_name.clone(),
                    reason: reason.clone(),
                    changes: changes.iter().cloned().collect::<BTreeMap<_, _>>(),
                };
                self.submit(&session, form).await
            }
            SuggestionAction::Review {
                id,
                decision,
                comment,
            } => {
                let decision = workflow::parse_decision(decision)?;
                workflow::review::<ContactSuggestions>(&session, id, decision, comment.clone()).await
            }
            SuggestionAction::Delete { id } => {
                workflow::delete::<ContactSuggestions>(&session, id).await
            }
        }
    }
}
