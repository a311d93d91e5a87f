use anyhow::Result;

use crate::cli::commands::{workflow, Command, Session};
use crate::cli::MemoAction;
use crate::screens::{FormError, MemoForm};
use crate::workflow::{Decision, MemoRouting};

pub struct MemosCommand {
    action: MemoAction,
}

impl MemosCommand {
    pub fn new(action: MemoAction) -> Self {
        Self { action }
    }
}

impl Command for MemosCommand {
    async fn execute(&self) -> Result<()> {
        let session = Session::connect()?;
        match &self.action {
            MemoAction::List { status } => {
                let filter = workflow::parse_filter(status)?;
                workflow::list::<MemoRouting>(&session, filter).await
            }
            MemoAction::Pending => workflow::pending::<MemoRouting>(&session).await,
            MemoAction::Show { id } => workflow::show::<MemoRouting>(&session, id).await,
            MemoAction::Create {
                title,
                department,
                body,
            } => {
                let form = MemoForm {
                    title: title.clone(),
                    department: department.clone(),
                    body: body.clone(),
                };
                match form.submit(&session.backend::<MemoRouting>()).await {
                    Ok((created, _)) => {
                        println!("✅ Memo #{} saved as {}", created.id(), created.status());
                        println!("   💡 Send it for review with: deskflow memos submit {}", created.id());
                        Ok(())
                    }
                    Err(FormError::Invalid(e)) => {
                        println!("⚠️  {e}");
                        println!("   Nothing was sent.");
                        Err(e.into())
                    }
                    Err(FormError::Backend(e)) => {
                        println!("❌ Could not create memo: {e}");
                        println!("   💡 {}", e.hint());
                        Err(e.into())
                    }
                }
            }
            MemoAction::Submit { id } => {
                workflow::review::<MemoRouting>(&session, id, Decision::Submit, None).await
            }
            MemoAction::Review {
                id,
                decision,
                comment,
            } => {
                let decision = workflow::parse_decision(decision)?;
                workflow::review::<MemoRouting>(&session, id, decision, comment.clone()).await
            }
            MemoAction::Delete { id } => workflow::delete::<MemoRouting>(&session, id).await,
        }
    }
}
