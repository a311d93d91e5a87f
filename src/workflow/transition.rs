use std::fmt;
use thiserror::Error;

use crate::auth::{ActorRef, AuthContext, Role};
use crate::workflow::status::{Decision, WorkflowStatus};

/// Who may fire a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    /// Any actor holding this role.
    Role(Role),
    /// Only the actor who created the item.
    Creator,
}

impl Gate {
    pub fn admits(&self, actor: &AuthContext, created_by: &ActorRef) -> bool {
        match self {
            Gate::Role(role) => actor.is(*role),
            Gate::Creator => actor.actor().id == created_by.id,
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::Role(role) => write!(f, "{role}"),
            Gate::Creator => f.write_str("creator"),
        }
    }
}

/// One row of a workflow's transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule<S> {
    pub from: S,
    pub decision: Decision,
    pub to: S,
    pub gate: Gate,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("{status} is a final status; no further decisions are accepted")]
    Terminal { status: String },
    #[error("'{decision}' is not a valid decision while {status}")]
    NotAllowed { status: String, decision: Decision },
    #[error("only the {required} may act while {status} (you are {actual})")]
    WrongReviewer {
        status: String,
        required: Gate,
        actual: String,
    },
    #[error("status '{status}' is not recognized by this client")]
    UnrecognizedStatus { status: String },
}

/// Look up the rule for `decision` from `from` and check the actor against
/// its gate.
pub fn authorize<S: WorkflowStatus>(
    from: S,
    decision: Decision,
    actor: &AuthContext,
    created_by: &ActorRef,
) -> Result<&'static TransitionRule<S>, TransitionError> {
    if from.is_terminal() {
        return Err(TransitionError::Terminal {
            status: from.to_string(),
        });
    }

    let rule = from.rule(decision).ok_or_else(|| TransitionError::NotAllowed {
        status: from.to_string(),
        decision,
    })?;

    if !rule.gate.admits(actor, created_by) {
        return Err(TransitionError::WrongReviewer {
            status: from.to_string(),
            required: rule.gate,
            actual: actor.role().to_string(),
        });
    }

    Ok(rule)
}
