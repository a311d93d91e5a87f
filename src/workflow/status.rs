use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

use crate::auth::Role;
use crate::workflow::transition::{Gate, TransitionRule};

/// Decision an actor takes on a workflow item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Submit,
    Approve,
    Reject,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Submit => "submit",
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "submit" => Some(Decision::Submit),
            "approve" => Some(Decision::Approve),
            "reject" => Some(Decision::Reject),
            _ => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of statuses for one workflow, together with its transition table.
///
/// Implementors list every status in `ALL` and every allowed transition in
/// `RULES`. Everything else (terminal detection, reviewer lookup) is derived
/// from the table so the two can never disagree.
pub trait WorkflowStatus:
    Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Human name of the workflow, used in logs.
    const WORKFLOW: &'static str;
    const ALL: &'static [Self];
    const RULES: &'static [TransitionRule<Self>];

    fn initial() -> Self;

    /// Wire representation, e.g. `PENDING_DESK_HEAD`.
    fn as_str(&self) -> &'static str;

    /// Position along the workflow path. Every rule must move to a higher rank.
    fn rank(&self) -> u8;

    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw))
    }

    fn is_terminal(&self) -> bool {
        !Self::RULES.iter().any(|rule| rule.from == *self)
    }

    fn rule(&self, decision: Decision) -> Option<&'static TransitionRule<Self>> {
        Self::RULES
            .iter()
            .find(|rule| rule.from == *self && rule.decision == decision)
    }

    /// Gate that may act on an item in this status, `None` when terminal.
    fn current_reviewer(&self) -> Option<Gate> {
        Self::RULES
            .iter()
            .find(|rule| rule.from == *self)
            .map(|rule| rule.gate)
    }

    fn decisions(&self) -> Vec<Decision> {
        Self::RULES
            .iter()
            .filter(|rule| rule.from == *self)
            .map(|rule| rule.decision)
            .collect()
    }
}

/// Status as received from the backend.
///
/// The backend enumeration may be newer than this client, so values outside
/// the closed set are kept verbatim instead of failing the whole response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus<S> {
    Known(S),
    Unrecognized(String),
}

impl<S: WorkflowStatus> ItemStatus<S> {
    pub fn parse(raw: &str) -> Self {
        match S::parse(raw) {
            Some(status) => ItemStatus::Known(status),
            None => ItemStatus::Unrecognized(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ItemStatus::Known(status) => status.as_str(),
            ItemStatus::Unrecognized(raw) => raw,
        }
    }

    pub fn known(&self) -> Option<S> {
        match self {
            ItemStatus::Known(status) => Some(*status),
            ItemStatus::Unrecognized(_) => None,
        }
    }

    /// Whether any transition can still be offered. Unrecognized statuses
    /// never get controls.
    pub fn accepts_transitions(&self) -> bool {
        matches!(self, ItemStatus::Known(status) if !status.is_terminal())
    }
}

impl<S: WorkflowStatus> From<S> for ItemStatus<S> {
    fn from(status: S) -> Self {
        ItemStatus::Known(status)
    }
}

impl<S: WorkflowStatus> fmt::Display for ItemStatus<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuggestionStatus {
    Pending,
    Approved,
    Rejected,
}

impl WorkflowStatus for SuggestionStatus {
    const WORKFLOW: &'static str = "contact_suggestion";
    const ALL: &'static [Self] = &[
        SuggestionStatus::Pending,
        SuggestionStatus::Approved,
        SuggestionStatus::Rejected,
    ];
    const RULES: &'static [TransitionRule<Self>] = &[
        TransitionRule {
            from: SuggestionStatus::Pending,
            decision: Decision::Approve,
            to: SuggestionStatus::Approved,
            gate: Gate::Role(Role::Admin),
        },
        TransitionRule {
            from: SuggestionStatus::Pending,
            decision: Decision::Reject,
            to: SuggestionStatus::Rejected,
            gate: Gate::Role(Role::Admin),
        },
    ];

    fn initial() -> Self {
        SuggestionStatus::Pending
    }

    fn as_str(&self) -> &'static str {
        match self {
            SuggestionStatus::Pending => "PENDING",
            SuggestionStatus::Approved => "APPROVED",
            SuggestionStatus::Rejected => "REJECTED",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SuggestionStatus::Pending => 0,
            SuggestionStatus::Approved | SuggestionStatus::Rejected => 1,
        }
    }
}

impl fmt::Display for SuggestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoStatus {
    Draft,
    PendingDeskHead,
    PendingLeo,
    Approved,
    Rejected,
}

impl WorkflowStatus for MemoStatus {
    const WORKFLOW: &'static str = "memo_routing";
    const ALL: &'static [Self] = &[
        MemoStatus::Draft,
        MemoStatus::PendingDeskHead,
        MemoStatus::PendingLeo,
        MemoStatus::Approved,
        MemoStatus::Rejected,
    ];
    // A rejection at either review stage is final; memos never go back to DRAFT.
    const RULES: &'static [TransitionRule<Self>] = &[
        TransitionRule {
            from: MemoStatus::Draft,
            decision: Decision::Submit,
            to: MemoStatus::PendingDeskHead,
            gate: Gate::Creator,
        },
        TransitionRule {
            from: MemoStatus::PendingDeskHead,
            decision: Decision::Approve,
            to: MemoStatus::PendingLeo,
            gate: Gate::Role(Role::DeskHead),
        },
        TransitionRule {
            from: MemoStatus::PendingDeskHead,
            decision: Decision::Reject,
            to: MemoStatus::Rejected,
            gate: Gate::Role(Role::DeskHead),
        },
        TransitionRule {
            from: MemoStatus::PendingLeo,
            decision: Decision::Approve,
            to: MemoStatus::Approved,
            gate: Gate::Role(Role::Leo),
        },
        TransitionRule {
            from: MemoStatus::PendingLeo,
            decision: Decision::Reject,
            to: MemoStatus::Rejected,
            gate: Gate::Role(Role::Leo),
        },
    ];

    fn initial() -> Self {
        MemoStatus::Draft
    }

    fn as_str(&self) -> &'static str {
        match self {
            MemoStatus::Draft => "DRAFT",
            MemoStatus::PendingDeskHead => "PENDING_DESK_HEAD",
            MemoStatus::PendingLeo => "PENDING_LEO",
            MemoStatus::Approved => "APPROVED",
            MemoStatus::Rejected => "REJECTED",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            MemoStatus::Draft => 0,
            MemoStatus::PendingDeskHead => 1,
            MemoStatus::PendingLeo => 2,
            MemoStatus::Approved | MemoStatus::Rejected => 3,
        }
    }
}

impl fmt::Display for MemoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_table_is_monotonic<S: WorkflowStatus>() {
        for rule in S::RULES {
            assert!(
                rule.to.rank() > rule.from.rank(),
                "{}: {} -> {} does not move forward",
                S::WORKFLOW,
                rule.from,
                rule.to
            );
        }
    }

    fn assert_single_gate_per_status<S: WorkflowStatus>() {
        for status in S::ALL {
            let gates: Vec<Gate> = S::RULES
                .iter()
                .filter(|rule| rule.from == *status)
                .map(|rule| rule.gate)
                .collect();
            assert!(
                gates.windows(2).all(|pair| pair[0] == pair[1]),
                "{}: {} has mixed reviewer gates",
                S::WORKFLOW,
                status
            );
        }
    }

    #[test]
    fn test_transition_tables_only_move_forward() {
        assert_table_is_monotonic::<SuggestionStatus>();
        assert_table_is_monotonic::<MemoStatus>();
        assert_single_gate_per_status::<SuggestionStatus>();
        assert_single_gate_per_status::<MemoStatus>();
    }

    #[test]
    fn test_terminal_statuses_are_derived_from_table() {
        assert!(!SuggestionStatus::Pending.is_terminal());
        assert!(SuggestionStatus::Approved.is_terminal());
        assert!(SuggestionStatus::Rejected.is_terminal());

        assert!(!MemoStatus::Draft.is_terminal());
        assert!(!MemoStatus::PendingDeskHead.is_terminal());
        assert!(!MemoStatus::PendingLeo.is_terminal());
        assert!(MemoStatus::Approved.is_terminal());
        assert!(MemoStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_current_reviewer_follows_memo_stage() {
        assert_eq!(MemoStatus::Draft.current_reviewer(), Some(Gate::Creator));
        assert_eq!(
            MemoStatus::PendingDeskHead.current_reviewer(),
            Some(Gate::Role(Role::DeskHead))
        );
        assert_eq!(
            MemoStatus::PendingLeo.current_reviewer(),
            Some(Gate::Role(Role::Leo))
        );
        assert_eq!(MemoStatus::Rejected.current_reviewer(), None);
    }

    #[test]
    fn test_parse_is_case_insensitive_and_keeps_unknown_values() {
        assert_eq!(MemoStatus::parse("pending_leo"), Some(MemoStatus::PendingLeo));
        assert_eq!(
            ItemStatus::<MemoStatus>::parse("PENDING_DESK_HEAD"),
            ItemStatus::Known(MemoStatus::PendingDeskHead)
        );

        let archived = ItemStatus::<SuggestionStatus>::parse("ARCHIVED");
        assert_eq!(archived, ItemStatus::Unrecognized("ARCHIVED".to_string()));
        assert_eq!(archived.as_str(), "ARCHIVED");
        assert!(!archived.accepts_transitions());
    }

    #[test]
    fn test_decisions_listed_per_status() {
        assert_eq!(
            SuggestionStatus::Pending.decisions(),
            vec![Decision::Approve, Decision::Reject]
        );
        assert_eq!(MemoStatus::Draft.decisions(), vec![Decision::Submit]);
        assert!(MemoStatus::Approved.decisions().is_empty());
        assert_eq!(Decision::parse(" Reject "), Some(Decision::Reject));
        assert_eq!(Decision::parse("escalate"), None);
    }
}
