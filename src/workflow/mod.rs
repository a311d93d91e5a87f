// Status workflow engine
// Explicit status enums plus a transition table; no I/O lives here.

pub mod item;
pub mod kinds;
pub mod status;
pub mod transition;

pub use item::{sort_newest_first, ItemId, ItemParts, ReviewEntry, Workflow, WorkflowItem};
pub use kinds::{ContactSuggestions, MemoPayload, MemoRouting, SuggestionPayload};
pub use status::{Decision, ItemStatus, MemoStatus, SuggestionStatus, WorkflowStatus};
pub use transition::{authorize, Gate, TransitionError, TransitionRule};
