// Screen models: status badges, lists, queue boards, review dialog, forms.
// They hold view state only and talk to the backend through WorkflowBackend.

pub mod badge;
pub mod detail;
pub mod forms;
pub mod list;
pub mod queues;
pub mod review;

pub use badge::{Badge, BadgeColor, Badged};
pub use detail::Describe;
pub use forms::{FormError, MemoForm, Navigation, SuggestionForm, ValidationError};
pub use list::{ListView, LoadState};
pub use queues::{BoardState, Queue, QueueBoard};
pub use review::{ReviewDialog, ReviewError, ReviewPhase, ReviewSession};
