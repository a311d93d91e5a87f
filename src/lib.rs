// deskflow - office dashboard approval workflows
// Library crate behind the `deskflow` terminal client; exposes the workflow
// engine, backend services and screen models for testing and integration.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod http;
pub mod notifications;
pub mod observability;
pub mod screens;
pub mod services;
pub mod shutdown;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use api::{ApiError, TransitionRequest};
pub use auth::{ActorRef, AuthContext, Role};
pub use config::{config, init_config, DeskflowConfig};
pub use http::BackendClient;
pub use notifications::{NotificationPoller, NotificationSource};
pub use observability::{api_metrics, create_workflow_span, ApiMetrics, OperationTimer};
pub use screens::{
    Badge, BadgeColor, ListView, LoadState, MemoForm, Navigation, QueueBoard, ReviewError,
    ReviewPhase, ReviewSession, SuggestionForm, ValidationError,
};
pub use services::{RestBackend, StatusFilter, WorkflowBackend};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};
pub use telemetry::{generate_correlation_id, init_telemetry, shutdown_telemetry};
pub use workflow::{
    ContactSuggestions, Decision, ItemId, ItemStatus, MemoRouting, MemoStatus, SuggestionStatus,
    TransitionError, Workflow, WorkflowItem, WorkflowStatus,
};
