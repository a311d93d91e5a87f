use std::fmt;

use crate::workflow::{ItemStatus, MemoStatus, SuggestionStatus, Workflow, WorkflowStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeColor {
    Gray,
    Amber,
    Blue,
    Green,
    Red,
    /// Fallback for statuses this client does not know.
    Neutral,
}

impl BadgeColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeColor::Gray => "gray",
            BadgeColor::Amber => "amber",
            BadgeColor::Blue => "blue",
            BadgeColor::Green => "green",
            BadgeColor::Red => "red",
            BadgeColor::Neutral => "neutral",
        }
    }

    fn ansi_code(&self) -> &'static str {
        match self {
            BadgeColor::Gray => "90",
            BadgeColor::Amber => "33",
            BadgeColor::Blue => "34",
            BadgeColor::Green => "32",
            BadgeColor::Red => "31",
            BadgeColor::Neutral => "37",
        }
    }
}

/// Rendered status badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub color: BadgeColor,
    pub label: String,
}

impl Badge {
    pub fn new(color: BadgeColor, label: impl Into<String>) -> Self {
        Self {
            color,
            label: label.into(),
        }
    }

    pub fn unknown() -> Self {
        Self::new(BadgeColor::Neutral, "Unknown")
    }

    pub fn is_unknown(&self) -> bool {
        self.color == BadgeColor::Neutral
    }

    pub fn css_class(&self) -> String {
        format!("badge badge-{}", self.color.as_str())
    }

    pub fn ansi(&self) -> String {
        format!("\x1b[{}m[{}]\x1b[0m", self.color.ansi_code(), self.label)
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.label)
    }
}

/// Statuses that know how they are drawn.
pub trait Badged: WorkflowStatus {
    fn badge(&self) -> Badge;

    /// Name of the reviewer queue this status feeds, for multi-step workflows.
    fn queue_name(&self) -> Option<&'static str> {
        None
    }
}

impl Badged for SuggestionStatus {
    fn badge(&self) -> Badge {
        match self {
            SuggestionStatus::Pending => Badge::new(BadgeColor::Amber, "Pending"),
            SuggestionStatus::Approved => Badge::new(BadgeColor::Green, "Approved"),
            SuggestionStatus::Rejected => Badge::new(BadgeColor::Red, "Rejected"),
        }
    }
}

impl Badged for MemoStatus {
    fn badge(&self) -> Badge {
        match self {
            MemoStatus::Draft => Badge::new(BadgeColor::Gray, "Draft"),
            MemoStatus::PendingDeskHead => Badge::new(BadgeColor::Amber, "Pending Desk Head"),
            MemoStatus::PendingLeo => Badge::new(BadgeColor::Blue, "Pending LEO"),
            MemoStatus::Approved => Badge::new(BadgeColor::Green, "Approved"),
            MemoStatus::Rejected => Badge::new(BadgeColor::Red, "Rejected"),
        }
    }

    fn queue_name(&self) -> Option<&'static str> {
        match self {
            MemoStatus::PendingDeskHead => Some("pendingDeskHead"),
            MemoStatus::PendingLeo => Some("pendingLEO"),
            _ => None,
        }
    }
}

pub fn render<S: Badged>(status: &ItemStatus<S>) -> Badge {
    match status {
        ItemStatus::Known(status) => status.badge(),
        ItemStatus::Unrecognized(_) => Badge::unknown(),
    }
}

/// Badge for a raw backend status string.
pub fn render_raw<S: Badged>(raw: &str) -> Badge {
    render(&ItemStatus::<S>::parse(raw))
}

/// Queue an item in `status` waits in, if any.
pub fn queue_for<W>(status: &ItemStatus<W::Status>) -> Option<W::Status>
where
    W: Workflow,
{
    status
        .known()
        .filter(|status| W::QUEUES.contains(status))
}
