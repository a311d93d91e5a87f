//! Session authorization context
//!
//! Resolved once when a session starts (from configuration) and handed to
//! every screen. Screens never re-derive roles on their own.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Staff,
    Admin,
    DeskHead,
    Leo,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Staff => "staff",
            Role::Admin => "admin",
            Role::DeskHead => "desk_head",
            Role::Leo => "leo",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown role '{0}' (expected one of: staff, admin, desk_head, leo)")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            "desk_head" | "deskhead" => Ok(Role::DeskHead),
            "leo" => Ok(Role::Leo),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Reference to an actor as the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorRef {
    pub id: String,
    pub display_name: Option<String>,
}

impl ActorRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Name to show in lists, falling back to the id.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Who is using this session and with which role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    actor: ActorRef,
    role: Role,
}

impl AuthContext {
    pub fn new(actor: ActorRef, role: Role) -> Self {
        Self { actor, role }
    }

    pub fn actor(&self) -> &ActorRef {
        &self.actor
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_accepts_common_spellings() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Desk-Head".parse::<Role>().unwrap(), Role::DeskHead);
        assert_eq!("deskhead".parse::<Role>().unwrap(), Role::DeskHead);
        assert_eq!(" LEO ".parse::<Role>().unwrap(), Role::Leo);
        assert!("manager".parse::<Role>().is_err());
    }

    #[test]
    fn test_actor_label_falls_back_to_id() {
        let bare = ActorRef::new("u-17");
        assert_eq!(bare.label(), "u-17");

        let named = ActorRef::new("u-17").with_display_name("Amina Diallo");
        assert_eq!(named.label(), "Amina Diallo");
    }
}
