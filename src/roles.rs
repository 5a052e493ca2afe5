// src/roles.rs
//! Access roles and the column redaction policy.
//!
//! Roles are threaded explicitly through the compiler, injector, and
//! executor — never read from globals. Parsing is fail-secure: an absent or
//! unrecognized role name maps to the least-privileged role.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Value substituted for redacted columns in result rows.
pub const REDACTION_SENTINEL: &str = "[Hidden]";

/// Caller access role, least privileged first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    Viewer,
    Engineer,
    Manager,
    Admin,
}

impl Role {
    /// Parse a role name; `None` and unknown names both resolve to
    /// [`Role::Guest`].
    pub fn parse(name: Option<&str>) -> Role {
        match name.map(str::trim) {
            Some("viewer") => Role::Viewer,
            Some("engineer") => Role::Engineer,
            Some("manager") => Role::Manager,
            Some("admin") => Role::Admin,
            _ => Role::Guest,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::Viewer => "viewer",
            Role::Engineer => "engineer",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    /// Columns whose values this role must never see. Matching result-row
    /// keys are replaced with [`REDACTION_SENTINEL`], preserving row shape.
    pub fn hidden_columns(self) -> &'static [&'static str] {
        match self {
            Role::Guest => &["email", "phone", "password", "first_name", "last_name"],
            Role::Viewer => &["email", "phone", "password"],
            Role::Engineer => &["password"],
            Role::Manager | Role::Admin => &[],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
