use std::fmt;

use serde::{Deserialize, Serialize};

/// Operator capability level.
///
/// Owners have full access: every instance, the wizard, and the
/// administrative screens. Admins are scoped to the instance ids listed
/// in their record and cannot provision or manage users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
        }
    }

    /// Parse a role token leniently (trimmed, case-insensitive).
    pub fn parse(raw: &str) -> Option<Role> {
        match raw.trim().to_lowercase().as_str() {
            "owner" => Some(Role::Owner),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn is_owner(&self) -> bool {
        matches!(self, Role::Owner)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One account in the user store, keyed externally by normalized
/// username. `password` holds the pbkdf2 hash, never plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub assigned_instances: Vec<String>,
}

/// The authenticated actor for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub username: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_owner(&self) -> bool {
        self.role.is_owner()
    }
}
