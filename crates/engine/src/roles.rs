//! The role hierarchy of the station organisation.
//!
//! The directory stores roles as strings; they are parsed once at the
//! boundary into this closed enum and compared through its total order, never
//! as strings.

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Role of a caller, ordered from least to most privileged.
///
/// The derived `Ord` gives `Employee < Manager < Owner < SuperAdmin`, so a
/// minimum-role gate is a single comparison:
///
/// ```rust
/// use engine::Role;
///
/// assert!(Role::Owner.has_min_role(Role::Manager));
/// assert!(!Role::Employee.has_min_role(Role::Manager));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Employee,
    Manager,
    Owner,
    SuperAdmin,
}

impl Role {
    /// Returns the canonical role string used by the directory table.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Manager => "manager",
            Self::Owner => "owner",
            Self::SuperAdmin => "super_admin",
        }
    }

    /// Returns `true` if this role is at least as privileged as `required`.
    #[must_use]
    pub fn has_min_role(self, required: Role) -> bool {
        self >= required
    }
}

impl TryFrom<&str> for Role {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "employee" => Ok(Self::Employee),
            "manager" => Ok(Self::Manager),
            "owner" => Ok(Self::Owner),
            "super_admin" => Ok(Self::SuperAdmin),
            other => Err(EngineError::Validation(format!("invalid role: {other}"))),
        }
    }
}
