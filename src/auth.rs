//! Staff roles and the explicit authorization gate each procedure calls first.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WardError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Nurse,
    /// Nursing sister. May administer prescription-gated medications.
    Sister,
    /// Pharmacy / scripting staff handling prescription status.
    Script,
    Doctor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Nurse => "Nurse",
            Role::Sister => "Sister",
            Role::Script => "Script",
            Role::Doctor => "Doctor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = WardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "nurse" => Ok(Role::Nurse),
            "sister" | "nursingsister" => Ok(Role::Sister),
            "script" | "scripting" | "pharmacist" => Ok(Role::Script),
            "doctor" => Ok(Role::Doctor),
            other => Err(WardError::Forbidden(format!("unknown role '{}'", other))),
        }
    }
}

/// Acting staff member, supplied by the identity collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentUser {
    pub staff_id: i64,
    pub role: Role,
}

impl CurrentUser {
    pub fn new(staff_id: i64, role: Role) -> Self {
        Self { staff_id, role }
    }
}

/// Rejects `user` unless their role is one of `allowed`.
pub fn authorize(user: &CurrentUser, allowed: &[Role]) -> Result<()> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        tracing::warn!(staff_id = user.staff_id, role = %user.role, "access denied");
        Err(WardError::Forbidden(format!(
            "role {} may not perform this action",
            user.role
        )))
    }
}
