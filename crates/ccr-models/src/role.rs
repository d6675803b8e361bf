//! Portal roles
//!
//! Every account has exactly one role, stored on its profile. An account
//! without a profile is treated as a client.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Worker,
    #[default]
    Client,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Worker, Role::Client];

    /// Value stored in `profiles.role`
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Worker => "WORKER",
            Role::Client => "CLIENT",
        }
    }

    /// Display label shown to users
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrador",
            Role::Worker => "Trabajador",
            Role::Client => "Cliente",
        }
    }

    /// Admins and workers form the staff team
    pub fn is_staff(&self) -> bool {
        match self {
            Role::Admin | Role::Worker => true,
            Role::Client => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "WORKER" => Ok(Role::Worker),
            "CLIENT" => Ok(Role::Client),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}
