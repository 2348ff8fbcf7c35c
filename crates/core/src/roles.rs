//! User roles.
//!
//! Labels must match the `users.role` CHECK constraint in
//! `20260301000001_create_users.sql`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_TEACHERS: &str = "Docentes";
pub const ROLE_COORDINATORS: &str = "Coordinadores";
pub const ROLE_ADMINISTRATIVE: &str = "Administrativos";
pub const ROLE_GENERAL_SERVICES: &str = "Servicios Generales";
pub const ROLE_ADMIN: &str = "Administrador";
pub const ROLE_SST: &str = "SST";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Docentes")]
    Teacher,
    #[serde(rename = "Coordinadores")]
    Coordinator,
    #[serde(rename = "Administrativos")]
    Administrative,
    /// Maintenance technicians.
    #[serde(rename = "Servicios Generales")]
    GeneralServices,
    #[serde(rename = "Administrador")]
    Admin,
    /// Occupational safety staff: read-only access to tickets and metrics.
    #[serde(rename = "SST")]
    Sst,
}

impl Role {
    pub const ALL: &'static [Role] = &[
        Role::Teacher,
        Role::Coordinator,
        Role::Administrative,
        Role::GeneralServices,
        Role::Admin,
        Role::Sst,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Teacher => ROLE_TEACHERS,
            Role::Coordinator => ROLE_COORDINATORS,
            Role::Administrative => ROLE_ADMINISTRATIVE,
            Role::GeneralServices => ROLE_GENERAL_SERVICES,
            Role::Admin => ROLE_ADMIN,
            Role::Sst => ROLE_SST,
        }
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }

    pub fn is_technician(self) -> bool {
        self == Role::GeneralServices
    }

    /// Roles that open tickets on behalf of the school community.
    pub fn is_requester(self) -> bool {
        matches!(
            self,
            Role::Teacher | Role::Coordinator | Role::Administrative
        )
    }

    /// Roles that may see every ticket regardless of ownership.
    pub fn sees_all_tickets(self) -> bool {
        matches!(self, Role::Admin | Role::Sst)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown role '{s}'. Must be one of: {}",
                    Role::ALL
                        .iter()
                        .map(|r| r.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}
