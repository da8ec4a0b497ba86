//! # User Accounts and Roles
//!
//! Role-based access is a flat capability lookup consulted at the HTTP
//! boundary, not an inheritance hierarchy. Token issuance and
//! verification belong to an external collaborator; the core only sees
//! an already-resolved role.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular customer
    Client,
    /// Store worker (catalog and stock management)
    Worker,
    /// Administrator (everything)
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::Client
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Role::Client),
            "worker" => Ok(Role::Worker),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Capabilities gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Create/update/delete products and stores
    ManageCatalog,
    /// Adjust and transfer stock
    ManageStock,
    /// Read the contact-message inbox
    ReadInbox,
}

impl Role {
    /// Role-to-permission lookup
    pub fn allows(self, permission: Permission) -> bool {
        match (self, permission) {
            (Role::Admin, _) => true,
            (Role::Worker, Permission::ManageCatalog | Permission::ManageStock) => true,
            (Role::Worker, Permission::ReadInbox) => false,
            (Role::Client, _) => false,
        }
    }
}

/// A registered user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    /// Unique user identifier
    pub id: Uuid,

    /// Login email, unique
    pub email: String,

    /// Display name
    pub name: String,

    /// Assigned role
    pub role: Role,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// Create a new account
    pub fn new(email: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            name: name.into(),
            role,
            created_at: Utc::now(),
        }
    }
}
