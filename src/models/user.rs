//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Market, Resource, Role};

/// User entity
///
/// The role is kept as the raw string from the store plus the parsed enum:
/// an unknown role name must load cleanly and evaluate as "no access"
/// rather than failing the whole row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub team_id: Option<Uuid>,
    #[serde(default)]
    pub market: Option<Market>,
    /// Per-user module override set. `None` means the role defaults apply;
    /// when present it is authoritative for module visibility.
    #[serde(default)]
    pub enabled_modules: Option<Vec<Resource>>,
    /// Weak back-reference to the external identity provider
    #[serde(default)]
    pub auth_id: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl User {
    /// Parsed role; `None` for unrecognized role names
    pub fn parsed_role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub team_id: Option<Uuid>,
    #[serde(default)]
    pub market: Option<Market>,
    #[serde(default)]
    pub enabled_modules: Option<Vec<Resource>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 200))]
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub team_id: Option<Uuid>,
    #[serde(default)]
    pub market: Option<Market>,
    /// `Some(None)` is not expressible over JSON; clearing the override set
    /// goes through `clear_modules` instead.
    #[serde(default)]
    pub enabled_modules: Option<Vec<Resource>>,
    #[serde(default)]
    pub clear_modules: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserQuery {
    pub role: Option<Role>,
    pub team_id: Option<Uuid>,
    pub market: Option<Market>,
    pub active: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}
