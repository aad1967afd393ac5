//! Role-Based Access Control (RBAC) models

use serde::{Deserialize, Serialize};

/// Roles a user can hold within a tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    TeamLead,
    Agent,
    Backoffice,
}

impl Role {
    /// Get all roles, highest rank first
    pub fn all() -> Vec<Role> {
        vec![
            Role::Admin,
            Role::Manager,
            Role::TeamLead,
            Role::Agent,
            Role::Backoffice,
        ]
    }

    /// Numeric rank used for minimum-role checks
    pub fn rank(&self) -> u8 {
        match self {
            Role::Admin => 5,
            Role::Manager => 4,
            Role::TeamLead => 3,
            Role::Agent => 2,
            Role::Backoffice => 1,
        }
    }

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::TeamLead => "team_lead",
            Role::Agent => "agent",
            Role::Backoffice => "backoffice",
        }
    }

    /// Get the display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Manager => "Manager",
            Role::TeamLead => "Team Lead",
            Role::Agent => "Agent",
            Role::Backoffice => "Back Office",
        }
    }

    /// Parse a role name. Unknown names return `None`; callers must treat
    /// an unknown role as having no access at all.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "team_lead" => Some(Role::TeamLead),
            "agent" => Some(Role::Agent),
            "backoffice" => Some(Role::Backoffice),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resources (application modules) that can be protected by RBAC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Dashboard,
    Leads,
    Properties,
    Pipeline,
    Tasks,
    Team,
    Reports,
    Settings,
}

impl Resource {
    /// Get all resources in navigation order
    pub fn all() -> Vec<Resource> {
        vec![
            Resource::Dashboard,
            Resource::Leads,
            Resource::Properties,
            Resource::Pipeline,
            Resource::Tasks,
            Resource::Team,
            Resource::Reports,
            Resource::Settings,
        ]
    }

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Dashboard => "dashboard",
            Resource::Leads => "leads",
            Resource::Properties => "properties",
            Resource::Pipeline => "pipeline",
            Resource::Tasks => "tasks",
            Resource::Team => "team",
            Resource::Reports => "reports",
            Resource::Settings => "settings",
        }
    }

    /// Parse a resource name. Unknown names return `None` and must be
    /// treated as deny by callers.
    pub fn parse(s: &str) -> Option<Resource> {
        match s {
            "dashboard" => Some(Resource::Dashboard),
            "leads" => Some(Resource::Leads),
            "properties" => Some(Resource::Properties),
            "pipeline" => Some(Resource::Pipeline),
            "tasks" => Some(Resource::Tasks),
            "team" => Some(Resource::Team),
            "reports" => Some(Resource::Reports),
            "settings" => Some(Resource::Settings),
            _ => None,
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actions that can be performed on resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    Assign,
    Export,
    Import,
    Manage,
}

impl Action {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Assign => "assign",
            Action::Export => "export",
            Action::Import => "import",
            Action::Manage => "manage",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row-visibility breadth a permission grant is limited to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Only rows assigned to the user
    Own,
    /// Rows belonging to the user's team
    Team,
    /// Every row in the tenant
    All,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Own => "own",
            Scope::Team => "team",
            Scope::All => "all",
        }
    }
}

/// A static permission entry: allowed actions plus the data scope they
/// operate under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionGrant {
    pub actions: &'static [Action],
    pub scope: Scope,
}

impl PermissionGrant {
    pub fn allows(&self, action: Action) -> bool {
        self.actions.contains(&action)
    }
}

/// Operations covered by the user-management delegation table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserMgmtAction {
    Create,
    Edit,
    Deactivate,
}

/// Which users a role may see in team administration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserVisibility {
    All,
    Market,
    Team,
    None,
}

/// Effective permission summary for the current session, as returned by the
/// introspection endpoint
#[derive(Debug, Clone, Serialize)]
pub struct EffectivePermissions {
    pub role: Option<Role>,
    pub modules: Vec<Resource>,
    pub grants: Vec<ResourceGrantView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceGrantView {
    pub resource: Resource,
    pub actions: Vec<Action>,
    pub scope: Scope,
}
