//! Permission evaluation service
//!
//! Answers, for a (role, resource, action, optional module-override set)
//! tuple, whether the action is permitted and what data scope applies.
//! Evaluation is pure: no I/O, no session lookup. Callers supply the role
//! and override set from the current session, and an unknown role or
//! resource always resolves to deny.

use std::collections::HashSet;

use crate::models::{
    Action, EffectivePermissions, PermissionGrant, Resource, ResourceGrantView, Role, Scope,
    UserMgmtAction, UserVisibility,
};

const ALL_ACTIONS: &[Action] = &[
    Action::View,
    Action::Create,
    Action::Edit,
    Action::Delete,
    Action::Assign,
    Action::Export,
    Action::Import,
    Action::Manage,
];

const VIEW: &[Action] = &[Action::View];
const VIEW_EDIT: &[Action] = &[Action::View, Action::Edit];
const VIEW_EXPORT: &[Action] = &[Action::View, Action::Export];
const VIEW_MANAGE: &[Action] = &[Action::View, Action::Manage];
const CRUD: &[Action] = &[Action::View, Action::Create, Action::Edit, Action::Delete];
const LEAD_FULL: &[Action] = &[
    Action::View,
    Action::Create,
    Action::Edit,
    Action::Delete,
    Action::Assign,
    Action::Export,
    Action::Import,
];
const LEAD_TEAM: &[Action] = &[Action::View, Action::Create, Action::Edit, Action::Assign];
const LEAD_OWN: &[Action] = &[Action::View, Action::Create, Action::Edit];
const LEAD_BACKOFFICE: &[Action] = &[Action::View, Action::Edit, Action::Import, Action::Export];
const TASK_FULL: &[Action] = &[
    Action::View,
    Action::Create,
    Action::Edit,
    Action::Delete,
    Action::Assign,
];
const TASK_TEAM: &[Action] = &[Action::View, Action::Create, Action::Edit, Action::Assign];
const TASK_OWN: &[Action] = &[Action::View, Action::Create, Action::Edit];
const PROPERTY_EDIT: &[Action] = &[Action::View, Action::Create, Action::Edit];

const fn grant(actions: &'static [Action], scope: Scope) -> PermissionGrant {
    PermissionGrant { actions, scope }
}

/// Static role -> resource permission table.
///
/// Every entry doubles as the role's default module set: a resource with no
/// entry is invisible to the role unless a per-user override set names it.
fn role_grants(role: Role) -> &'static [(Resource, PermissionGrant)] {
    match role {
        Role::Admin => &[
            (Resource::Dashboard, grant(ALL_ACTIONS, Scope::All)),
            (Resource::Leads, grant(ALL_ACTIONS, Scope::All)),
            (Resource::Properties, grant(ALL_ACTIONS, Scope::All)),
            (Resource::Pipeline, grant(ALL_ACTIONS, Scope::All)),
            (Resource::Tasks, grant(ALL_ACTIONS, Scope::All)),
            (Resource::Team, grant(ALL_ACTIONS, Scope::All)),
            (Resource::Reports, grant(ALL_ACTIONS, Scope::All)),
            (Resource::Settings, grant(ALL_ACTIONS, Scope::All)),
        ],
        Role::Manager => &[
            (Resource::Dashboard, grant(VIEW, Scope::All)),
            (Resource::Leads, grant(LEAD_FULL, Scope::All)),
            (Resource::Properties, grant(CRUD, Scope::All)),
            (Resource::Pipeline, grant(VIEW_EDIT, Scope::All)),
            (Resource::Tasks, grant(TASK_FULL, Scope::All)),
            (Resource::Team, grant(VIEW_MANAGE, Scope::All)),
            (Resource::Reports, grant(VIEW_EXPORT, Scope::All)),
            (Resource::Settings, grant(VIEW, Scope::All)),
        ],
        Role::TeamLead => &[
            (Resource::Dashboard, grant(VIEW, Scope::Team)),
            (Resource::Leads, grant(LEAD_TEAM, Scope::Team)),
            (Resource::Properties, grant(VIEW, Scope::All)),
            (Resource::Pipeline, grant(VIEW_EDIT, Scope::Team)),
            (Resource::Tasks, grant(TASK_TEAM, Scope::Team)),
            (Resource::Team, grant(VIEW, Scope::Team)),
            (Resource::Reports, grant(VIEW, Scope::Team)),
        ],
        Role::Agent => &[
            (Resource::Dashboard, grant(VIEW, Scope::Own)),
            (Resource::Leads, grant(LEAD_OWN, Scope::Own)),
            (Resource::Properties, grant(VIEW, Scope::All)),
            (Resource::Pipeline, grant(VIEW_EDIT, Scope::Own)),
            (Resource::Tasks, grant(TASK_OWN, Scope::Own)),
        ],
        Role::Backoffice => &[
            (Resource::Dashboard, grant(VIEW, Scope::All)),
            (Resource::Leads, grant(LEAD_BACKOFFICE, Scope::All)),
            (Resource::Properties, grant(PROPERTY_EDIT, Scope::All)),
            (Resource::Tasks, grant(VIEW, Scope::All)),
            (Resource::Reports, grant(VIEW_EXPORT, Scope::All)),
        ],
    }
}

fn lookup(role: Role, resource: Resource) -> Option<&'static PermissionGrant> {
    role_grants(role)
        .iter()
        .find(|(r, _)| *r == resource)
        .map(|(_, g)| g)
}

/// Stateless permission evaluator over the static grant tables
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionEvaluator;

impl PermissionEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Check whether `action` on `resource` is permitted for `role`.
    ///
    /// A present override set is a hard gate applied before the role table:
    /// a resource missing from the set is denied no matter what the role's
    /// defaults grant. A resource present in the set but absent from the
    /// role table gets the minimal default of `view` only.
    pub fn has_permission(
        &self,
        role: Role,
        resource: Resource,
        action: Action,
        override_modules: Option<&HashSet<Resource>>,
    ) -> bool {
        if let Some(modules) = override_modules {
            if !modules.contains(&resource) {
                return false;
            }
        }

        match lookup(role, resource) {
            Some(entry) => entry.allows(action),
            None => override_modules.is_some() && action == Action::View,
        }
    }

    /// Data scope for a (role, resource) pair, or `None` when the role has
    /// no entry for that resource. Informational only: callers use it to
    /// constrain their store queries, the evaluator never filters rows.
    pub fn scope_for(&self, role: Role, resource: Resource) -> Option<Scope> {
        lookup(role, resource).map(|g| g.scope)
    }

    /// The fixed, ordered module set visible to a role absent any override
    pub fn default_modules(&self, role: Role) -> Vec<Resource> {
        Resource::all()
            .into_iter()
            .filter(|r| lookup(role, *r).is_some())
            .collect()
    }

    /// Navigation visibility gate: override-first, action-agnostic
    pub fn can_access_nav(
        &self,
        role: Role,
        resource: Resource,
        override_modules: Option<&HashSet<Resource>>,
    ) -> bool {
        match override_modules {
            Some(modules) => modules.contains(&resource),
            None => lookup(role, resource).is_some(),
        }
    }

    /// Minimum-role check via the fixed rank ordering
    pub fn has_minimum_role(&self, role: Role, minimum: Role) -> bool {
        role.rank() >= minimum.rank()
    }

    /// User-management delegation: may `actor` perform `op` on a user
    /// holding `target`? Deliberately separate from the resource table
    /// because role-to-role rules are finer grained.
    pub fn can_manage_user(&self, actor: Role, target: Role, op: UserMgmtAction) -> bool {
        match actor {
            Role::Admin => true,
            Role::Manager => matches!(target, Role::TeamLead | Role::Agent | Role::Backoffice),
            Role::TeamLead => target == Role::Agent && op == UserMgmtAction::Edit,
            Role::Agent | Role::Backoffice => false,
        }
    }

    /// Which users the role may see in team administration
    pub fn user_visibility(&self, role: Role) -> UserVisibility {
        match role {
            Role::Admin => UserVisibility::All,
            Role::Manager => UserVisibility::Market,
            Role::TeamLead => UserVisibility::Team,
            Role::Agent | Role::Backoffice => UserVisibility::None,
        }
    }

    /// Full summary for the permissions introspection endpoint
    pub fn effective_permissions(
        &self,
        role: Role,
        override_modules: Option<&HashSet<Resource>>,
    ) -> EffectivePermissions {
        let modules: Vec<Resource> = Resource::all()
            .into_iter()
            .filter(|r| self.can_access_nav(role, *r, override_modules))
            .collect();

        let grants = modules
            .iter()
            .map(|resource| {
                let (actions, scope) = match lookup(role, *resource) {
                    Some(g) => (g.actions.to_vec(), g.scope),
                    None => (VIEW.to_vec(), Scope::Own),
                };
                ResourceGrantView {
                    resource: *resource,
                    actions,
                    scope,
                }
            })
            .collect();

        EffectivePermissions {
            role: Some(role),
            modules,
            grants,
        }
    }
}
