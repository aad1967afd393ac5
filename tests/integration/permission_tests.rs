//! Permission evaluator scenario tests
//!
//! Table-driven cases over the public evaluator API.

use std::collections::HashSet;

use rstest::rstest;

use inmo_crm::models::{Action, Resource, Role, Scope};
use inmo_crm::services::PermissionEvaluator;

fn overrides(resources: &[Resource]) -> HashSet<Resource> {
    resources.iter().copied().collect()
}

#[rstest]
#[case(Role::Agent, Resource::Leads, Action::Delete, false)]
#[case(Role::Agent, Resource::Leads, Action::View, true)]
#[case(Role::Agent, Resource::Leads, Action::Create, true)]
#[case(Role::Agent, Resource::Team, Action::View, false)]
#[case(Role::Manager, Resource::Leads, Action::Delete, true)]
#[case(Role::Manager, Resource::Leads, Action::Import, true)]
#[case(Role::TeamLead, Resource::Leads, Action::Assign, true)]
#[case(Role::TeamLead, Resource::Leads, Action::Delete, false)]
#[case(Role::Backoffice, Resource::Leads, Action::Export, true)]
#[case(Role::Backoffice, Resource::Pipeline, Action::View, false)]
#[case(Role::Admin, Resource::Settings, Action::Manage, true)]
fn test_role_table(
    #[case] role: Role,
    #[case] resource: Resource,
    #[case] action: Action,
    #[case] expected: bool,
) {
    let eval = PermissionEvaluator::new();
    assert_eq!(
        eval.has_permission(role, resource, action, None),
        expected,
        "{} {} on {}",
        role,
        action,
        resource
    );
}

#[rstest]
#[case(Role::Agent, Resource::Leads, Some(Scope::Own))]
#[case(Role::TeamLead, Resource::Leads, Some(Scope::Team))]
#[case(Role::Manager, Resource::Leads, Some(Scope::All))]
#[case(Role::Backoffice, Resource::Pipeline, None)]
fn test_scope_table(
    #[case] role: Role,
    #[case] resource: Resource,
    #[case] expected: Option<Scope>,
) {
    assert_eq!(
        PermissionEvaluator::new().scope_for(role, resource),
        expected
    );
}

#[test]
fn test_override_absence_wins_over_role_defaults() {
    let eval = PermissionEvaluator::new();
    let set = overrides(&[Resource::Dashboard, Resource::Leads]);

    for action in [Action::View, Action::Edit, Action::Manage] {
        assert!(
            !eval.has_permission(Role::Admin, Resource::Team, action, Some(&set)),
            "override absence must deny {} even for admin",
            action
        );
    }
    assert!(!eval.can_access_nav(Role::Admin, Resource::Team, Some(&set)));
}

#[test]
fn test_minimal_view_grant_for_override_listed_resource() {
    let eval = PermissionEvaluator::new();
    // Backoffice has no table entry for pipeline, but the override lists it
    let set = overrides(&[Resource::Pipeline]);

    assert!(eval.has_permission(Role::Backoffice, Resource::Pipeline, Action::View, Some(&set)));
    assert!(!eval.has_permission(
        Role::Backoffice,
        Resource::Pipeline,
        Action::Delete,
        Some(&set)
    ));
}

#[rstest]
#[case(Role::Admin, Role::Manager, true)]
#[case(Role::Manager, Role::Manager, true)]
#[case(Role::TeamLead, Role::Manager, false)]
#[case(Role::Backoffice, Role::Agent, false)]
fn test_minimum_role(#[case] role: Role, #[case] minimum: Role, #[case] expected: bool) {
    assert_eq!(
        PermissionEvaluator::new().has_minimum_role(role, minimum),
        expected
    );
}
