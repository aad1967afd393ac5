//! Permission-check helpers for handlers
//!
//! Thin bridge between the session and the pure evaluator: handlers call
//! `require` before acting and `scope_for` when building store queries.
//! A session with an unknown role always fails the check.

use crate::{
    models::{Action, Resource, Scope},
    services::PermissionEvaluator,
    utils::AppError,
};

use super::auth::Session;

/// Check that the session may perform `action` on `resource`
pub fn require(session: &Session, resource: Resource, action: Action) -> Result<(), AppError> {
    let Some(role) = session.role else {
        return Err(AppError::forbidden(format!(
            "Role '{}' has no access to {}",
            session.role_name, resource
        )));
    };

    let evaluator = PermissionEvaluator::new();
    if !evaluator.has_permission(role, resource, action, session.modules.as_ref()) {
        return Err(AppError::forbidden(format!(
            "Not allowed to {} {}",
            action, resource
        )));
    }

    Ok(())
}

/// Check that the session may see `resource` in navigation at all
pub fn require_nav(session: &Session, resource: Resource) -> Result<(), AppError> {
    let Some(role) = session.role else {
        return Err(AppError::forbidden(format!(
            "Role '{}' has no access to {}",
            session.role_name, resource
        )));
    };

    let evaluator = PermissionEvaluator::new();
    if !evaluator.can_access_nav(role, resource, session.modules.as_ref()) {
        return Err(AppError::forbidden(format!("No access to {}", resource)));
    }

    Ok(())
}

/// Data scope the session operates under for `resource`.
///
/// `None` for an unknown role or a resource the role has no entry for;
/// callers treat that as the narrowest possible query.
pub fn scope_for(session: &Session, resource: Resource) -> Option<Scope> {
    let role = session.role?;
    PermissionEvaluator::new().scope_for(role, resource)
}
