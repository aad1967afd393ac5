//! Team administration API endpoints
//!
//! User management does not go through the generic resource table: the
//! delegation table answers which roles an actor may create, edit or
//! deactivate, and the visibility table answers which users the actor may
//! list at all.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    middleware::Session,
    models::{
        CreateUserRequest, NewAuditEntry, Role, UpdateUserRequest, User, UserMgmtAction,
        UserQuery, UserVisibility,
    },
    services::PermissionEvaluator,
    utils::AppError,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).patch(update_user))
        .route("/{id}/deactivate", post(deactivate_user))
}

fn actor_role(session: &Session) -> Result<Role, AppError> {
    session.role.ok_or_else(|| {
        AppError::forbidden(format!(
            "Role '{}' may not manage users",
            session.role_name
        ))
    })
}

/// Narrow a user listing to what the actor may see
fn apply_visibility(
    role: Role,
    session: &Session,
    query: &mut UserQuery,
) -> Result<(), AppError> {
    match PermissionEvaluator::new().user_visibility(role) {
        UserVisibility::All => Ok(()),
        UserVisibility::Market => {
            query.market = session.market;
            Ok(())
        }
        UserVisibility::Team => {
            match session.team_id {
                Some(team_id) => query.team_id = Some(team_id),
                // A team lead without a team assignment sees nobody
                None => query.team_id = Some(Uuid::nil()),
            }
            Ok(())
        }
        UserVisibility::None => Err(AppError::forbidden("Not allowed to list users")),
    }
}

/// Delegation check against the target's stored role.
///
/// A target holding an unrecognized role can only be managed by an admin;
/// anything narrower could let a mistyped role widen access.
fn check_delegation(actor: Role, target_role: &str, op: UserMgmtAction) -> Result<(), AppError> {
    let allowed = match Role::parse(target_role) {
        Some(target) => PermissionEvaluator::new().can_manage_user(actor, target, op),
        None => actor == Role::Admin,
    };
    if !allowed {
        return Err(AppError::forbidden(format!(
            "Role {} may not manage a {} user",
            actor, target_role
        )));
    }
    Ok(())
}

async fn list_users(
    State(state): State<AppState>,
    session: Session,
    Query(mut query): Query<UserQuery>,
) -> Result<Json<Vec<User>>, AppError> {
    let role = actor_role(&session)?;
    apply_visibility(role, &session, &mut query)?;

    let users = state
        .store
        .list_users(session.tenant_id, &query)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?;
    Ok(Json(users))
}

async fn get_user(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let role = actor_role(&session)?;
    if PermissionEvaluator::new().user_visibility(role) == UserVisibility::None {
        return Err(AppError::forbidden("Not allowed to view users"));
    }

    let user = state
        .store
        .get_user(session.tenant_id, id)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(user))
}

async fn create_user(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let role = actor_role(&session)?;
    payload.validate()?;
    check_delegation(role, payload.role.as_str(), UserMgmtAction::Create)?;

    let user = state
        .store
        .create_user(session.tenant_id, &payload)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?;

    state
        .audit
        .record(
            NewAuditEntry::new(session.tenant_id, Some(session.user_id), "create", "user")
                .resource_id(user.id)
                .resource_name(&user.name)
                .new_values(serde_json::json!({ "role": user.role })),
        )
        .await;

    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    let role = actor_role(&session)?;
    payload.validate()?;

    let old = state
        .store
        .get_user(session.tenant_id, id)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    check_delegation(role, &old.role, UserMgmtAction::Edit)?;
    // A role change must also be permitted against the role being granted
    if let Some(new_role) = payload.role {
        check_delegation(role, new_role.as_str(), UserMgmtAction::Edit)?;
    }

    let updated = state
        .store
        .update_user(session.tenant_id, id, &payload)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?;

    state
        .audit
        .record(
            NewAuditEntry::new(session.tenant_id, Some(session.user_id), "update", "user")
                .resource_id(id)
                .resource_name(&updated.name)
                .old_values(serde_json::json!({
                    "role": old.role,
                    "team_id": old.team_id,
                    "enabled_modules": old.enabled_modules,
                }))
                .new_values(serde_json::json!({
                    "role": updated.role,
                    "team_id": updated.team_id,
                    "enabled_modules": updated.enabled_modules,
                })),
        )
        .await;

    Ok(Json(updated))
}

async fn deactivate_user(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let role = actor_role(&session)?;

    let user = state
        .store
        .get_user(session.tenant_id, id)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    check_delegation(role, &user.role, UserMgmtAction::Deactivate)?;

    state
        .store
        .deactivate_user(session.tenant_id, id)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?;

    state
        .audit
        .record(
            NewAuditEntry::new(
                session.tenant_id,
                Some(session.user_id),
                "deactivate",
                "user",
            )
            .resource_id(id)
            .resource_name(&user.name),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}
