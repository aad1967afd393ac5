//! Audit log API endpoints

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::{
    db::AuditRepository,
    middleware::{require_nav, Session},
    models::{AuditLogEntry, AuditLogQuery, Resource, Role},
    services::PermissionEvaluator,
    utils::AppError,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_audit_logs))
}

/// Audit history is management territory: manager rank or above
fn can_view_audit_logs(session: &Session) -> bool {
    session
        .role
        .is_some_and(|role| PermissionEvaluator::new().has_minimum_role(role, Role::Manager))
}

async fn list_audit_logs(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<Vec<AuditLogEntry>>, AppError> {
    // The audit view lives under the settings module in the dashboard;
    // hiding that module hides the trail too
    require_nav(&session, Resource::Settings)?;
    if !can_view_audit_logs(&session) {
        return Err(AppError::forbidden("Not allowed to view audit logs"));
    }

    let repo = AuditRepository::new(&state.db);
    let logs = repo.list(session.tenant_id, &query).await.map_err(|e| {
        tracing::error!("Failed to list audit logs: {}", e);
        AppError::internal("Failed to list audit logs")
    })?;

    Ok(Json(logs))
}
