//! Permission introspection endpoints
//!
//! Lets the frontend ask what the current session may see and do, instead
//! of re-deriving the grant tables client-side.

use axum::{extract::State, routing::get, Json, Router};

use crate::{
    middleware::Session,
    models::EffectivePermissions,
    services::PermissionEvaluator,
    utils::AppError,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(get_effective_permissions))
}

async fn get_effective_permissions(
    State(_state): State<AppState>,
    session: Session,
) -> Result<Json<EffectivePermissions>, AppError> {
    let effective = match session.role {
        Some(role) => {
            PermissionEvaluator::new().effective_permissions(role, session.modules.as_ref())
        }
        // Unknown role: no modules, no grants
        None => EffectivePermissions {
            role: None,
            modules: vec![],
            grants: vec![],
        },
    };

    Ok(Json(effective))
}
