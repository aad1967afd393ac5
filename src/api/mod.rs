//! API routes and handlers

use axum::{routing::get, Router};

use crate::AppState;

mod audit_logs;
mod health;
mod leads;
mod permissions;
mod pipeline;
mod properties;
mod reports;
mod tasks;
mod users;

pub use health::*;

/// Public API routes (no authentication required)
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/detailed", get(health::health_check_detailed))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
}

/// Protected API routes (authentication required)
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .nest("/leads", leads::routes())
        .nest("/pipeline", pipeline::routes())
        .nest("/users", users::routes())
        .nest("/tasks", tasks::routes())
        .nest("/properties", properties::routes())
        .nest("/audit-logs", audit_logs::routes())
        .nest("/permissions", permissions::routes())
        .nest("/reports", reports::routes())
}

/// Create the full API router (public + protected; useful for tests)
pub fn routes() -> Router<AppState> {
    public_routes().merge(protected_routes())
}
