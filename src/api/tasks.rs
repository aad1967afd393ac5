//! Task API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    middleware::{require, scope_for, Session},
    models::{
        Action, CreateTaskRequest, NewAuditEntry, Resource, Scope, Task, TaskQuery,
        UpdateTaskRequest,
    },
    utils::AppError,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/{id}", patch(update_task).delete(delete_task))
}

fn apply_scope(session: &Session, query: &mut TaskQuery) {
    match scope_for(session, Resource::Tasks) {
        Some(Scope::All) => {}
        Some(Scope::Team) => match session.team_id {
            Some(team_id) => query.team_id = Some(team_id),
            None => query.assignee_id = Some(session.user_id),
        },
        Some(Scope::Own) | None => query.assignee_id = Some(session.user_id),
    }
}

async fn list_tasks(
    State(state): State<AppState>,
    session: Session,
    Query(mut query): Query<TaskQuery>,
) -> Result<Json<Vec<Task>>, AppError> {
    require(&session, Resource::Tasks, Action::View)?;
    apply_scope(&session, &mut query);

    let tasks = state
        .store
        .list_tasks(session.tenant_id, &query)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?;
    Ok(Json(tasks))
}

async fn create_task(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    require(&session, Resource::Tasks, Action::Create)?;
    if payload.assignee_id.is_some_and(|id| id != session.user_id) {
        require(&session, Resource::Tasks, Action::Assign)?;
    }
    payload.validate()?;

    let task = state
        .store
        .create_task(session.tenant_id, &payload)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?;

    state
        .audit
        .record(
            NewAuditEntry::new(session.tenant_id, Some(session.user_id), "create", "task")
                .resource_id(task.id)
                .resource_name(&task.title),
        )
        .await;

    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, AppError> {
    require(&session, Resource::Tasks, Action::Edit)?;
    if payload.assignee_id.is_some_and(|aid| aid != session.user_id) {
        require(&session, Resource::Tasks, Action::Assign)?;
    }
    payload.validate()?;

    let task = state
        .store
        .update_task(session.tenant_id, id, &payload)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?;

    state
        .audit
        .record(
            NewAuditEntry::new(session.tenant_id, Some(session.user_id), "update", "task")
                .resource_id(id)
                .resource_name(&task.title)
                .new_values(serde_json::to_value(&payload).unwrap_or_default()),
        )
        .await;

    Ok(Json(task))
}

async fn delete_task(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require(&session, Resource::Tasks, Action::Delete)?;

    state
        .store
        .delete_task(session.tenant_id, id)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?;

    state
        .audit
        .record(
            NewAuditEntry::new(session.tenant_id, Some(session.user_id), "delete", "task")
                .resource_id(id),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}
