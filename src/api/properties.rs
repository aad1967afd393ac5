//! Property listing API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    middleware::{require, Session},
    models::{
        Action, CreatePropertyRequest, NewAuditEntry, Property, PropertyQuery, Resource,
        UpdatePropertyRequest,
    },
    utils::AppError,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_properties).post(create_property))
        .route(
            "/{id}",
            get(get_property)
                .patch(update_property)
                .delete(delete_property),
        )
}

async fn list_properties(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<PropertyQuery>,
) -> Result<Json<Vec<Property>>, AppError> {
    require(&session, Resource::Properties, Action::View)?;

    let properties = state
        .store
        .list_properties(session.tenant_id, &query)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?;
    Ok(Json(properties))
}

async fn get_property(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Property>, AppError> {
    require(&session, Resource::Properties, Action::View)?;

    let property = state
        .store
        .get_property(session.tenant_id, id)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?
        .ok_or_else(|| AppError::not_found("Property not found"))?;
    Ok(Json(property))
}

async fn create_property(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<Property>), AppError> {
    require(&session, Resource::Properties, Action::Create)?;
    payload.validate()?;

    let property = state
        .store
        .create_property(session.tenant_id, &payload)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?;

    state
        .audit
        .record(
            NewAuditEntry::new(
                session.tenant_id,
                Some(session.user_id),
                "create",
                "property",
            )
            .resource_id(property.id)
            .resource_name(&property.title),
        )
        .await;

    Ok((StatusCode::CREATED, Json(property)))
}

async fn update_property(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePropertyRequest>,
) -> Result<Json<Property>, AppError> {
    require(&session, Resource::Properties, Action::Edit)?;
    payload.validate()?;

    let old = state
        .store
        .get_property(session.tenant_id, id)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?
        .ok_or_else(|| AppError::not_found("Property not found"))?;

    let updated = state
        .store
        .update_property(session.tenant_id, id, &payload)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?;

    state
        .audit
        .record(
            NewAuditEntry::new(
                session.tenant_id,
                Some(session.user_id),
                "update",
                "property",
            )
            .resource_id(id)
            .resource_name(&updated.title)
            .old_values(serde_json::to_value(&old).unwrap_or_default())
            .new_values(serde_json::to_value(&updated).unwrap_or_default()),
        )
        .await;

    Ok(Json(updated))
}

async fn delete_property(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require(&session, Resource::Properties, Action::Delete)?;

    state
        .store
        .delete_property(session.tenant_id, id)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?;

    state
        .audit
        .record(
            NewAuditEntry::new(
                session.tenant_id,
                Some(session.user_id),
                "delete",
                "property",
            )
            .resource_id(id),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}
