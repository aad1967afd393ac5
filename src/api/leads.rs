//! Lead API endpoints
//!
//! Every handler consults the permission evaluator before acting; list
//! queries are narrowed to the session's data scope before they reach the
//! hosted store. Mutations record audit entries through the sink, which
//! swallows its own failures.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    middleware::{require, scope_for, Session},
    models::{
        Action, CreateLeadRequest, Lead, LeadQuery, NewAuditEntry, Resource, Scope,
        UpdateLeadRequest, UpdateLeadStatusRequest,
    },
    services::csv_import::{self, CsvRowError},
    utils::{validation, AppError},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_leads).post(create_lead))
        .route("/import", post(import_leads))
        .route("/export", get(export_leads))
        .route("/{id}", get(get_lead).patch(update_lead))
        .route("/{id}/status", put(update_lead_status))
}

/// Field checks the validator derives do not cover
fn check_optional_fields(
    phone: Option<&str>,
    currency: Option<&str>,
    segment: Option<&str>,
) -> Result<(), AppError> {
    if let Some(phone) = phone {
        if !validation::validate_phone(phone) {
            return Err(AppError::ValidationError(format!(
                "invalid phone number: {}",
                phone
            )));
        }
    }
    if let Some(currency) = currency {
        if !validation::validate_currency(currency) {
            return Err(AppError::ValidationError(format!(
                "invalid currency code: {}",
                currency
            )));
        }
    }
    if let Some(segment) = segment {
        if !validation::validate_segment(segment) {
            return Err(AppError::ValidationError(format!(
                "invalid segment: {}",
                segment
            )));
        }
    }
    Ok(())
}

/// Narrow a lead query to the rows the session's scope allows.
///
/// `own` forces the assignee filter to the current user; `team` forces the
/// team filter; a missing team assignment under team scope degrades to own.
fn apply_scope(session: &Session, query: &mut LeadQuery) {
    match scope_for(session, Resource::Leads) {
        Some(Scope::All) => {}
        Some(Scope::Team) => match session.team_id {
            Some(team_id) => query.team_id = Some(team_id),
            None => query.assignee_id = Some(session.user_id),
        },
        Some(Scope::Own) | None => query.assignee_id = Some(session.user_id),
    }
}

async fn list_leads(
    State(state): State<AppState>,
    session: Session,
    Query(mut query): Query<LeadQuery>,
) -> Result<Json<Vec<Lead>>, AppError> {
    require(&session, Resource::Leads, Action::View)?;
    apply_scope(&session, &mut query);

    let leads = state
        .store
        .list_leads(session.tenant_id, &query)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?;
    Ok(Json(leads))
}

async fn get_lead(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Lead>, AppError> {
    require(&session, Resource::Leads, Action::View)?;

    let lead = state
        .store
        .get_lead(session.tenant_id, id)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?
        .ok_or_else(|| AppError::not_found("Lead not found"))?;
    Ok(Json(lead))
}

async fn create_lead(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateLeadRequest>,
) -> Result<(StatusCode, Json<Lead>), AppError> {
    require(&session, Resource::Leads, Action::Create)?;
    payload.validate()?;
    check_optional_fields(
        payload.phone.as_deref(),
        payload.currency.as_deref(),
        payload.segment.as_deref(),
    )?;
    if !validation::validate_budget_range(payload.budget_min_cents, payload.budget_max_cents) {
        return Err(AppError::ValidationError(
            "budget minimum exceeds maximum".to_string(),
        ));
    }

    let lead = state
        .store
        .create_lead(session.tenant_id, &payload)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?;

    state
        .audit
        .record(
            NewAuditEntry::new(session.tenant_id, Some(session.user_id), "create", "lead")
                .resource_id(lead.id)
                .resource_name(&lead.name)
                .new_values(serde_json::json!({
                    "stage": lead.stage,
                    "market": lead.market,
                })),
        )
        .await;

    Ok((StatusCode::CREATED, Json(lead)))
}

async fn update_lead(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLeadRequest>,
) -> Result<Json<Lead>, AppError> {
    require(&session, Resource::Leads, Action::Edit)?;
    if payload.assignee_id.is_some() {
        require(&session, Resource::Leads, Action::Assign)?;
    }
    payload.validate()?;
    check_optional_fields(
        payload.phone.as_deref(),
        payload.currency.as_deref(),
        payload.segment.as_deref(),
    )?;

    let old = state
        .store
        .get_lead(session.tenant_id, id)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?
        .ok_or_else(|| AppError::not_found("Lead not found"))?;

    let updated = state
        .store
        .update_lead(session.tenant_id, id, &payload)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?;

    state
        .audit
        .record(
            NewAuditEntry::new(session.tenant_id, Some(session.user_id), "update", "lead")
                .resource_id(id)
                .resource_name(&updated.name)
                .old_values(serde_json::to_value(&old).unwrap_or_default())
                .new_values(serde_json::to_value(&updated).unwrap_or_default()),
        )
        .await;

    Ok(Json(updated))
}

/// Explicit stage change, the non-drag path to a status update.
///
/// Archival works through this endpoint too: moving a lead to a terminal
/// stage (closed-won, closed-lost, dormant) is the soft-delete flow; leads
/// are never hard-deleted.
async fn update_lead_status(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLeadStatusRequest>,
) -> Result<Json<Lead>, AppError> {
    require(&session, Resource::Leads, Action::Edit)?;

    let old = state
        .store
        .get_lead(session.tenant_id, id)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?
        .ok_or_else(|| AppError::not_found("Lead not found"))?;

    // Same-stage updates are idempotent: no store write, no audit entry
    if old.stage == payload.stage {
        return Ok(Json(old));
    }

    state
        .store
        .update_lead_status(id, payload.stage)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?;

    state
        .audit
        .record(
            NewAuditEntry::new(
                session.tenant_id,
                Some(session.user_id),
                "update_status",
                "lead",
            )
            .resource_id(id)
            .resource_name(&old.name)
            .old_values(serde_json::json!({ "stage": old.stage }))
            .new_values(serde_json::json!({ "stage": payload.stage })),
        )
        .await;

    let mut lead = old;
    lead.stage = payload.stage;
    Ok(Json(lead))
}

/// Outcome of a CSV import
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub imported: usize,
    pub errors: Vec<CsvRowError>,
}

async fn import_leads(
    State(state): State<AppState>,
    session: Session,
    body: String,
) -> Result<Json<ImportResponse>, AppError> {
    require(&session, Resource::Leads, Action::Import)?;

    let report = csv_import::parse_leads_csv(body.as_bytes())
        .map_err(|e| AppError::BadRequest(format!("line {}: {}", e.line, e.message)))?;

    let mut imported = 0usize;
    let mut errors = report.errors;
    for row in &report.rows {
        match state.store.create_lead(session.tenant_id, row).await {
            Ok(_) => imported += 1,
            Err(e) => errors.push(CsvRowError {
                line: 0,
                message: format!("{}: {}", row.name, e),
            }),
        }
    }

    state
        .audit
        .record(
            NewAuditEntry::new(session.tenant_id, Some(session.user_id), "import", "lead")
                .metadata(serde_json::json!({
                    "imported": imported,
                    "failed": errors.len(),
                })),
        )
        .await;

    Ok(Json(ImportResponse { imported, errors }))
}

async fn export_leads(
    State(state): State<AppState>,
    session: Session,
    Query(mut query): Query<LeadQuery>,
) -> Result<impl IntoResponse, AppError> {
    require(&session, Resource::Leads, Action::Export)?;
    apply_scope(&session, &mut query);

    let leads = state
        .store
        .list_leads(session.tenant_id, &query)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?;

    let csv = csv_import::export_leads_csv(&leads)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"leads.csv\"",
            ),
        ],
        csv,
    ))
}
