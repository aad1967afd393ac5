//! Reporting endpoints
//!
//! Summary counts over the lead collection, grouped by stage and market.

use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::{
    middleware::{require, scope_for, Session},
    models::{Action, Lead, LeadQuery, Market, PipelineStage, Resource, Scope},
    utils::AppError,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(get_summary))
        .route("/summary/export", get(export_summary))
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SummaryQuery {
    pub market: Option<Market>,
}

#[derive(Debug, Serialize)]
pub struct StageCount {
    pub stage: PipelineStage,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub total: usize,
    pub open: usize,
    pub closed_won: usize,
    pub closed_lost: usize,
    pub by_stage: Vec<StageCount>,
    pub by_market: BTreeMap<String, usize>,
}

async fn load_leads(
    state: &AppState,
    session: &Session,
    market: Option<Market>,
) -> Result<Vec<Lead>, AppError> {
    let mut query = LeadQuery {
        market,
        ..LeadQuery::default()
    };
    match scope_for(session, Resource::Reports) {
        Some(Scope::All) => {}
        Some(Scope::Team) => match session.team_id {
            Some(team_id) => query.team_id = Some(team_id),
            None => query.assignee_id = Some(session.user_id),
        },
        Some(Scope::Own) | None => query.assignee_id = Some(session.user_id),
    }

    state
        .store
        .list_leads(session.tenant_id, &query)
        .await
        .map_err(|e| AppError::Store(e.to_string()))
}

fn summarize(leads: &[Lead]) -> SummaryResponse {
    let by_stage = PipelineStage::all()
        .into_iter()
        .map(|stage| StageCount {
            stage,
            count: leads.iter().filter(|l| l.stage == stage).count(),
        })
        .collect();

    let mut by_market = BTreeMap::new();
    for lead in leads {
        *by_market.entry(lead.market.to_string()).or_insert(0) += 1;
    }

    SummaryResponse {
        total: leads.len(),
        open: leads.iter().filter(|l| !l.stage.is_terminal()).count(),
        closed_won: leads
            .iter()
            .filter(|l| l.stage == PipelineStage::ClosedWon)
            .count(),
        closed_lost: leads
            .iter()
            .filter(|l| l.stage == PipelineStage::ClosedLost)
            .count(),
        by_stage,
        by_market,
    }
}

async fn get_summary(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<SummaryResponse>, AppError> {
    require(&session, Resource::Reports, Action::View)?;

    let leads = load_leads(&state, &session, query.market).await?;
    Ok(Json(summarize(&leads)))
}

async fn export_summary(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, AppError> {
    require(&session, Resource::Reports, Action::Export)?;

    let leads = load_leads(&state, &session, query.market).await?;
    let summary = summarize(&leads);

    let mut writer = csv::Writer::from_writer(vec![]);
    writer
        .write_record(["stage", "count"])
        .map_err(|e| AppError::internal(e.to_string()))?;
    for entry in &summary.by_stage {
        writer
            .write_record([entry.stage.as_str(), &entry.count.to_string()])
            .map_err(|e| AppError::internal(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::internal(e.to_string()))?;
    let csv = String::from_utf8(bytes).map_err(|e| AppError::internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"pipeline-summary.csv\"",
            ),
        ],
        csv,
    ))
}
