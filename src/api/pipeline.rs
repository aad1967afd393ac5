//! Pipeline board API endpoints
//!
//! The board is rebuilt from the hosted store on every request; the
//! transition engine supplies the drag semantics, the optimistic apply and
//! the rollback-on-failure behavior. A failed persistence never surfaces as
//! a 5xx here: the move endpoint answers 200 with the reverted board and
//! the transient notification the client should toast.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    middleware::{require, scope_for, Session},
    models::{Action, Lead, LeadQuery, Market, NewAuditEntry, PipelineStage, Resource, Scope},
    services::{
        pipeline::{Notification, TransitionNotifier},
        BoardFilter, PipelineBoard, TransitionOutcome,
    },
    utils::AppError,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/board", get(get_board))
        .route("/move", post(move_lead))
}

/// Notifier that buffers notifications for the HTTP response
#[derive(Default)]
struct CollectingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl CollectingNotifier {
    fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notifications.lock().expect("notifier lock"))
    }
}

impl TransitionNotifier for CollectingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications
            .lock()
            .expect("notifier lock")
            .push(notification);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardQuery {
    pub market: Option<Market>,
    pub segment: Option<String>,
}

/// One rendered stage column
#[derive(Debug, Serialize)]
pub struct BoardColumn {
    pub stage: PipelineStage,
    pub leads: Vec<Lead>,
}

#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub columns: Vec<BoardColumn>,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub lead_id: Uuid,
    /// Drop target: another lead's id (drop-on-card) or a stage column id
    pub target: String,
}

#[derive(Debug, Serialize)]
pub struct MoveResponse {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<PipelineStage>,
    pub notifications: Vec<Notification>,
    pub columns: Vec<BoardColumn>,
}

/// Fetch the session-visible leads for the board
async fn load_board_leads(state: &AppState, session: &Session) -> Result<Vec<Lead>, AppError> {
    let mut query = LeadQuery::default();
    match scope_for(session, Resource::Pipeline) {
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

fn columns_of(board: &PipelineBoard, filter: &BoardFilter) -> Vec<BoardColumn> {
    board
        .columns(filter)
        .into_iter()
        .map(|column| BoardColumn {
            stage: column.stage,
            leads: column.leads.into_iter().cloned().collect(),
        })
        .collect()
}

async fn get_board(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<BoardQuery>,
) -> Result<Json<BoardResponse>, AppError> {
    require(&session, Resource::Pipeline, Action::View)?;

    let leads = load_board_leads(&state, &session).await?;
    let notifier = Arc::new(CollectingNotifier::default());
    let board = PipelineBoard::new(state.store.clone(), notifier, leads);

    let filter = BoardFilter {
        market: query.market,
        segment: query.segment,
    };

    Ok(Json(BoardResponse {
        columns: columns_of(&board, &filter),
    }))
}

async fn move_lead(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, AppError> {
    require(&session, Resource::Pipeline, Action::Edit)?;

    let leads = load_board_leads(&state, &session).await?;
    let notifier = Arc::new(CollectingNotifier::default());
    let mut board = PipelineBoard::new(state.store.clone(), notifier.clone(), leads);

    let old_stage = board
        .lead(payload.lead_id)
        .map(|l| l.stage)
        .ok_or_else(|| AppError::not_found("Lead is not on the board"))?;

    board
        .begin_drag(payload.lead_id)
        .map_err(|_| AppError::not_found("Lead is not on the board"))?;
    let outcome = board.complete_drag(payload.lead_id, &payload.target).await;

    let (outcome_name, stage) = match outcome {
        TransitionOutcome::Ignored => ("ignored", None),
        TransitionOutcome::Unchanged => ("unchanged", Some(old_stage)),
        TransitionOutcome::Committed(stage) => ("committed", Some(stage)),
        TransitionOutcome::RolledBack => ("rolled_back", Some(old_stage)),
    };

    if let TransitionOutcome::Committed(new_stage) = outcome {
        let name = board
            .lead(payload.lead_id)
            .map(|l| l.name.clone())
            .unwrap_or_default();
        state
            .audit
            .record(
                NewAuditEntry::new(
                    session.tenant_id,
                    Some(session.user_id),
                    "update_status",
                    "lead",
                )
                .resource_id(payload.lead_id)
                .resource_name(name)
                .old_values(serde_json::json!({ "stage": old_stage }))
                .new_values(serde_json::json!({ "stage": new_stage }))
                .metadata(serde_json::json!({ "via": "pipeline_drag" })),
            )
            .await;
    }

    Ok(Json(MoveResponse {
        outcome: outcome_name,
        stage,
        notifications: notifier.drain(),
        columns: columns_of(&board, &BoardFilter::default()),
    }))
}
