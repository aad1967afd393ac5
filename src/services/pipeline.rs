//! Pipeline transition engine
//!
//! Owns the in-memory board state for the kanban view: the loaded lead
//! collection, the drag gesture in progress, and the optimistic stage
//! mutation protocol against the backing lead store. A drop is applied to
//! the in-memory lead synchronously so the board re-renders at once, then
//! persisted; if persistence fails the change is rolled back and the
//! failure surfaced as a single transient notification.
//!
//! Collaborators are passed in at construction. The engine never reaches
//! into ambient session state.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::models::{Lead, Market, PipelineStage};

/// Backing store for lead stage changes. Implementations must be idempotent
/// under retry: persisting the same (lead, stage) pair twice is not an error
/// from the engine's point of view.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn update_status(&self, lead_id: Uuid, stage: PipelineStage) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A transient user-facing notification (rendered as a toast/banner)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Surface for transient notifications emitted by the engine
pub trait TransitionNotifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("lead {0} is not loaded on the board")]
    UnknownLead(Uuid),
}

/// Outcome of a completed drag gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The drop target did not resolve; nothing happened
    Ignored,
    /// Same-column drop; no store call, no mutation
    Unchanged,
    /// Optimistic update confirmed by the store
    Committed(PipelineStage),
    /// Store rejected the update; in-memory state was reverted
    RolledBack,
}

/// Token for one optimistic stage change, handed back by `apply` and
/// consumed by `confirm` or `rollback`. Carries the board generation so a
/// rollback that races a board reload is discarded instead of clobbering
/// freshly loaded data.
#[derive(Debug)]
pub struct StageChange {
    lead_id: Uuid,
    from: PipelineStage,
    to: PipelineStage,
    generation: u64,
}

impl StageChange {
    pub fn lead_id(&self) -> Uuid {
        self.lead_id
    }

    pub fn from_stage(&self) -> PipelineStage {
        self.from
    }

    pub fn to_stage(&self) -> PipelineStage {
        self.to
    }
}

/// Market/segment filter applied to the derived board view.
/// Filtering never mutates the canonical lead list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardFilter {
    pub market: Option<Market>,
    pub segment: Option<String>,
}

impl BoardFilter {
    fn matches(&self, lead: &Lead) -> bool {
        if let Some(market) = self.market {
            if lead.market != market {
                return false;
            }
        }
        if let Some(ref segment) = self.segment {
            if lead.segment.as_deref() != Some(segment.as_str()) {
                return false;
            }
        }
        true
    }
}

/// One rendered stage column
#[derive(Debug)]
pub struct StageColumn<'a> {
    pub stage: PipelineStage,
    pub leads: Vec<&'a Lead>,
}

/// The kanban board state machine
pub struct PipelineBoard {
    store: Arc<dyn LeadStore>,
    notifier: Arc<dyn TransitionNotifier>,
    leads: Vec<Lead>,
    /// Bumped on every reload; guards rollbacks against stale tokens
    generation: u64,
    dragging: Option<Uuid>,
    hover_target: Option<String>,
}

impl PipelineBoard {
    pub fn new(
        store: Arc<dyn LeadStore>,
        notifier: Arc<dyn TransitionNotifier>,
        leads: Vec<Lead>,
    ) -> Self {
        Self {
            store,
            notifier,
            leads,
            generation: 0,
            dragging: None,
            hover_target: None,
        }
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn lead(&self, id: Uuid) -> Option<&Lead> {
        self.leads.iter().find(|l| l.id == id)
    }

    pub fn dragging(&self) -> Option<Uuid> {
        self.dragging
    }

    pub fn hover_target(&self) -> Option<&str> {
        self.hover_target.as_deref()
    }

    /// Replace the lead collection with freshly loaded ground truth.
    /// Invalidates any in-flight stage-change tokens.
    pub fn set_leads(&mut self, leads: Vec<Lead>) {
        self.leads = leads;
        self.generation = self.generation.wrapping_add(1);
        self.dragging = None;
        self.hover_target = None;
    }

    /// Record which lead is being moved. No store side effect.
    pub fn begin_drag(&mut self, lead_id: Uuid) -> Result<(), PipelineError> {
        if self.lead(lead_id).is_none() {
            return Err(PipelineError::UnknownLead(lead_id));
        }
        self.dragging = Some(lead_id);
        Ok(())
    }

    /// Record the current drop candidate, for visual feedback only
    pub fn update_hover_target(&mut self, target: Option<String>) {
        self.hover_target = target;
    }

    /// Resolve a drop target id to a stage: another lead's id means that
    /// lead's current stage (drop-on-card), a stage column id means the
    /// stage itself.
    pub fn resolve_drop_target(&self, target: &str) -> Option<PipelineStage> {
        if let Ok(id) = Uuid::parse_str(target) {
            return self.lead(id).map(|l| l.stage);
        }
        PipelineStage::parse(target)
    }

    /// Complete a drag gesture: resolve the target, optimistically move the
    /// lead, persist, and roll back on store failure. Drag and hover state
    /// are cleared regardless of outcome, before the persistence await.
    pub async fn complete_drag(&mut self, lead_id: Uuid, target: &str) -> TransitionOutcome {
        let Some(new_stage) = self.resolve_drop_target(target) else {
            warn!(%lead_id, target, "drop target did not resolve, ignoring drag");
            self.clear_drag_state();
            return TransitionOutcome::Ignored;
        };

        let Some(current) = self.lead(lead_id).map(|l| l.stage) else {
            warn!(%lead_id, "dragged lead is not on the board, ignoring drag");
            self.clear_drag_state();
            return TransitionOutcome::Ignored;
        };

        // Dragging within the same column must not trigger a write
        if current == new_stage {
            self.clear_drag_state();
            return TransitionOutcome::Unchanged;
        }

        let token = self.apply(lead_id, new_stage);
        // The gesture is over once the optimistic state is visible; a new
        // drag may begin while the store call is still in flight.
        self.clear_drag_state();

        let store = self.store.clone();
        let result = store.update_status(lead_id, new_stage).await;
        match result {
            Ok(()) => {
                debug!(%lead_id, stage = %new_stage, "stage change confirmed");
                self.confirm(token);
                TransitionOutcome::Committed(new_stage)
            }
            Err(e) => {
                error!(%lead_id, stage = %new_stage, error = %e, "stage update failed, rolling back");
                self.rollback(token);
                self.notifier.notify(Notification::error(
                    "Could not move the lead. The change was undone, please retry.",
                ));
                TransitionOutcome::RolledBack
            }
        }
    }

    /// Apply a tentative stage change to the in-memory lead and return the
    /// token needed to confirm or revert it.
    pub fn apply(&mut self, lead_id: Uuid, to: PipelineStage) -> StageChange {
        let generation = self.generation;
        let from = self
            .leads
            .iter_mut()
            .find(|l| l.id == lead_id)
            .map(|lead| {
                let from = lead.stage;
                lead.stage = to;
                from
            })
            .unwrap_or(to);
        StageChange {
            lead_id,
            from,
            to,
            generation,
        }
    }

    /// The store accepted the change; the optimistic state is now truth.
    pub fn confirm(&mut self, token: StageChange) {
        debug!(lead_id = %token.lead_id, "stage change token confirmed");
    }

    /// Revert an optimistic change. A token minted before the last reload,
    /// or one whose lead no longer shows the tentative stage, is discarded.
    pub fn rollback(&mut self, token: StageChange) {
        if token.generation != self.generation {
            debug!(lead_id = %token.lead_id, "stale stage-change token, rollback discarded");
            return;
        }
        if let Some(lead) = self.leads.iter_mut().find(|l| l.id == token.lead_id) {
            if lead.stage == token.to {
                lead.stage = token.from;
            }
        }
    }

    /// Partition the (optionally filtered) leads into stage columns in
    /// display order. Non-terminal stages always render; terminal stages
    /// only while they hold at least one lead.
    pub fn columns(&self, filter: &BoardFilter) -> Vec<StageColumn<'_>> {
        PipelineStage::all()
            .into_iter()
            .filter_map(|stage| {
                let leads: Vec<&Lead> = self
                    .leads
                    .iter()
                    .filter(|l| l.stage == stage && filter.matches(l))
                    .collect();
                if stage.is_terminal() && leads.is_empty() {
                    None
                } else {
                    Some(StageColumn { stage, leads })
                }
            })
            .collect()
    }

    fn clear_drag_state(&mut self) {
        self.dragging = None;
        self.hover_target = None;
    }
}
