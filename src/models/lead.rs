//! Lead and pipeline stage models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Discrete phases of the sales lifecycle, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineStage {
    New,
    Contacted,
    Qualified,
    MeetingScheduled,
    MeetingHeld,
    Offer,
    Negotiation,
    ClosedWon,
    ClosedLost,
    Dormant,
}

impl PipelineStage {
    /// All stages in display order
    pub fn all() -> Vec<PipelineStage> {
        vec![
            PipelineStage::New,
            PipelineStage::Contacted,
            PipelineStage::Qualified,
            PipelineStage::MeetingScheduled,
            PipelineStage::MeetingHeld,
            PipelineStage::Offer,
            PipelineStage::Negotiation,
            PipelineStage::ClosedWon,
            PipelineStage::ClosedLost,
            PipelineStage::Dormant,
        ]
    }

    /// Terminal stages do not normally transition further but remain
    /// displayable while they hold leads.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineStage::ClosedWon | PipelineStage::ClosedLost | PipelineStage::Dormant
        )
    }

    /// Get the string representation (column id on the board)
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::New => "new",
            PipelineStage::Contacted => "contacted",
            PipelineStage::Qualified => "qualified",
            PipelineStage::MeetingScheduled => "meeting-scheduled",
            PipelineStage::MeetingHeld => "meeting-held",
            PipelineStage::Offer => "offer",
            PipelineStage::Negotiation => "negotiation",
            PipelineStage::ClosedWon => "closed-won",
            PipelineStage::ClosedLost => "closed-lost",
            PipelineStage::Dormant => "dormant",
        }
    }

    /// Parse a stage/column id
    pub fn parse(s: &str) -> Option<PipelineStage> {
        match s {
            "new" => Some(PipelineStage::New),
            "contacted" => Some(PipelineStage::Contacted),
            "qualified" => Some(PipelineStage::Qualified),
            "meeting-scheduled" => Some(PipelineStage::MeetingScheduled),
            "meeting-held" => Some(PipelineStage::MeetingHeld),
            "offer" => Some(PipelineStage::Offer),
            "negotiation" => Some(PipelineStage::Negotiation),
            "closed-won" => Some(PipelineStage::ClosedWon),
            "closed-lost" => Some(PipelineStage::ClosedLost),
            "dormant" => Some(PipelineStage::Dormant),
            _ => None,
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market a lead or property belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    National,
    International,
}

impl Market {
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::National => "national",
            Market::International => "international",
        }
    }

    pub fn parse(s: &str) -> Option<Market> {
        match s {
            "national" => Some(Market::National),
            "international" => Some(Market::International),
            _ => None,
        }
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prospective customer record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub stage: PipelineStage,
    pub market: Market,
    #[serde(default)]
    pub segment: Option<String>,
    /// Weak reference to the assigned user, if any
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
    #[serde(default)]
    pub budget_min_cents: Option<i64>,
    #[serde(default)]
    pub budget_max_cents: Option<i64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn default_currency() -> String {
    "EUR".to_string()
}

/// Request to create a lead (form submission or one CSV import row)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLeadRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub stage: Option<PipelineStage>,
    pub market: Market,
    #[serde(default)]
    pub segment: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub budget_min_cents: Option<i64>,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub budget_max_cents: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Partial update of a lead; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateLeadRequest {
    #[validate(length(min = 1, max = 200))]
    #[serde(default)]
    pub name: Option<String>,
    #[validate(email)]
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub market: Option<Market>,
    #[serde(default)]
    pub segment: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
    #[serde(default)]
    pub budget_min_cents: Option<i64>,
    #[serde(default)]
    pub budget_max_cents: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Explicit stage change (the non-drag path to a status update)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateLeadStatusRequest {
    pub stage: PipelineStage,
}

/// List filters for lead queries
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadQuery {
    pub stage: Option<PipelineStage>,
    pub market: Option<Market>,
    pub segment: Option<String>,
    pub assignee_id: Option<Uuid>,
    /// Restrict to leads assigned to members of this team
    pub team_id: Option<Uuid>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}
