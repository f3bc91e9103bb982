// src/models/report.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::db::collection::StoredEntity;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IncidentType {
    Physical,
    Verbal,
    Cyber,
    Social,
    Sexual,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

/// `UnderReview` is the only non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    UnderReview,
    Accepted,
    Declined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Accepted,
    Declined,
    Note,
}

// --- VALUE TYPES ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IncidentLocation {
    #[validate(length(min = 1, message = "Building is required."))]
    pub building_id: String,
    pub floor: u32,
    pub room: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VictimInfo {
    pub name: String,
    pub grade_level: Option<String>,
    pub section: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEntry {
    pub action: ReviewAction,
    pub reviewer_name: String,
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

// --- ENTITY ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncidentReport {
    pub id: String,

    // Reporter identity is always stored; anonymity only affects what viewers see.
    pub reporter_id: String,
    pub reporter_name: String,
    #[serde(default)]
    pub is_anonymous: bool,

    pub victim: VictimInfo,
    pub incident_type: IncidentType,
    pub priority: Priority,
    pub location: IncidentLocation,
    pub description: String,
    pub photo_evidence: Option<String>,

    pub status: ReportStatus,
    #[serde(default)]
    pub review_history: Vec<ReviewEntry>,
    pub decline_reason: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl IncidentReport {
    pub const ANONYMOUS_NAME: &'static str = "Anonymous";

    pub fn is_terminal(&self) -> bool {
        self.status != ReportStatus::UnderReview
    }

    /// Copy of the report as shown to a viewer who may not see the reporter.
    pub fn anonymized(mut self) -> Self {
        if self.is_anonymous {
            self.reporter_id.clear();
            self.reporter_name = Self::ANONYMOUS_NAME.to_string();
        }
        self
    }
}

impl StoredEntity for IncidentReport {
    const STORAGE_KEY: &'static str = "school_reports";
    const RESOURCE: &'static str = "reports";

    fn id(&self) -> &str {
        &self.id
    }
}

// --- PAYLOADS ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReportPayload {
    #[serde(default)]
    pub is_anonymous: bool,
    pub victim: VictimInfo,
    pub incident_type: IncidentType,
    pub priority: Priority,
    #[validate(nested)]
    pub location: IncidentLocation,
    #[validate(length(min = 1, message = "Please describe what happened."))]
    pub description: String,
    pub photo_evidence: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPayload {
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeclineReportPayload {
    #[validate(length(min = 1, message = "A reason is required to decline a report."))]
    pub reason: String,
}
