// src/models/live_incident.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::db::collection::StoredEntity;
use crate::models::report::{IncidentLocation, IncidentType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LiveIncidentStatus {
    Active,
    Resolved,
}

/// Derived lifecycle phase, used for display colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IncidentPhase {
    NoResponse,
    HasResponders,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Responder {
    pub user_id: String,
    pub user_name: String,
    pub user_role: String,
    pub responded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiveIncident {
    pub id: String,
    pub location: IncidentLocation,
    pub incident_type: IncidentType,
    pub description: String,

    pub reporter_id: String,
    pub reporter_name: String,

    pub created_at: DateTime<Utc>,
    pub status: LiveIncidentStatus,

    #[serde(default)]
    pub responders: Vec<Responder>,

    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl LiveIncident {
    pub fn is_active(&self) -> bool {
        self.status == LiveIncidentStatus::Active
    }

    pub fn has_responder(&self, user_id: &str) -> bool {
        self.responders.iter().any(|r| r.user_id == user_id)
    }

    pub fn phase(&self) -> IncidentPhase {
        match (self.status, self.responders.is_empty()) {
            (LiveIncidentStatus::Resolved, _) => IncidentPhase::Resolved,
            (LiveIncidentStatus::Active, true) => IncidentPhase::NoResponse,
            (LiveIncidentStatus::Active, false) => IncidentPhase::HasResponders,
        }
    }
}

impl StoredEntity for LiveIncident {
    const STORAGE_KEY: &'static str = "school_live_incidents";
    const RESOURCE: &'static str = "live-incidents";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportLiveIncidentPayload {
    #[validate(nested)]
    pub location: IncidentLocation,
    pub incident_type: IncidentType,
    #[validate(length(min = 1, message = "Please describe what is happening."))]
    pub description: String,
}

/// What a viewer's pop-up shows right now.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertView {
    pub incident: LiveIncident,
    pub remaining_seconds: i64,
    pub window_seconds: i64,
}
