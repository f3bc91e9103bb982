// src/services/report_service.rs

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{collection::remote_body, Mutation, RemoteChange, SchoolStore, StoredEntity},
    models::{
        auth::Actor,
        report::{IncidentReport, ReportStatus, ReviewAction, ReviewEntry, SubmitReportPayload},
        staff::StaffPermission,
    },
    services::rbac_service::{can_perform, require},
};

/// Bullying/incident reports: submission by anyone, review by report managers.
#[derive(Clone)]
pub struct ReportService {
    store: SchoolStore,
}

impl ReportService {
    pub fn new(store: SchoolStore) -> Self {
        Self { store }
    }

    pub async fn submit_report(&self, actor: &Actor, input: SubmitReportPayload) -> Result<IncidentReport, AppError> {
        let report = IncidentReport {
            id: Uuid::new_v4().to_string(),
            reporter_id: actor.id.clone(),
            reporter_name: actor.name.clone(),
            is_anonymous: input.is_anonymous,
            victim: input.victim,
            incident_type: input.incident_type,
            priority: input.priority,
            location: input.location,
            description: input.description.trim().to_string(),
            photo_evidence: input.photo_evidence,
            status: ReportStatus::UnderReview,
            review_history: Vec::new(),
            decline_reason: None,
            created_at: Utc::now(),
        };

        let created = self
            .store
            .reports
            .mutate(|reports| {
                let mut next = reports.to_vec();
                next.push(report.clone());
                Ok(Mutation::new(next, report.clone()).mirrored(RemoteChange::Create {
                    resource: IncidentReport::RESOURCE,
                    body: remote_body(&report),
                }))
            })
            .await?;

        tracing::info!("report {} submitted ({:?}, {:?})", created.id, created.incident_type, created.priority);
        Ok(for_viewer(actor, created))
    }

    /// Report managers see everything, everyone else only what they reported.
    pub async fn list_reports(&self, actor: &Actor) -> Result<Vec<IncidentReport>, AppError> {
        let reports = self.store.reports.items().await?;
        let manages = can_perform(actor, StaffPermission::ManageReports, None);

        let mut visible: Vec<IncidentReport> = reports
            .iter()
            .filter(|r| manages || r.reporter_id == actor.id)
            .cloned()
            .map(|r| for_viewer(actor, r))
            .collect();
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(visible)
    }

    pub async fn get_report(&self, actor: &Actor, id: &str) -> Result<IncidentReport, AppError> {
        let report = self
            .store
            .reports
            .find(id)
            .await?
            .ok_or_else(|| AppError::not_found("Report", id))?;

        if report.reporter_id != actor.id {
            require(actor, StaffPermission::ManageReports, None)?;
        }
        Ok(for_viewer(actor, report))
    }

    pub async fn accept_report(&self, actor: &Actor, id: &str, notes: Option<String>) -> Result<IncidentReport, AppError> {
        self.review(actor, id, ReviewAction::Accepted, notes).await
    }

    pub async fn decline_report(&self, actor: &Actor, id: &str, reason: &str) -> Result<IncidentReport, AppError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::InvalidInput("A reason is required to decline a report.".into()));
        }
        self.review(actor, id, ReviewAction::Declined, Some(reason.to_string())).await
    }

    /// Appends a note without touching the status. Allowed at any stage.
    pub async fn add_review_note(&self, actor: &Actor, id: &str, notes: &str) -> Result<IncidentReport, AppError> {
        if notes.trim().is_empty() {
            return Err(AppError::InvalidInput("A note cannot be empty.".into()));
        }
        self.review(actor, id, ReviewAction::Note, Some(notes.trim().to_string())).await
    }

    async fn review(
        &self,
        actor: &Actor,
        id: &str,
        action: ReviewAction,
        notes: Option<String>,
    ) -> Result<IncidentReport, AppError> {
        require(actor, StaffPermission::ManageReports, None)?;

        let reviewed = self
            .store
            .reports
            .mutate(|reports| {
                let mut report = reports
                    .iter()
                    .find(|r| r.id == id)
                    .cloned()
                    .ok_or_else(|| AppError::not_found("Report", id))?;

                // 1. under_review -> accepted | declined, both terminal
                match action {
                    ReviewAction::Accepted | ReviewAction::Declined if report.is_terminal() => {
                        return Err(AppError::InvalidTransition(format!(
                            "Report {} has already been {}.",
                            id,
                            if report.status == ReportStatus::Accepted { "accepted" } else { "declined" }
                        )));
                    }
                    ReviewAction::Accepted => report.status = ReportStatus::Accepted,
                    ReviewAction::Declined => {
                        report.status = ReportStatus::Declined;
                        report.decline_reason = notes.clone();
                    }
                    ReviewAction::Note => {}
                }

                // 2. Append-only history
                report.review_history.push(ReviewEntry {
                    action,
                    reviewer_name: actor.name.clone(),
                    notes: notes.clone(),
                    timestamp: Utc::now(),
                });

                let next = reports.iter().map(|r| if r.id == id { report.clone() } else { r.clone() }).collect();
                Ok(Mutation::new(next, report.clone()).mirrored(RemoteChange::Update {
                    resource: IncidentReport::RESOURCE,
                    id: id.to_string(),
                    body: remote_body(&report),
                }))
            })
            .await?;

        Ok(for_viewer(actor, reviewed))
    }
}

/// Hides the reporter of anonymous reports from viewers without sensitive-data access.
/// Storage always keeps the real identity.
fn for_viewer(actor: &Actor, report: IncidentReport) -> IncidentReport {
    if report.reporter_id == actor.id || can_perform(actor, StaffPermission::AccessSensitiveData, None) {
        report
    } else {
        report.anonymized()
    }
}
