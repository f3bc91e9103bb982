// src/services/live_incident_service.rs

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{collection::remote_body, Mutation, RemoteChange, SchoolStore, StoredEntity},
    models::{
        auth::Actor,
        live_incident::{AlertView, LiveIncident, LiveIncidentStatus, ReportLiveIncidentPayload, Responder},
        staff::StaffPermission,
    },
    services::{alert_service::AlertCenter, rbac_service::can_perform},
};

/// Live safety alerts: raised by anyone, responded to by staff, resolved once.
#[derive(Clone)]
pub struct LiveIncidentService {
    store: SchoolStore,
    alerts: AlertCenter,
}

impl LiveIncidentService {
    pub fn new(store: SchoolStore, alerts: AlertCenter) -> Self {
        Self { store, alerts }
    }

    pub fn alerts(&self) -> &AlertCenter {
        &self.alerts
    }

    pub async fn report_live_incident(
        &self,
        actor: &Actor,
        input: ReportLiveIncidentPayload,
    ) -> Result<LiveIncident, AppError> {
        let incident = LiveIncident {
            id: Uuid::new_v4().to_string(),
            location: input.location,
            incident_type: input.incident_type,
            description: input.description.trim().to_string(),
            reporter_id: actor.id.clone(),
            reporter_name: actor.name.clone(),
            created_at: Utc::now(),
            status: LiveIncidentStatus::Active,
            responders: Vec::new(),
            resolved_by: None,
            resolved_at: None,
        };

        let created = self
            .store
            .live_incidents
            .mutate(|incidents| {
                let mut next = incidents.to_vec();
                next.push(incident.clone());
                Ok(Mutation::new(next, incident.clone()).mirrored(RemoteChange::Create {
                    resource: LiveIncident::RESOURCE,
                    body: remote_body(&incident),
                }))
            })
            .await?;

        tracing::warn!(
            "live incident {} raised at building {} floor {}",
            created.id,
            created.location.building_id,
            created.location.floor
        );
        Ok(created)
    }

    /// Arrival order is preserved.
    pub async fn list_incidents(&self) -> Result<Vec<LiveIncident>, AppError> {
        Ok(self.store.live_incidents.items().await?.to_vec())
    }

    pub async fn list_active_incidents(&self) -> Result<Vec<LiveIncident>, AppError> {
        let incidents = self.store.live_incidents.items().await?;
        Ok(incidents.iter().filter(|i| i.is_active()).cloned().collect())
    }

    pub async fn is_user_responding(&self, user_id: &str, incident_id: &str) -> Result<bool, AppError> {
        Ok(self
            .store
            .live_incidents
            .find(incident_id)
            .await?
            .is_some_and(|i| i.has_responder(user_id)))
    }

    /// Registers the actor as a responder. Responding again is a no-op.
    pub async fn respond_to_incident(&self, actor: &Actor, incident_id: &str) -> Result<LiveIncident, AppError> {
        if !actor.can_respond() {
            return Err(AppError::Forbidden("respond_to_incidents".into()));
        }

        let incident = self
            .store
            .live_incidents
            .mutate(|incidents| {
                let mut incident = find(incidents, incident_id)?.clone();
                if !incident.is_active() {
                    return Err(AppError::InvalidTransition(format!(
                        "Live incident {} is already resolved.",
                        incident_id
                    )));
                }
                if incident.has_responder(&actor.id) {
                    return Ok(Mutation::unchanged(incident));
                }

                incident.responders.push(Responder {
                    user_id: actor.id.clone(),
                    user_name: actor.name.clone(),
                    user_role: actor.role_label().to_string(),
                    responded_at: Utc::now(),
                });
                replace(incidents, incident)
            })
            .await?;

        self.alerts.mark_responded(&actor.id, incident_id).await;
        tracing::info!("{} is responding to live incident {}", actor.id, incident_id);
        Ok(incident)
    }

    /// Terminal. Resolving an already-resolved incident fails.
    pub async fn resolve_incident(&self, actor: &Actor, incident_id: &str) -> Result<LiveIncident, AppError> {
        let incident = self
            .store
            .live_incidents
            .mutate(|incidents| {
                let mut incident = find(incidents, incident_id)?.clone();

                let authorized = incident.has_responder(&actor.id)
                    || (actor.can_respond() && can_perform(actor, StaffPermission::ManageReports, None));
                if !authorized {
                    return Err(AppError::Forbidden(StaffPermission::ManageReports.slug().to_string()));
                }
                if !incident.is_active() {
                    return Err(AppError::InvalidTransition(format!(
                        "Live incident {} is already resolved.",
                        incident_id
                    )));
                }

                incident.status = LiveIncidentStatus::Resolved;
                incident.resolved_by = Some(actor.name.clone());
                incident.resolved_at = Some(Utc::now());
                replace(incidents, incident)
            })
            .await?;

        tracing::info!("live incident {} resolved by {}", incident_id, actor.id);
        Ok(incident)
    }

    /// Local to the viewer's session; the incident is not touched.
    pub async fn dismiss_alert(&self, actor: &Actor, incident_id: &str) -> Result<(), AppError> {
        if self.store.live_incidents.find(incident_id).await?.is_none() {
            return Err(AppError::not_found("Live incident", incident_id));
        }
        self.alerts.dismiss(&actor.id, incident_id).await;
        Ok(())
    }

    pub async fn current_alert(&self, actor: &Actor, now: DateTime<Utc>) -> Result<Option<AlertView>, AppError> {
        self.alerts.current_alert(&actor.id, now).await
    }
}

fn find<'a>(incidents: &'a [LiveIncident], id: &str) -> Result<&'a LiveIncident, AppError> {
    incidents
        .iter()
        .find(|i| i.id == id)
        .ok_or_else(|| AppError::not_found("Live incident", id))
}

fn replace(incidents: &[LiveIncident], incident: LiveIncident) -> Result<Mutation<LiveIncident, LiveIncident>, AppError> {
    let next = incidents
        .iter()
        .map(|i| if i.id == incident.id { incident.clone() } else { i.clone() })
        .collect();
    let change = RemoteChange::Update {
        resource: LiveIncident::RESOURCE,
        id: incident.id.clone(),
        body: remote_body(&incident),
    };
    Ok(Mutation::new(next, incident).mirrored(change))
}
