// src/services/alert_service.rs

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use utoipa::ToSchema;

use crate::db::Collection;
use crate::models::live_incident::{AlertView, LiveIncident};

/// How long a new live incident stays eligible for the urgent pop-up.
pub const ALERT_WINDOW_SECS: i64 = 25;

/// Per-viewer visibility of one incident's pop-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AlertVisibility {
    New,
    AlertShown,
    Dismissed,
    RespondedTo,
}

pub fn elapsed_seconds(incident: &LiveIncident, now: DateTime<Utc>) -> i64 {
    (now - incident.created_at).num_seconds()
}

/// `max(0, window - elapsed)`.
pub fn remaining_seconds(incident: &LiveIncident, now: DateTime<Utc>) -> i64 {
    (ALERT_WINDOW_SECS - elapsed_seconds(incident, now)).max(0)
}

/// Active, younger than the window, not dismissed and not already being responded to by this viewer.
pub fn is_alert_eligible(
    incident: &LiveIncident,
    viewer_id: &str,
    dismissed: &HashSet<String>,
    now: DateTime<Utc>,
) -> bool {
    incident.is_active()
        && elapsed_seconds(incident, now) < ALERT_WINDOW_SECS
        && !dismissed.contains(&incident.id)
        && !incident.has_responder(viewer_id)
}

/// First eligible incident in arrival order.
pub fn select_next_alert<'a>(
    incidents: &'a [LiveIncident],
    viewer_id: &str,
    dismissed: &HashSet<String>,
    now: DateTime<Utc>,
) -> Option<&'a LiveIncident> {
    incidents
        .iter()
        .find(|incident| is_alert_eligible(incident, viewer_id, dismissed, now))
}

// =========================================================================
//  PER-VIEWER SESSION
// =========================================================================

/// Alert state for one signed-in viewer. Lives only as long as the process.
#[derive(Debug, Clone)]
pub struct AlertSession {
    viewer_id: String,
    dismissed: HashSet<String>,
    visibility: HashMap<String, AlertVisibility>,
    current: Option<String>,
    // Only mounted sessions receive ticks.
    mounted: bool,
}

impl AlertSession {
    pub fn new(viewer_id: impl Into<String>) -> Self {
        Self {
            viewer_id: viewer_id.into(),
            dismissed: HashSet::new(),
            visibility: HashMap::new(),
            current: None,
            mounted: false,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn visibility(&self, incident_id: &str) -> AlertVisibility {
        self.visibility.get(incident_id).copied().unwrap_or(AlertVisibility::New)
    }

    pub fn current_incident_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Keeps the alert on screen while it stays eligible, otherwise promotes the next one.
    pub fn refresh(&mut self, incidents: &[LiveIncident], now: DateTime<Utc>) -> Option<AlertView> {
        if let Some(current_id) = self.current.clone() {
            let still_eligible = incidents
                .iter()
                .find(|i| i.id == current_id)
                .is_some_and(|i| is_alert_eligible(i, &self.viewer_id, &self.dismissed, now));
            if !still_eligible {
                self.current = None;
            }
        }

        if self.current.is_none() {
            if let Some(next) = select_next_alert(incidents, &self.viewer_id, &self.dismissed, now) {
                self.current = Some(next.id.clone());
                self.visibility.insert(next.id.clone(), AlertVisibility::AlertShown);
            }
        }

        let current_id = self.current.as_deref()?;
        let incident = incidents.iter().find(|i| i.id == current_id)?;
        Some(AlertView {
            incident: incident.clone(),
            remaining_seconds: remaining_seconds(incident, now),
            window_seconds: ALERT_WINDOW_SECS,
        })
    }

    /// One countdown step. Auto-dismisses the alert at zero; the incident itself is untouched.
    pub fn tick(&mut self, incidents: &[LiveIncident], now: DateTime<Utc>) {
        let expired = self.current.as_deref().and_then(|id| incidents.iter().find(|i| i.id == id)).map(|incident| {
            remaining_seconds(incident, now) == 0
        });

        match expired {
            Some(true) => {
                if let Some(id) = self.current.clone() {
                    self.dismiss(&id);
                }
            }
            // Gone from the collection
            None if self.current.is_some() => self.current = None,
            _ => {}
        }
    }

    /// Suppresses future pop-ups for this incident in this session only.
    pub fn dismiss(&mut self, incident_id: &str) {
        self.dismissed.insert(incident_id.to_string());
        if self.visibility(incident_id) != AlertVisibility::RespondedTo {
            self.visibility.insert(incident_id.to_string(), AlertVisibility::Dismissed);
        }
        if self.current.as_deref() == Some(incident_id) {
            self.current = None;
        }
    }

    pub fn mark_responded(&mut self, incident_id: &str) {
        self.dismissed.insert(incident_id.to_string());
        self.visibility.insert(incident_id.to_string(), AlertVisibility::RespondedTo);
        if self.current.as_deref() == Some(incident_id) {
            self.current = None;
        }
    }
}

// =========================================================================
//  SHARED CENTER
// =========================================================================

/// All mounted viewer sessions, advanced together by one tick source.
#[derive(Clone)]
pub struct AlertCenter {
    sessions: Arc<Mutex<HashMap<String, AlertSession>>>,
    incidents: Arc<Collection<LiveIncident>>,
}

impl AlertCenter {
    pub fn new(incidents: Arc<Collection<LiveIncident>>) -> Self {
        Self { sessions: Arc::new(Mutex::new(HashMap::new())), incidents }
    }

    /// Mounts the viewer's alert (subscribing it to ticks) and returns what the pop-up shows.
    pub async fn current_alert(
        &self,
        viewer_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AlertView>, crate::common::error::AppError> {
        let incidents = self.incidents.items().await?;
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .entry(viewer_id.to_string())
            .or_insert_with(|| AlertSession::new(viewer_id));
        session.mounted = true;
        Ok(session.refresh(&incidents, now))
    }

    pub async fn dismiss(&self, viewer_id: &str, incident_id: &str) {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(viewer_id.to_string())
            .or_insert_with(|| AlertSession::new(viewer_id))
            .dismiss(incident_id);
    }

    pub async fn mark_responded(&self, viewer_id: &str, incident_id: &str) {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(viewer_id.to_string())
            .or_insert_with(|| AlertSession::new(viewer_id))
            .mark_responded(incident_id);
    }

    /// Unsubscribes the viewer from ticks. Dismissals are kept for the rest of the session.
    pub async fn unmount(&self, viewer_id: &str) -> bool {
        match self.sessions.lock().await.get_mut(viewer_id) {
            Some(session) if session.mounted => {
                session.mounted = false;
                session.current = None;
                true
            }
            _ => false,
        }
    }

    /// Drops everything known about the viewer (sign-out).
    pub async fn end_session(&self, viewer_id: &str) {
        self.sessions.lock().await.remove(viewer_id);
    }

    pub async fn is_mounted(&self, viewer_id: &str) -> bool {
        self.sessions.lock().await.get(viewer_id).is_some_and(|s| s.mounted)
    }

    pub async fn visibility(&self, viewer_id: &str, incident_id: &str) -> AlertVisibility {
        self.sessions
            .lock()
            .await
            .get(viewer_id)
            .map(|s| s.visibility(incident_id))
            .unwrap_or(AlertVisibility::New)
    }

    /// Advances every mounted countdown by one tick.
    pub async fn on_tick(&self, now: DateTime<Utc>) -> Result<(), crate::common::error::AppError> {
        let incidents = self.incidents.items().await?;
        let mut sessions = self.sessions.lock().await;
        for session in sessions.values_mut().filter(|s| s.mounted) {
            session.tick(&incidents, now);
        }
        Ok(())
    }

    /// Drives `on_tick` from a tick source until the source closes.
    pub async fn run(self, mut ticks: broadcast::Receiver<DateTime<Utc>>) {
        loop {
            match ticks.recv().await {
                Ok(now) => {
                    if let Err(e) = self.on_tick(now).await {
                        tracing::warn!("alert tick failed: {}", e);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("alert center skipped {} ticks", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}
