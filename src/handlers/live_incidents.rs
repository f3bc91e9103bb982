// src/handlers/live_incidents.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedActor,
    models::live_incident::{AlertView, LiveIncident, ReportLiveIncidentPayload},
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct IncidentFilter {
    /// `true` keeps only unresolved incidents
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RespondingStatus {
    pub incident_id: String,
    pub responding: bool,
}

#[utoipa::path(
    post,
    path = "/api/live-incidents",
    tag = "Live Incidents",
    request_body = ReportLiveIncidentPayload,
    responses((status = 201, description = "Alert raised", body = LiveIncident)),
    security(("api_jwt" = []))
)]
pub async fn report_live_incident(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Json(payload): Json<ReportLiveIncidentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let incident = app_state
        .live_incident_service
        .report_live_incident(&actor, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(incident)))
}

#[utoipa::path(
    get,
    path = "/api/live-incidents",
    tag = "Live Incidents",
    params(IncidentFilter),
    responses((status = 200, description = "Incidents in arrival order", body = Vec<LiveIncident>)),
    security(("api_jwt" = []))
)]
pub async fn list_incidents(
    State(app_state): State<AppState>,
    Query(filter): Query<IncidentFilter>,
) -> Result<Json<Vec<LiveIncident>>, AppError> {
    let service = &app_state.live_incident_service;
    let incidents = if filter.active {
        service.list_active_incidents().await?
    } else {
        service.list_incidents().await?
    };
    Ok(Json(incidents))
}

#[utoipa::path(
    post,
    path = "/api/live-incidents/{id}/respond",
    tag = "Live Incidents",
    params(("id" = String, Path, description = "Live incident id")),
    responses(
        (status = 200, description = "Caller is responding", body = LiveIncident),
        (status = 403, description = "Students cannot respond"),
        (status = 409, description = "Incident already resolved")
    ),
    security(("api_jwt" = []))
)]
pub async fn respond_to_incident(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<String>,
) -> Result<Json<LiveIncident>, AppError> {
    let incident = app_state
        .live_incident_service
        .respond_to_incident(&actor, &id)
        .await?;
    Ok(Json(incident))
}

#[utoipa::path(
    post,
    path = "/api/live-incidents/{id}/resolve",
    tag = "Live Incidents",
    params(("id" = String, Path, description = "Live incident id")),
    responses(
        (status = 200, description = "Incident resolved", body = LiveIncident),
        (status = 409, description = "Incident already resolved")
    ),
    security(("api_jwt" = []))
)]
pub async fn resolve_incident(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<String>,
) -> Result<Json<LiveIncident>, AppError> {
    let incident = app_state.live_incident_service.resolve_incident(&actor, &id).await?;
    Ok(Json(incident))
}

#[utoipa::path(
    get,
    path = "/api/live-incidents/{id}/responding",
    tag = "Live Incidents",
    params(("id" = String, Path, description = "Live incident id")),
    responses((status = 200, description = "Whether the caller is a responder", body = RespondingStatus)),
    security(("api_jwt" = []))
)]
pub async fn is_user_responding(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<String>,
) -> Result<Json<RespondingStatus>, AppError> {
    let responding = app_state
        .live_incident_service
        .is_user_responding(&actor.id, &id)
        .await?;
    Ok(Json(RespondingStatus { incident_id: id, responding }))
}

// ---
// Per-viewer alert pop-up
// ---

/// Mounts the caller's alert and returns what it shows, or `null`.
#[utoipa::path(
    get,
    path = "/api/live-incidents/alert",
    tag = "Live Incidents",
    responses((status = 200, description = "Current alert with its countdown", body = Option<AlertView>)),
    security(("api_jwt" = []))
)]
pub async fn current_alert(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
) -> Result<Json<Option<AlertView>>, AppError> {
    let alert = app_state
        .live_incident_service
        .current_alert(&actor, Utc::now())
        .await?;
    Ok(Json(alert))
}

#[utoipa::path(
    delete,
    path = "/api/live-incidents/alert",
    tag = "Live Incidents",
    responses((status = 204, description = "Alert unmounted")),
    security(("api_jwt" = []))
)]
pub async fn unmount_alert(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
) -> StatusCode {
    app_state.alert_center.unmount(&actor.id).await;
    StatusCode::NO_CONTENT
}

#[utoipa::path(
    post,
    path = "/api/live-incidents/{id}/dismiss",
    tag = "Live Incidents",
    params(("id" = String, Path, description = "Live incident id")),
    responses(
        (status = 204, description = "Alert hidden for this session"),
        (status = 404, description = "Unknown incident")
    ),
    security(("api_jwt" = []))
)]
pub async fn dismiss_alert(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    app_state.live_incident_service.dismiss_alert(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
