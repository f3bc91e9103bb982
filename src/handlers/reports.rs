// src/handlers/reports.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedActor,
        rbac::{PermManageReports, RequirePermission},
    },
    models::report::{DeclineReportPayload, IncidentReport, ReviewPayload, SubmitReportPayload},
};

#[utoipa::path(
    post,
    path = "/api/reports",
    tag = "Reports",
    request_body = SubmitReportPayload,
    responses((status = 201, description = "Report filed for review", body = IncidentReport)),
    security(("api_jwt" = []))
)]
pub async fn submit_report(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Json(payload): Json<SubmitReportPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let report = app_state.report_service.submit_report(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// Managers see every report, everyone else only their own.
#[utoipa::path(
    get,
    path = "/api/reports",
    tag = "Reports",
    responses((status = 200, description = "Reports, newest first", body = Vec<IncidentReport>)),
    security(("api_jwt" = []))
)]
pub async fn list_reports(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
) -> Result<Json<Vec<IncidentReport>>, AppError> {
    Ok(Json(app_state.report_service.list_reports(&actor).await?))
}

#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    tag = "Reports",
    params(("id" = String, Path, description = "Report id")),
    responses(
        (status = 200, description = "Report", body = IncidentReport),
        (status = 404, description = "Unknown report")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_report(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<String>,
) -> Result<Json<IncidentReport>, AppError> {
    Ok(Json(app_state.report_service.get_report(&actor, &id).await?))
}

#[utoipa::path(
    post,
    path = "/api/reports/{id}/accept",
    tag = "Reports",
    request_body = ReviewPayload,
    params(("id" = String, Path, description = "Report id")),
    responses(
        (status = 200, description = "Report accepted", body = IncidentReport),
        (status = 409, description = "Report already reviewed")
    ),
    security(("api_jwt" = []))
)]
pub async fn accept_report(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    _guard: RequirePermission<PermManageReports>,
    Path(id): Path<String>,
    Json(payload): Json<ReviewPayload>,
) -> Result<Json<IncidentReport>, AppError> {
    let report = app_state
        .report_service
        .accept_report(&actor, &id, payload.notes)
        .await?;
    Ok(Json(report))
}

#[utoipa::path(
    post,
    path = "/api/reports/{id}/decline",
    tag = "Reports",
    request_body = DeclineReportPayload,
    params(("id" = String, Path, description = "Report id")),
    responses(
        (status = 200, description = "Report declined", body = IncidentReport),
        (status = 409, description = "Report already reviewed")
    ),
    security(("api_jwt" = []))
)]
pub async fn decline_report(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    _guard: RequirePermission<PermManageReports>,
    Path(id): Path<String>,
    Json(payload): Json<DeclineReportPayload>,
) -> Result<Json<IncidentReport>, AppError> {
    payload.validate()?;

    let report = app_state
        .report_service
        .decline_report(&actor, &id, &payload.reason)
        .await?;
    Ok(Json(report))
}

#[utoipa::path(
    post,
    path = "/api/reports/{id}/notes",
    tag = "Reports",
    request_body = ReviewPayload,
    params(("id" = String, Path, description = "Report id")),
    responses((status = 200, description = "Note appended", body = IncidentReport)),
    security(("api_jwt" = []))
)]
pub async fn add_review_note(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    _guard: RequirePermission<PermManageReports>,
    Path(id): Path<String>,
    Json(payload): Json<ReviewPayload>,
) -> Result<Json<IncidentReport>, AppError> {
    let notes = payload.notes.unwrap_or_default();
    let report = app_state.report_service.add_review_note(&actor, &id, &notes).await?;
    Ok(Json(report))
}
