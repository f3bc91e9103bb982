// src/handlers/academics.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedActor,
        rbac::{PermCreateGradesSections, RequirePermission},
    },
    models::academics::{
        CreateGradeLevelPayload, CreateSectionPayload, GradeLevel, Section, UpdateGradeLevelPayload,
        UpdateSectionPayload,
    },
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct SectionFilter {
    /// Only sections of this grade level
    pub grade_level_id: Option<String>,
}

// ---
// Grade levels
// ---

#[utoipa::path(
    get,
    path = "/api/grade-levels",
    tag = "Academics",
    responses((status = 200, description = "Grade levels by order", body = Vec<GradeLevel>)),
    security(("api_jwt" = []))
)]
pub async fn list_grade_levels(State(app_state): State<AppState>) -> Result<Json<Vec<GradeLevel>>, AppError> {
    Ok(Json(app_state.academic_service.list_grade_levels().await?))
}

#[utoipa::path(
    post,
    path = "/api/grade-levels",
    tag = "Academics",
    request_body = CreateGradeLevelPayload,
    responses(
        (status = 201, description = "Grade level created", body = GradeLevel),
        (status = 409, description = "Name already in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_grade_level(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    _guard: RequirePermission<PermCreateGradesSections>,
    Json(payload): Json<CreateGradeLevelPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let grade = app_state.academic_service.create_grade_level(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(grade)))
}

#[utoipa::path(
    put,
    path = "/api/grade-levels/{id}",
    tag = "Academics",
    request_body = UpdateGradeLevelPayload,
    params(("id" = String, Path, description = "Grade level id")),
    responses((status = 200, description = "Grade level updated", body = GradeLevel)),
    security(("api_jwt" = []))
)]
pub async fn update_grade_level(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    _guard: RequirePermission<PermCreateGradesSections>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateGradeLevelPayload>,
) -> Result<Json<GradeLevel>, AppError> {
    payload.validate()?;

    let grade = app_state.academic_service.update_grade_level(&actor, &id, payload).await?;
    Ok(Json(grade))
}

#[utoipa::path(
    delete,
    path = "/api/grade-levels/{id}",
    tag = "Academics",
    params(("id" = String, Path, description = "Grade level id")),
    responses(
        (status = 204, description = "Grade level deleted"),
        (status = 409, description = "Still referenced by students or sections")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_grade_level(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    _guard: RequirePermission<PermCreateGradesSections>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    app_state.academic_service.delete_grade_level(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---
// Sections
// ---

#[utoipa::path(
    get,
    path = "/api/sections",
    tag = "Academics",
    params(SectionFilter),
    responses((status = 200, description = "Sections", body = Vec<Section>)),
    security(("api_jwt" = []))
)]
pub async fn list_sections(
    State(app_state): State<AppState>,
    Query(filter): Query<SectionFilter>,
) -> Result<Json<Vec<Section>>, AppError> {
    let sections = app_state
        .academic_service
        .list_sections(filter.grade_level_id.as_deref())
        .await?;
    Ok(Json(sections))
}

#[utoipa::path(
    post,
    path = "/api/sections",
    tag = "Academics",
    request_body = CreateSectionPayload,
    responses(
        (status = 201, description = "Section created", body = Section),
        (status = 409, description = "Name already used in that grade level")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_section(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    _guard: RequirePermission<PermCreateGradesSections>,
    Json(payload): Json<CreateSectionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let section = app_state.academic_service.create_section(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(section)))
}

#[utoipa::path(
    put,
    path = "/api/sections/{id}",
    tag = "Academics",
    request_body = UpdateSectionPayload,
    params(("id" = String, Path, description = "Section id")),
    responses((status = 200, description = "Section updated", body = Section)),
    security(("api_jwt" = []))
)]
pub async fn update_section(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    _guard: RequirePermission<PermCreateGradesSections>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateSectionPayload>,
) -> Result<Json<Section>, AppError> {
    payload.validate()?;

    let section = app_state.academic_service.update_section(&actor, &id, payload).await?;
    Ok(Json(section))
}

#[utoipa::path(
    delete,
    path = "/api/sections/{id}",
    tag = "Academics",
    params(("id" = String, Path, description = "Section id")),
    responses(
        (status = 204, description = "Section deleted"),
        (status = 409, description = "Still referenced by students")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_section(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    _guard: RequirePermission<PermCreateGradesSections>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    app_state.academic_service.delete_section(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
