// src/handlers/students.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedActor,
        rbac::{PermPromoteTransferStudents, PermRemoveStudents, RequirePermission},
    },
    models::{
        auth::ChangePasswordPayload,
        student::{
            CreateStudentPayload, PromoteStudentPayload, RecordViolationPayload, Student,
            TransferStudentPayload, UpdateStudentPayload,
        },
    },
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetActivePayload {
    pub is_active: bool,
}

#[utoipa::path(
    get,
    path = "/api/students",
    tag = "Students",
    responses((status = 200, description = "Students visible to the caller", body = Vec<Student>)),
    security(("api_jwt" = []))
)]
pub async fn list_students(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
) -> Result<Json<Vec<Student>>, AppError> {
    let students = app_state.student_service.list_students(&actor).await?;
    Ok(Json(students))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}",
    tag = "Students",
    params(("id" = String, Path, description = "Student id")),
    responses(
        (status = 200, description = "Student", body = Student),
        (status = 404, description = "Unknown student")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_student(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<String>,
) -> Result<Json<Student>, AppError> {
    let student = app_state.student_service.get_student(&actor, &id).await?;
    Ok(Json(student))
}

#[utoipa::path(
    post,
    path = "/api/students",
    tag = "Students",
    request_body = CreateStudentPayload,
    responses(
        (status = 201, description = "Student created", body = Student),
        (status = 409, description = "LRN or email already in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_student(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Json(payload): Json<CreateStudentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let student = app_state.student_service.create_student(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

#[utoipa::path(
    put,
    path = "/api/students/{id}",
    tag = "Students",
    request_body = UpdateStudentPayload,
    params(("id" = String, Path, description = "Student id")),
    responses(
        (status = 200, description = "Student updated", body = Student),
        (status = 403, description = "Outside the teacher's sections")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_student(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStudentPayload>,
) -> Result<Json<Student>, AppError> {
    payload.validate()?;

    let student = app_state.student_service.update_student(&actor, &id, payload).await?;
    Ok(Json(student))
}

#[utoipa::path(
    post,
    path = "/api/students/{id}/promote",
    tag = "Students",
    request_body = PromoteStudentPayload,
    params(("id" = String, Path, description = "Student id")),
    responses((status = 200, description = "Student promoted", body = Student)),
    security(("api_jwt" = []))
)]
pub async fn promote_student(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    _guard: RequirePermission<PermPromoteTransferStudents>,
    Path(id): Path<String>,
    Json(payload): Json<PromoteStudentPayload>,
) -> Result<Json<Student>, AppError> {
    payload.validate()?;

    let student = app_state.student_service.promote_student(&actor, &id, payload).await?;
    Ok(Json(student))
}

#[utoipa::path(
    post,
    path = "/api/students/{id}/transfer",
    tag = "Students",
    request_body = TransferStudentPayload,
    params(("id" = String, Path, description = "Student id")),
    responses((status = 200, description = "Student transferred", body = Student)),
    security(("api_jwt" = []))
)]
pub async fn transfer_student(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    _guard: RequirePermission<PermPromoteTransferStudents>,
    Path(id): Path<String>,
    Json(payload): Json<TransferStudentPayload>,
) -> Result<Json<Student>, AppError> {
    payload.validate()?;

    let student = app_state.student_service.transfer_student(&actor, &id, payload).await?;
    Ok(Json(student))
}

#[utoipa::path(
    put,
    path = "/api/students/{id}/active",
    tag = "Students",
    request_body = SetActivePayload,
    params(("id" = String, Path, description = "Student id")),
    responses((status = 200, description = "Activation changed", body = Student)),
    security(("api_jwt" = []))
)]
pub async fn set_student_active(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    _guard: RequirePermission<PermRemoveStudents>,
    Path(id): Path<String>,
    Json(payload): Json<SetActivePayload>,
) -> Result<Json<Student>, AppError> {
    let student = app_state
        .student_service
        .set_student_active(&actor, &id, payload.is_active)
        .await?;
    Ok(Json(student))
}

#[utoipa::path(
    delete,
    path = "/api/students/{id}",
    tag = "Students",
    params(("id" = String, Path, description = "Student id")),
    responses(
        (status = 204, description = "Student removed"),
        (status = 404, description = "Unknown student")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_student(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    _guard: RequirePermission<PermRemoveStudents>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    app_state.student_service.delete_student(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/students/{id}/violations",
    tag = "Students",
    request_body = RecordViolationPayload,
    params(("id" = String, Path, description = "Student id")),
    responses((status = 201, description = "Violation recorded", body = Student)),
    security(("api_jwt" = []))
)]
pub async fn record_violation(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<String>,
    Json(payload): Json<RecordViolationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let student = app_state.student_service.record_violation(&actor, &id, payload).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

#[utoipa::path(
    post,
    path = "/api/students/{id}/password",
    tag = "Students",
    request_body = ChangePasswordPayload,
    params(("id" = String, Path, description = "Student id")),
    responses((status = 204, description = "Password reset")),
    security(("api_jwt" = []))
)]
pub async fn reset_student_password(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<String>,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    app_state
        .student_service
        .reset_student_password(&actor, &id, &payload.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
