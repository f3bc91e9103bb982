// src/handlers/staff.rs

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
        rbac::{PermManagePermissions, PermManageStaffAccounts, RequirePermission},
    },
    models::{
        auth::ChangePasswordPayload,
        staff::{CreateStaffPayload, StaffMember, UpdatePermissionsPayload, UpdateStaffPayload},
    },
};

#[utoipa::path(
    get,
    path = "/api/staff",
    tag = "Staff",
    responses(
        (status = 200, description = "Staff directory", body = Vec<StaffMember>),
        (status = 403, description = "Students cannot view the directory")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_staff(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
) -> Result<Json<Vec<StaffMember>>, AppError> {
    Ok(Json(app_state.staff_service.list_staff(&actor).await?))
}

#[utoipa::path(
    get,
    path = "/api/staff/{id}",
    tag = "Staff",
    params(("id" = String, Path, description = "Staff member id")),
    responses(
        (status = 200, description = "Staff member", body = StaffMember),
        (status = 404, description = "Unknown staff member")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_staff(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<String>,
) -> Result<Json<StaffMember>, AppError> {
    Ok(Json(app_state.staff_service.get_staff(&actor, &id).await?))
}

#[utoipa::path(
    post,
    path = "/api/staff",
    tag = "Staff",
    request_body = CreateStaffPayload,
    responses(
        (status = 201, description = "Account created", body = StaffMember),
        (status = 409, description = "Staff id or email already in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_staff(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    _guard: RequirePermission<PermManageStaffAccounts>,
    Json(payload): Json<CreateStaffPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let member = app_state.staff_service.create_staff(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

#[utoipa::path(
    put,
    path = "/api/staff/{id}",
    tag = "Staff",
    request_body = UpdateStaffPayload,
    params(("id" = String, Path, description = "Staff member id")),
    responses((status = 200, description = "Profile updated", body = StaffMember)),
    security(("api_jwt" = []))
)]
pub async fn update_staff_profile(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStaffPayload>,
) -> Result<Json<StaffMember>, AppError> {
    payload.validate()?;

    let member = app_state
        .staff_service
        .update_staff_profile(&actor, &id, payload)
        .await?;
    Ok(Json(member))
}

#[utoipa::path(
    put,
    path = "/api/staff/{id}/permissions",
    tag = "Staff",
    request_body = UpdatePermissionsPayload,
    params(("id" = String, Path, description = "Staff member id")),
    responses((status = 200, description = "Permissions replaced", body = StaffMember)),
    security(("api_jwt" = []))
)]
pub async fn update_staff_permissions(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    _guard: RequirePermission<PermManagePermissions>,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePermissionsPayload>,
) -> Result<Json<StaffMember>, AppError> {
    let member = app_state
        .staff_service
        .update_staff_permissions(&actor, &id, payload.permissions)
        .await?;
    Ok(Json(member))
}

#[utoipa::path(
    delete,
    path = "/api/staff/{id}",
    tag = "Staff",
    params(("id" = String, Path, description = "Staff member id")),
    responses(
        (status = 204, description = "Account removed"),
        (status = 409, description = "Still advising a section")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_staff(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    _guard: RequirePermission<PermManageStaffAccounts>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    app_state.staff_service.delete_staff(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/staff/{id}/password",
    tag = "Staff",
    request_body = ChangePasswordPayload,
    params(("id" = String, Path, description = "Staff member id")),
    responses((status = 204, description = "Password changed")),
    security(("api_jwt" = []))
)]
pub async fn change_staff_password(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<String>,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    app_state
        .staff_service
        .change_staff_password(&actor, &id, &payload.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
