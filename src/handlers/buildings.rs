// src/handlers/buildings.rs

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
        rbac::{PermManageBuildings, RequirePermission},
    },
    models::building::{CreateBuildingPayload, DynamicBuilding, UpdateBuildingPayload},
};

#[utoipa::path(
    get,
    path = "/api/buildings",
    tag = "Buildings",
    responses((status = 200, description = "Campus buildings", body = Vec<DynamicBuilding>)),
    security(("api_jwt" = []))
)]
pub async fn list_buildings(State(app_state): State<AppState>) -> Result<Json<Vec<DynamicBuilding>>, AppError> {
    Ok(Json(app_state.building_service.list_buildings().await?))
}

#[utoipa::path(
    post,
    path = "/api/buildings",
    tag = "Buildings",
    request_body = CreateBuildingPayload,
    responses(
        (status = 201, description = "Building added", body = DynamicBuilding),
        (status = 409, description = "Name already in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_building(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    _guard: RequirePermission<PermManageBuildings>,
    Json(payload): Json<CreateBuildingPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let building = app_state.building_service.create_building(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(building)))
}

#[utoipa::path(
    put,
    path = "/api/buildings/{id}",
    tag = "Buildings",
    request_body = UpdateBuildingPayload,
    params(("id" = String, Path, description = "Building id")),
    responses((status = 200, description = "Building updated", body = DynamicBuilding)),
    security(("api_jwt" = []))
)]
pub async fn update_building(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    _guard: RequirePermission<PermManageBuildings>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateBuildingPayload>,
) -> Result<Json<DynamicBuilding>, AppError> {
    payload.validate()?;

    let building = app_state.building_service.update_building(&actor, &id, payload).await?;
    Ok(Json(building))
}

#[utoipa::path(
    delete,
    path = "/api/buildings/{id}",
    tag = "Buildings",
    params(("id" = String, Path, description = "Building id")),
    responses((status = 204, description = "Building removed")),
    security(("api_jwt" = []))
)]
pub async fn delete_building(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    _guard: RequirePermission<PermManageBuildings>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    app_state.building_service.delete_building(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
