// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedActor,
    models::auth::{Actor, ActorKind, AuthResponse, ChangePasswordPayload, LoginPayload},
};

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Unknown email, wrong password or inactive account")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate()?;

    let (token, actor) = app_state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    tracing::info!("{} signed in as {}", actor.id, actor.role_label());
    Ok(Json(AuthResponse { token, actor }))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses((status = 200, description = "The signed-in actor", body = Actor)),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedActor(actor): AuthenticatedActor) -> Json<Actor> {
    Json(actor)
}

/// Changes the signed-in user's own password.
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    tag = "Auth",
    request_body = ChangePasswordPayload,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "The administrator password comes from the environment")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_password(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    match actor.kind {
        ActorKind::Staff => {
            app_state
                .staff_service
                .change_staff_password(&actor, &actor.id, &payload.new_password)
                .await?
        }
        ActorKind::Student => {
            app_state
                .student_service
                .reset_student_password(&actor, &actor.id, &payload.new_password)
                .await?
        }
        ActorKind::Admin => {
            return Err(AppError::InvalidInput(
                "The administrator password is configured through ADMIN_PASSWORD.".into(),
            ));
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Forgets the caller's alert session (dismissals included).
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 204, description = "Session state cleared")),
    security(("api_jwt" = []))
)]
pub async fn logout(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
) -> StatusCode {
    app_state.alert_center.end_session(&actor.id).await;
    StatusCode::NO_CONTENT
}
