// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn build_router(app_state: AppState) -> Router {
    let session_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route("/change-password", post(handlers::auth::change_password))
        .route("/logout", post(handlers::auth::logout));

    let student_routes = Router::new()
        .route(
            "/",
            get(handlers::students::list_students).post(handlers::students::create_student),
        )
        .route(
            "/{id}",
            get(handlers::students::get_student)
                .put(handlers::students::update_student)
                .delete(handlers::students::delete_student),
        )
        .route("/{id}/promote", post(handlers::students::promote_student))
        .route("/{id}/transfer", post(handlers::students::transfer_student))
        .route("/{id}/active", put(handlers::students::set_student_active))
        .route("/{id}/violations", post(handlers::students::record_violation))
        .route("/{id}/password", post(handlers::students::reset_student_password));

    let grade_level_routes = Router::new()
        .route(
            "/",
            get(handlers::academics::list_grade_levels).post(handlers::academics::create_grade_level),
        )
        .route(
            "/{id}",
            put(handlers::academics::update_grade_level).delete(handlers::academics::delete_grade_level),
        );

    let section_routes = Router::new()
        .route(
            "/",
            get(handlers::academics::list_sections).post(handlers::academics::create_section),
        )
        .route(
            "/{id}",
            put(handlers::academics::update_section).delete(handlers::academics::delete_section),
        );

    let staff_routes = Router::new()
        .route("/", get(handlers::staff::list_staff).post(handlers::staff::create_staff))
        .route(
            "/{id}",
            get(handlers::staff::get_staff)
                .put(handlers::staff::update_staff_profile)
                .delete(handlers::staff::delete_staff),
        )
        .route("/{id}/permissions", put(handlers::staff::update_staff_permissions))
        .route("/{id}/password", post(handlers::staff::change_staff_password));

    let report_routes = Router::new()
        .route("/", get(handlers::reports::list_reports).post(handlers::reports::submit_report))
        .route("/{id}", get(handlers::reports::get_report))
        .route("/{id}/accept", post(handlers::reports::accept_report))
        .route("/{id}/decline", post(handlers::reports::decline_report))
        .route("/{id}/notes", post(handlers::reports::add_review_note));

    let live_incident_routes = Router::new()
        .route(
            "/",
            get(handlers::live_incidents::list_incidents).post(handlers::live_incidents::report_live_incident),
        )
        .route(
            "/alert",
            get(handlers::live_incidents::current_alert).delete(handlers::live_incidents::unmount_alert),
        )
        .route("/{id}/respond", post(handlers::live_incidents::respond_to_incident))
        .route("/{id}/resolve", post(handlers::live_incidents::resolve_incident))
        .route("/{id}/dismiss", post(handlers::live_incidents::dismiss_alert))
        .route("/{id}/responding", get(handlers::live_incidents::is_user_responding));

    let building_routes = Router::new()
        .route(
            "/",
            get(handlers::buildings::list_buildings).post(handlers::buildings::create_building),
        )
        .route(
            "/{id}",
            put(handlers::buildings::update_building).delete(handlers::buildings::delete_building),
        );

    // Everything below requires a bearer token
    let protected = Router::new()
        .nest("/auth", session_routes)
        .nest("/students", student_routes)
        .nest("/grade-levels", grade_level_routes)
        .nest("/sections", section_routes)
        .nest("/staff", staff_routes)
        .nest("/reports", report_routes)
        .nest("/live-incidents", live_incident_routes)
        .nest("/buildings", building_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let api = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/auth/login", post(handlers::auth::login))
        .merge(protected);

    Router::new()
        .nest("/api", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
