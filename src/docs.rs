// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::change_password,
        handlers::auth::logout,

        // --- Students ---
        handlers::students::list_students,
        handlers::students::get_student,
        handlers::students::create_student,
        handlers::students::update_student,
        handlers::students::promote_student,
        handlers::students::transfer_student,
        handlers::students::set_student_active,
        handlers::students::delete_student,
        handlers::students::record_violation,
        handlers::students::reset_student_password,

        // --- Academics ---
        handlers::academics::list_grade_levels,
        handlers::academics::create_grade_level,
        handlers::academics::update_grade_level,
        handlers::academics::delete_grade_level,
        handlers::academics::list_sections,
        handlers::academics::create_section,
        handlers::academics::update_section,
        handlers::academics::delete_section,

        // --- Staff ---
        handlers::staff::list_staff,
        handlers::staff::get_staff,
        handlers::staff::create_staff,
        handlers::staff::update_staff_profile,
        handlers::staff::update_staff_permissions,
        handlers::staff::delete_staff,
        handlers::staff::change_staff_password,

        // --- Reports ---
        handlers::reports::submit_report,
        handlers::reports::list_reports,
        handlers::reports::get_report,
        handlers::reports::accept_report,
        handlers::reports::decline_report,
        handlers::reports::add_review_note,

        // --- Live incidents ---
        handlers::live_incidents::report_live_incident,
        handlers::live_incidents::list_incidents,
        handlers::live_incidents::respond_to_incident,
        handlers::live_incidents::resolve_incident,
        handlers::live_incidents::is_user_responding,
        handlers::live_incidents::current_alert,
        handlers::live_incidents::unmount_alert,
        handlers::live_incidents::dismiss_alert,

        // --- Buildings ---
        handlers::buildings::list_buildings,
        handlers::buildings::create_building,
        handlers::buildings::update_building,
        handlers::buildings::delete_building,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::ActorKind,
            models::auth::Actor,
            models::auth::LoginPayload,
            models::auth::AuthResponse,
            models::auth::ChangePasswordPayload,

            // --- Students ---
            models::student::Student,
            models::student::ViolationRecord,
            models::student::CreateStudentPayload,
            models::student::UpdateStudentPayload,
            models::student::PromoteStudentPayload,
            models::student::TransferStudentPayload,
            models::student::RecordViolationPayload,
            handlers::students::SetActivePayload,

            // --- Academics ---
            models::academics::GradeLevel,
            models::academics::Section,
            models::academics::CreateGradeLevelPayload,
            models::academics::UpdateGradeLevelPayload,
            models::academics::CreateSectionPayload,
            models::academics::UpdateSectionPayload,

            // --- Staff ---
            models::staff::StaffPermission,
            models::staff::Position,
            models::staff::StaffMember,
            models::staff::CreateStaffPayload,
            models::staff::UpdateStaffPayload,
            models::staff::UpdatePermissionsPayload,

            // --- Reports ---
            models::report::IncidentType,
            models::report::Priority,
            models::report::ReportStatus,
            models::report::ReviewAction,
            models::report::IncidentLocation,
            models::report::VictimInfo,
            models::report::ReviewEntry,
            models::report::IncidentReport,
            models::report::SubmitReportPayload,
            models::report::ReviewPayload,
            models::report::DeclineReportPayload,

            // --- Live incidents ---
            models::live_incident::LiveIncidentStatus,
            models::live_incident::Responder,
            models::live_incident::LiveIncident,
            models::live_incident::ReportLiveIncidentPayload,
            models::live_incident::AlertView,
            handlers::live_incidents::RespondingStatus,

            // --- Buildings ---
            models::building::DynamicBuilding,
            models::building::CreateBuildingPayload,
            models::building::UpdateBuildingPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Sign-in and the current session"),
        (name = "Students", description = "Student records, placement and discipline"),
        (name = "Academics", description = "Grade levels and sections"),
        (name = "Staff", description = "Staff accounts and permissions"),
        (name = "Reports", description = "Incident reports and their review"),
        (name = "Live Incidents", description = "Live alerts, responders and the per-viewer pop-up"),
        (name = "Buildings", description = "Campus buildings used in incident locations")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("api_jwt", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}
