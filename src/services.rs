pub mod academic_service;
pub mod alert_service;
pub mod auth;
pub mod building_service;
pub mod live_incident_service;
pub mod rbac_service;
pub mod report_service;
pub mod staff_service;
pub mod student_service;
pub mod tick_source;

pub use academic_service::AcademicService;
pub use alert_service::AlertCenter;
pub use auth::AuthService;
pub use building_service::BuildingService;
pub use live_incident_service::LiveIncidentService;
pub use report_service::ReportService;
pub use staff_service::StaffService;
pub use student_service::StudentService;
pub use tick_source::TickSource;
