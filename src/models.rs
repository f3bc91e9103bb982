pub mod academics;
pub mod auth;
pub mod building;
pub mod live_incident;
pub mod report;
pub mod staff;
pub mod student;

pub(crate) fn default_true() -> bool {
    true
}
