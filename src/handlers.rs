pub mod academics;
pub mod auth;
pub mod buildings;
pub mod live_incidents;
pub mod reports;
pub mod staff;
pub mod students;
