// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// ---
// Storage errors (local persistence port)
// ---
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("version conflict on '{key}': expected {expected}, found {found}")]
    VersionConflict { key: String, expected: u64, found: u64 },

    #[error("corrupt payload under '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage backend error: {0}")]
    Backend(#[from] sqlx::Error),

    #[error("storage migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

// ---
// Remote sync errors (best-effort mirror port)
// ---
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("remote sync is disabled")]
    Disabled,

    #[error("remote request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote responded with status {0}")]
    Status(u16),

    #[error("remote payload could not be decoded: {0}")]
    Decode(String),
}

// ---
// Application errors
// ---
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    InvalidInput(String),

    #[error("A student with LRN {0} already exists.")]
    LrnAlreadyExists(String),

    #[error("The email {0} is already in use.")]
    EmailAlreadyExists(String),

    #[error("A staff member with staff id {0} already exists.")]
    StaffIdAlreadyExists(String),

    #[error("A grade level named {0} already exists.")]
    GradeLevelAlreadyExists(String),

    #[error("Section {name} already exists in this grade level.")]
    SectionAlreadyExists { name: String, grade_level_id: String },

    #[error("A building named {0} already exists.")]
    BuildingAlreadyExists(String),

    #[error("Grade level is still in use by {students} student(s) and {sections} section(s).")]
    GradeLevelInUse { students: usize, sections: usize },

    #[error("Section is still in use by {students} student(s).")]
    SectionInUse { students: usize },

    #[error("Staff member is still the advisor of {sections} section(s).")]
    StaffInUse { sections: usize },

    #[error("{entity} {id} not found.")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    InvalidTransition(String),

    #[error("You need the '{0}' permission to perform this action.")]
    Forbidden(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("The {0} collection kept changing underneath this update; please retry.")]
    Conflict(&'static str),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Remote sync error: {0}")]
    RemoteSync(#[from] SyncError),

    #[error("Bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Internal server error")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound { entity, id: id.into() }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "One or more fields are invalid.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::LrnAlreadyExists(_)
            | AppError::EmailAlreadyExists(_)
            | AppError::StaffIdAlreadyExists(_)
            | AppError::GradeLevelAlreadyExists(_)
            | AppError::SectionAlreadyExists { .. }
            | AppError::BuildingAlreadyExists(_)
            | AppError::GradeLevelInUse { .. }
            | AppError::SectionInUse { .. }
            | AppError::StaffInUse { .. }
            | AppError::InvalidTransition(_)
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::RemoteSync(_) => StatusCode::BAD_GATEWAY,

            // Everything else becomes a 500; the detailed message only goes to the log.
            e => {
                tracing::error!("Internal server error: {}", e);
                let body = Json(json!({ "error": "An unexpected error occurred." }));
                return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            }
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
