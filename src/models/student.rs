// src/models/student.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::db::collection::StoredEntity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViolationRecord {
    pub id: String,
    #[schema(example = "bullying")]
    pub violation_type: String,
    pub description: String,
    /// Report this violation was derived from, when there is one.
    pub report_id: Option<String>,
    pub recorded_by: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub full_name: String,

    /// Learner Reference Number. Unique across the collection.
    #[schema(example = "136514090123")]
    pub lrn: String,
    pub email: String,
    pub school_email: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    #[schema(ignore)]
    pub password_hash: String,

    pub grade_level_id: String,
    pub section_id: String,
    pub assigned_teacher_id: Option<String>,

    #[serde(default = "crate::models::default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub violation_history: Vec<ViolationRecord>,

    pub created_at: DateTime<Utc>,
}

impl Student {
    pub fn redacted(mut self) -> Self {
        self.password_hash.clear();
        self
    }

    /// Stable key for the remote password endpoint: school email, then email, then row id.
    pub fn sync_identifier(&self) -> &str {
        match self.school_email.as_deref() {
            Some(email) if !email.trim().is_empty() => email,
            _ if !self.email.trim().is_empty() => &self.email,
            _ => &self.id,
        }
    }
}

impl StoredEntity for Student {
    const STORAGE_KEY: &'static str = "school_students";
    const RESOURCE: &'static str = "students";

    fn id(&self) -> &str {
        &self.id
    }

    // The remote only ever sees redacted students.
    fn merge_local(&mut self, cached: &Self) {
        if self.password_hash.is_empty() {
            self.password_hash = cached.password_hash.clone();
        }
    }
}

// --- PAYLOADS ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentPayload {
    #[validate(length(min = 1, message = "Full name is required."))]
    #[schema(example = "Juan Dela Cruz")]
    pub full_name: String,

    #[validate(length(min = 1, message = "LRN is required."))]
    pub lrn: String,

    #[validate(email(message = "The email is invalid."))]
    pub email: String,

    #[validate(email(message = "The school email is invalid."))]
    pub school_email: Option<String>,

    #[validate(length(min = 6, message = "The password must have at least 6 characters."))]
    pub password: String,

    #[validate(length(min = 1, message = "Grade level is required."))]
    pub grade_level_id: String,

    #[validate(length(min = 1, message = "Section is required."))]
    pub section_id: String,

    pub assigned_teacher_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentPayload {
    #[validate(length(min = 1, message = "Full name cannot be empty."))]
    pub full_name: Option<String>,
    #[validate(length(min = 1, message = "LRN cannot be empty."))]
    pub lrn: Option<String>,
    #[validate(email(message = "The email is invalid."))]
    pub email: Option<String>,
    #[validate(email(message = "The school email is invalid."))]
    pub school_email: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromoteStudentPayload {
    #[validate(length(min = 1))]
    pub grade_level_id: String,
    #[validate(length(min = 1))]
    pub section_id: String,
    pub assigned_teacher_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferStudentPayload {
    #[validate(length(min = 1))]
    pub section_id: String,
    pub assigned_teacher_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordViolationPayload {
    #[validate(length(min = 1, message = "Violation type is required."))]
    pub violation_type: String,
    #[validate(length(min = 1, message = "Description is required."))]
    pub description: String,
    pub report_id: Option<String>,
}
