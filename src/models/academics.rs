// src/models/academics.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::db::collection::StoredEntity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GradeLevel {
    pub id: String,
    #[schema(example = "Grade 7")]
    pub name: String,
    /// Display order, lowest first.
    pub order: i32,
    #[serde(default = "crate::models::default_true")]
    pub is_active: bool,
}

impl StoredEntity for GradeLevel {
    const STORAGE_KEY: &'static str = "school_grade_levels";
    const RESOURCE: &'static str = "grade-levels";

    fn id(&self) -> &str {
        &self.id
    }

    // Junior and senior high school grades.
    fn defaults() -> Vec<Self> {
        (7..=12)
            .map(|grade| GradeLevel {
                id: format!("grade-{grade}"),
                name: format!("Grade {grade}"),
                order: grade,
                is_active: true,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    #[schema(example = "Sampaguita")]
    pub name: String,
    pub grade_level_id: String,
    /// Staff member acting as class adviser.
    pub advisor_id: Option<String>,
    #[serde(default = "crate::models::default_true")]
    pub is_active: bool,
}

impl StoredEntity for Section {
    const STORAGE_KEY: &'static str = "school_sections";
    const RESOURCE: &'static str = "sections";

    fn id(&self) -> &str {
        &self.id
    }
}

// --- PAYLOADS ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGradeLevelPayload {
    #[validate(length(min = 1, message = "Name is required."))]
    pub name: String,
    pub order: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGradeLevelPayload {
    #[validate(length(min = 1, message = "Name cannot be empty."))]
    pub name: Option<String>,
    pub order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSectionPayload {
    #[validate(length(min = 1, message = "Name is required."))]
    pub name: String,
    #[validate(length(min = 1, message = "Grade level is required."))]
    pub grade_level_id: String,
    pub advisor_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSectionPayload {
    #[validate(length(min = 1, message = "Name cannot be empty."))]
    pub name: Option<String>,
    pub advisor_id: Option<String>,
    pub is_active: Option<bool>,
}
