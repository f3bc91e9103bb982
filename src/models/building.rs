// src/models/building.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::db::collection::StoredEntity;

/// Campus building used to lay out reports and live incidents. Descriptive only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DynamicBuilding {
    pub id: String,
    #[schema(example = "Main Building")]
    pub name: String,
    pub floors: u32,
    #[schema(example = "#2E7D32")]
    pub color: String,
    #[serde(default = "crate::models::default_true")]
    pub is_active: bool,
}

impl StoredEntity for DynamicBuilding {
    const STORAGE_KEY: &'static str = "school_buildings";
    const RESOURCE: &'static str = "buildings";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBuildingPayload {
    #[validate(length(min = 1, message = "Name is required."))]
    pub name: String,
    #[validate(range(min = 1, message = "A building has at least one floor."))]
    pub floors: u32,
    #[validate(length(min = 1, message = "Color is required."))]
    pub color: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBuildingPayload {
    #[validate(length(min = 1, message = "Name cannot be empty."))]
    pub name: Option<String>,
    #[validate(range(min = 1, message = "A building has at least one floor."))]
    pub floors: Option<u32>,
    pub color: Option<String>,
    pub is_active: Option<bool>,
}
