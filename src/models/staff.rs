// src/models/staff.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::db::collection::StoredEntity;

// --- ENUMS ---

/// A capability a staff member may hold. Authorization is a set-membership test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StaffPermission {
    EditStudents,
    ManageReports,
    AccessSensitiveData,
    CreateGradesSections,
    PromoteTransferStudents,
    EditStaffProfiles,
    ManagePermissions,
    RemoveStudents,
    EditAnyStudent,
    ManageStaffAccounts,
    ManageBuildings,
}

impl StaffPermission {
    pub const ALL: [StaffPermission; 11] = [
        StaffPermission::EditStudents,
        StaffPermission::ManageReports,
        StaffPermission::AccessSensitiveData,
        StaffPermission::CreateGradesSections,
        StaffPermission::PromoteTransferStudents,
        StaffPermission::EditStaffProfiles,
        StaffPermission::ManagePermissions,
        StaffPermission::RemoveStudents,
        StaffPermission::EditAnyStudent,
        StaffPermission::ManageStaffAccounts,
        StaffPermission::ManageBuildings,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            StaffPermission::EditStudents => "edit_students",
            StaffPermission::ManageReports => "manage_reports",
            StaffPermission::AccessSensitiveData => "access_sensitive_data",
            StaffPermission::CreateGradesSections => "create_grades_sections",
            StaffPermission::PromoteTransferStudents => "promote_transfer_students",
            StaffPermission::EditStaffProfiles => "edit_staff_profiles",
            StaffPermission::ManagePermissions => "manage_permissions",
            StaffPermission::RemoveStudents => "remove_students",
            StaffPermission::EditAnyStudent => "edit_any_student",
            StaffPermission::ManageStaffAccounts => "manage_staff_accounts",
            StaffPermission::ManageBuildings => "manage_buildings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Principal,
    VicePrincipal,
    GuidanceCounselor,
    Teacher,
}

impl Position {
    /// Canonical permission bundle applied when a staff member is created.
    /// It is a seed only: the set stays editable per staff member afterwards.
    pub fn default_permissions(&self) -> Vec<StaffPermission> {
        use StaffPermission::*;
        match self {
            Position::Principal => StaffPermission::ALL.to_vec(),
            Position::VicePrincipal => vec![
                EditStudents,
                ManageReports,
                AccessSensitiveData,
                CreateGradesSections,
                PromoteTransferStudents,
                EditStaffProfiles,
                RemoveStudents,
                EditAnyStudent,
                ManageStaffAccounts,
            ],
            Position::GuidanceCounselor => {
                vec![EditStudents, ManageReports, AccessSensitiveData, EditAnyStudent]
            }
            Position::Teacher => vec![EditStudents, ManageReports],
        }
    }
}

// --- ENTITY ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: String,
    pub full_name: String,
    pub staff_id: String,
    pub school_email: String,

    // Stored locally, never returned by the API (see `redacted`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    #[schema(ignore)]
    pub password_hash: String,

    pub position: Position,

    // Teacher-only attributes
    pub specialization: Option<String>,
    pub rank: Option<String>,
    pub cluster_role: Option<String>,

    #[serde(default)]
    pub permissions: Vec<StaffPermission>,

    // Scope restriction for teachers
    #[serde(default)]
    pub assigned_grade_level_ids: Vec<String>,
    #[serde(default)]
    pub assigned_section_ids: Vec<String>,

    pub profile_photo: Option<String>,

    #[serde(default = "crate::models::default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl StaffMember {
    pub fn has_permission(&self, permission: StaffPermission) -> bool {
        self.permissions.contains(&permission)
    }

    pub fn redacted(mut self) -> Self {
        self.password_hash.clear();
        self
    }
}

impl StoredEntity for StaffMember {
    const STORAGE_KEY: &'static str = "school_staff";
    const RESOURCE: &'static str = "staff";

    fn id(&self) -> &str {
        &self.id
    }

    fn merge_local(&mut self, cached: &Self) {
        if self.password_hash.is_empty() {
            self.password_hash = cached.password_hash.clone();
        }
    }
}

// --- PAYLOADS ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStaffPayload {
    #[validate(length(min = 1, message = "Full name is required."))]
    #[schema(example = "Maria Santos")]
    pub full_name: String,

    #[validate(length(min = 1, message = "Staff id is required."))]
    #[schema(example = "T-2024-001")]
    pub staff_id: String,

    #[validate(email(message = "The school email is invalid."))]
    #[schema(example = "maria.santos@school.edu.ph")]
    pub school_email: String,

    #[validate(length(min = 6, message = "The password must have at least 6 characters."))]
    pub password: String,

    pub position: Position,
    pub specialization: Option<String>,
    pub rank: Option<String>,
    pub cluster_role: Option<String>,

    /// When absent, the position's default bundle is used.
    pub permissions: Option<Vec<StaffPermission>>,

    #[serde(default)]
    pub assigned_grade_level_ids: Vec<String>,
    #[serde(default)]
    pub assigned_section_ids: Vec<String>,
    pub profile_photo: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStaffPayload {
    #[validate(length(min = 1, message = "Full name cannot be empty."))]
    pub full_name: Option<String>,
    #[validate(email(message = "The school email is invalid."))]
    pub school_email: Option<String>,
    pub position: Option<Position>,
    pub specialization: Option<String>,
    pub rank: Option<String>,
    pub cluster_role: Option<String>,
    pub assigned_grade_level_ids: Option<Vec<String>>,
    pub assigned_section_ids: Option<Vec<String>>,
    pub profile_photo: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePermissionsPayload {
    #[schema(example = json!(["edit_students", "manage_reports"]))]
    pub permissions: Vec<StaffPermission>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_bundle_holds_every_permission() {
        let bundle = Position::Principal.default_permissions();
        for permission in StaffPermission::ALL {
            assert!(bundle.contains(&permission), "missing {}", permission.slug());
        }
    }

    #[test]
    fn teacher_bundle_has_no_blanket_student_access() {
        let bundle = Position::Teacher.default_permissions();
        assert!(bundle.contains(&StaffPermission::EditStudents));
        assert!(!bundle.contains(&StaffPermission::EditAnyStudent));
        assert!(!bundle.contains(&StaffPermission::ManagePermissions));
    }

    #[test]
    fn permissions_use_snake_case_on_the_wire() {
        let json = serde_json::to_string(&StaffPermission::PromoteTransferStudents).unwrap();
        assert_eq!(json, "\"promote_transfer_students\"");
        assert_eq!(StaffPermission::PromoteTransferStudents.slug(), "promote_transfer_students");
    }
}
