// src/models/auth.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::staff::{Position, StaffMember, StaffPermission};
use crate::models::student::Student;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Admin,
    Staff,
    Student,
}

/// The signed-in user, resolved from the live collections on every request so
/// permission edits take effect immediately.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub kind: ActorKind,
    pub position: Option<Position>,
    pub permissions: Vec<StaffPermission>,
    pub assigned_section_ids: Vec<String>,
}

impl Actor {
    pub fn admin(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: ActorKind::Admin,
            position: None,
            permissions: StaffPermission::ALL.to_vec(),
            assigned_section_ids: Vec::new(),
        }
    }

    pub fn from_staff(staff: &StaffMember) -> Self {
        Self {
            id: staff.id.clone(),
            name: staff.full_name.clone(),
            kind: ActorKind::Staff,
            position: Some(staff.position),
            permissions: staff.permissions.clone(),
            assigned_section_ids: staff.assigned_section_ids.clone(),
        }
    }

    pub fn from_student(student: &Student) -> Self {
        Self {
            id: student.id.clone(),
            name: student.full_name.clone(),
            kind: ActorKind::Student,
            position: None,
            permissions: Vec::new(),
            assigned_section_ids: Vec::new(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.kind == ActorKind::Admin
    }

    pub fn is_teacher(&self) -> bool {
        self.position == Some(Position::Teacher)
    }

    /// Staff and administrators can physically respond to live incidents.
    pub fn can_respond(&self) -> bool {
        matches!(self.kind, ActorKind::Admin | ActorKind::Staff)
    }

    pub fn role_label(&self) -> &'static str {
        match (self.kind, self.position) {
            (ActorKind::Admin, _) => "admin",
            (ActorKind::Student, _) => "student",
            (ActorKind::Staff, Some(Position::Principal)) => "principal",
            (ActorKind::Staff, Some(Position::VicePrincipal)) => "vice_principal",
            (ActorKind::Staff, Some(Position::GuidanceCounselor)) => "guidance_counselor",
            (ActorKind::Staff, _) => "teacher",
        }
    }
}

// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,     // actor id
    pub kind: ActorKind, // which collection the id lives in
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(email(message = "The email is invalid."))]
    pub email: String,
    #[validate(length(min = 1, message = "The password is required."))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub actor: Actor,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
    #[validate(length(min = 6, message = "The password must have at least 6 characters."))]
    pub new_password: String,
}
