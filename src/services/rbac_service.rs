// src/services/rbac_service.rs

use crate::common::error::AppError;
use crate::models::auth::Actor;
use crate::models::staff::StaffPermission;
use crate::models::student::Student;

/// Entity a permission is checked against, when the check is relationship-specific.
#[derive(Debug, Clone, Copy)]
pub enum PermissionTarget<'a> {
    Student(&'a Student),
}

/// Pure permission gate consulted before every mutation and before exposing data.
///
/// Base rule is set membership. The one scoped override: for a teacher editing a
/// student, holding `edit_any_student` or having the student's section among the
/// teacher's assigned sections replaces the explicit `edit_students` grant.
pub fn can_perform(actor: &Actor, permission: StaffPermission, target: Option<PermissionTarget<'_>>) -> bool {
    if actor.is_admin() {
        return true;
    }

    match (permission, target) {
        (StaffPermission::EditStudents, Some(PermissionTarget::Student(student))) if actor.is_teacher() => {
            actor.permissions.contains(&StaffPermission::EditAnyStudent)
                || actor.assigned_section_ids.iter().any(|s| *s == student.section_id)
        }
        _ => actor.permissions.contains(&permission),
    }
}

/// `can_perform` as a `Result`, for use with `?` in services.
pub fn require(actor: &Actor, permission: StaffPermission, target: Option<PermissionTarget<'_>>) -> Result<(), AppError> {
    if can_perform(actor, permission, target) {
        Ok(())
    } else {
        Err(AppError::Forbidden(permission.slug().to_string()))
    }
}

/// Whether `actor` may see `student` in listings and detail views.
pub fn can_view_student(actor: &Actor, student: &Student) -> bool {
    if actor.id == student.id {
        return true;
    }
    if actor.is_teacher() {
        return can_perform(actor, StaffPermission::EditStudents, Some(PermissionTarget::Student(student)));
    }
    can_perform(actor, StaffPermission::EditStudents, None)
        || can_perform(actor, StaffPermission::AccessSensitiveData, None)
}
