// src/services/student_service.rs

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{collection::remote_body, Mutation, RemoteChange, SchoolStore, StoredEntity},
    models::{
        auth::Actor,
        staff::StaffPermission,
        student::{
            CreateStudentPayload, PromoteStudentPayload, RecordViolationPayload, Student,
            TransferStudentPayload, UpdateStudentPayload, ViolationRecord,
        },
    },
    services::{
        auth::hash_password,
        rbac_service::{can_view_student, require, PermissionTarget},
    },
};

#[derive(Clone)]
pub struct StudentService {
    store: SchoolStore,
    bcrypt_cost: u32,
}

impl StudentService {
    pub fn new(store: SchoolStore, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    // =========================================================================
    //  READS
    // =========================================================================

    pub async fn list_students(&self, actor: &Actor) -> Result<Vec<Student>, AppError> {
        let students = self.store.students.items().await?;
        Ok(students
            .iter()
            .filter(|s| can_view_student(actor, s))
            .cloned()
            .map(Student::redacted)
            .collect())
    }

    pub async fn get_student(&self, actor: &Actor, id: &str) -> Result<Student, AppError> {
        let student = self
            .store
            .students
            .find(id)
            .await?
            .ok_or_else(|| AppError::not_found("Student", id))?;

        if !can_view_student(actor, &student) {
            return Err(AppError::Forbidden(StaffPermission::EditStudents.slug().to_string()));
        }
        Ok(student.redacted())
    }

    // =========================================================================
    //  MUTATIONS
    // =========================================================================

    pub async fn create_student(&self, actor: &Actor, input: CreateStudentPayload) -> Result<Student, AppError> {
        require(actor, StaffPermission::EditStudents, None)?;

        // Hashing stays outside the read-validate-write cycle.
        let password_hash = hash_password(&input.password, self.bcrypt_cost).await?;
        let student = Student {
            id: Uuid::new_v4().to_string(),
            full_name: input.full_name.trim().to_string(),
            lrn: input.lrn.trim().to_string(),
            email: input.email.trim().to_string(),
            school_email: input.school_email.map(|e| e.trim().to_string()),
            password_hash,
            grade_level_id: input.grade_level_id,
            section_id: input.section_id,
            assigned_teacher_id: input.assigned_teacher_id,
            is_active: true,
            violation_history: Vec::new(),
            created_at: Utc::now(),
        };

        let created = self
            .store
            .students
            .mutate(|students| {
                // 1. Uniqueness against the whole collection
                ensure_unique_identity(students, None, &student.lrn, &student.email)?;

                // 2. Append
                let mut next = students.to_vec();
                next.push(student.clone());

                Ok(Mutation::new(next, student.clone()).mirrored(RemoteChange::Create {
                    resource: Student::RESOURCE,
                    body: remote_body(&student.clone().redacted()),
                }))
            })
            .await?;

        tracing::info!("student {} created by {}", created.id, actor.id);
        Ok(created.redacted())
    }

    pub async fn update_student(
        &self,
        actor: &Actor,
        id: &str,
        input: UpdateStudentPayload,
    ) -> Result<Student, AppError> {
        let updated = self
            .store
            .students
            .mutate(|students| {
                let current = find(students, id)?;
                require(actor, StaffPermission::EditStudents, Some(PermissionTarget::Student(current)))?;

                let mut student = current.clone();
                if let Some(name) = &input.full_name {
                    student.full_name = name.trim().to_string();
                }
                if let Some(lrn) = &input.lrn {
                    student.lrn = lrn.trim().to_string();
                }
                if let Some(email) = &input.email {
                    student.email = email.trim().to_string();
                }
                if let Some(school_email) = &input.school_email {
                    student.school_email = Some(school_email.trim().to_string());
                }
                if let Some(active) = input.is_active {
                    student.is_active = active;
                }

                ensure_unique_identity(students, Some(id), &student.lrn, &student.email)?;
                replace(students, student)
            })
            .await?;

        Ok(updated.redacted())
    }

    /// Moves a student to a new grade level, section and adviser in one replace.
    pub async fn promote_student(
        &self,
        actor: &Actor,
        id: &str,
        input: PromoteStudentPayload,
    ) -> Result<Student, AppError> {
        require(actor, StaffPermission::PromoteTransferStudents, None)?;

        let promoted = self
            .store
            .students
            .mutate(|students| {
                let mut student = find(students, id)?.clone();
                student.grade_level_id = input.grade_level_id.clone();
                student.section_id = input.section_id.clone();
                student.assigned_teacher_id = input.assigned_teacher_id.clone();
                replace(students, student)
            })
            .await?;

        tracing::info!("student {} promoted to {}/{}", id, promoted.grade_level_id, promoted.section_id);
        Ok(promoted.redacted())
    }

    /// Changes section and adviser within the same grade level.
    pub async fn transfer_student(
        &self,
        actor: &Actor,
        id: &str,
        input: TransferStudentPayload,
    ) -> Result<Student, AppError> {
        require(actor, StaffPermission::PromoteTransferStudents, None)?;

        let transferred = self
            .store
            .students
            .mutate(|students| {
                let mut student = find(students, id)?.clone();
                student.section_id = input.section_id.clone();
                student.assigned_teacher_id = input.assigned_teacher_id.clone();
                replace(students, student)
            })
            .await?;

        Ok(transferred.redacted())
    }

    pub async fn set_student_active(&self, actor: &Actor, id: &str, is_active: bool) -> Result<Student, AppError> {
        require(actor, StaffPermission::RemoveStudents, None)?;

        let student = self
            .store
            .students
            .mutate(|students| {
                let mut student = find(students, id)?.clone();
                student.is_active = is_active;
                replace(students, student)
            })
            .await?;

        Ok(student.redacted())
    }

    pub async fn delete_student(&self, actor: &Actor, id: &str) -> Result<bool, AppError> {
        require(actor, StaffPermission::RemoveStudents, None)?;

        self.store
            .students
            .mutate(|students| {
                find(students, id)?;
                let next: Vec<Student> = students.iter().filter(|s| s.id != id).cloned().collect();
                Ok(Mutation::new(next, true).mirrored(RemoteChange::Delete {
                    resource: Student::RESOURCE,
                    id: id.to_string(),
                }))
            })
            .await
    }

    pub async fn record_violation(
        &self,
        actor: &Actor,
        id: &str,
        input: RecordViolationPayload,
    ) -> Result<Student, AppError> {
        let student = self
            .store
            .students
            .mutate(|students| {
                let current = find(students, id)?;
                require(actor, StaffPermission::EditStudents, Some(PermissionTarget::Student(current)))?;

                let mut student = current.clone();
                student.violation_history.push(ViolationRecord {
                    id: Uuid::new_v4().to_string(),
                    violation_type: input.violation_type.clone(),
                    description: input.description.clone(),
                    report_id: input.report_id.clone(),
                    recorded_by: actor.name.clone(),
                    recorded_at: Utc::now(),
                });
                replace(students, student)
            })
            .await?;

        Ok(student.redacted())
    }

    /// Always succeeds locally; the remote copy is updated best effort.
    pub async fn reset_student_password(&self, actor: &Actor, id: &str, new_password: &str) -> Result<(), AppError> {
        {
            let current = self
                .store
                .students
                .find(id)
                .await?
                .ok_or_else(|| AppError::not_found("Student", id))?;
            if actor.id != current.id {
                require(actor, StaffPermission::EditStudents, Some(PermissionTarget::Student(&current)))?;
            }
        }

        let password_hash = hash_password(new_password, self.bcrypt_cost).await?;
        self.store
            .students
            .mutate(|students| {
                let mut student = find(students, id)?.clone();
                student.password_hash = password_hash.clone();
                let identifier = student.sync_identifier().to_string();
                let (next, _) = replace_in(students, student)?;
                Ok(Mutation::new(next, ()).mirrored(RemoteChange::PasswordChange {
                    identifier,
                    new_password: new_password.to_string(),
                }))
            })
            .await
    }
}

// =========================================================================
//  HELPERS
// =========================================================================

fn find<'a>(students: &'a [Student], id: &str) -> Result<&'a Student, AppError> {
    students
        .iter()
        .find(|s| s.id == id)
        .ok_or_else(|| AppError::not_found("Student", id))
}

/// LRN unique, email unique ignoring case. `except` skips the student being edited.
fn ensure_unique_identity(students: &[Student], except: Option<&str>, lrn: &str, email: &str) -> Result<(), AppError> {
    let others = students.iter().filter(|s| Some(s.id.as_str()) != except);
    for other in others {
        if other.lrn == lrn {
            return Err(AppError::LrnAlreadyExists(lrn.to_string()));
        }
        if other.email.eq_ignore_ascii_case(email) {
            return Err(AppError::EmailAlreadyExists(email.to_string()));
        }
    }
    Ok(())
}

fn replace_in(students: &[Student], student: Student) -> Result<(Vec<Student>, Student), AppError> {
    let mut next = students.to_vec();
    let slot = next
        .iter_mut()
        .find(|s| s.id == student.id)
        .ok_or_else(|| AppError::not_found("Student", student.id.clone()))?;
    *slot = student.clone();
    Ok((next, student))
}

fn replace(students: &[Student], student: Student) -> Result<Mutation<Student, Student>, AppError> {
    let (next, student) = replace_in(students, student)?;
    let change = RemoteChange::Update {
        resource: Student::RESOURCE,
        id: student.id.clone(),
        body: remote_body(&student.clone().redacted()),
    };
    Ok(Mutation::new(next, student).mirrored(change))
}
