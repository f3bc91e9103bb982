// src/services/staff_service.rs

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{collection::remote_body, Mutation, RemoteChange, SchoolStore, StoredEntity},
    models::{
        auth::{Actor, ActorKind},
        staff::{CreateStaffPayload, Position, StaffMember, StaffPermission, UpdateStaffPayload},
    },
    services::{auth::hash_password, rbac_service::require},
};

#[derive(Clone)]
pub struct StaffService {
    store: SchoolStore,
    bcrypt_cost: u32,
}

impl StaffService {
    pub fn new(store: SchoolStore, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    pub async fn list_staff(&self, actor: &Actor) -> Result<Vec<StaffMember>, AppError> {
        ensure_directory_access(actor)?;
        let staff = self.store.staff.items().await?;
        Ok(staff.iter().cloned().map(StaffMember::redacted).collect())
    }

    pub async fn get_staff(&self, actor: &Actor, id: &str) -> Result<StaffMember, AppError> {
        ensure_directory_access(actor)?;
        self.store
            .staff
            .find(id)
            .await?
            .map(StaffMember::redacted)
            .ok_or_else(|| AppError::not_found("Staff member", id))
    }

    pub async fn create_staff(&self, actor: &Actor, input: CreateStaffPayload) -> Result<StaffMember, AppError> {
        require(actor, StaffPermission::ManageStaffAccounts, None)?;

        let password_hash = hash_password(&input.password, self.bcrypt_cost).await?;

        // 1. Seed permissions from the position unless given explicitly
        let mut permissions = input
            .permissions
            .unwrap_or_else(|| input.position.default_permissions());
        permissions.sort();
        permissions.dedup();

        let mut member = StaffMember {
            id: Uuid::new_v4().to_string(),
            full_name: input.full_name.trim().to_string(),
            staff_id: input.staff_id.trim().to_string(),
            school_email: input.school_email.trim().to_string(),
            password_hash,
            position: input.position,
            specialization: input.specialization,
            rank: input.rank,
            cluster_role: input.cluster_role,
            permissions,
            assigned_grade_level_ids: input.assigned_grade_level_ids,
            assigned_section_ids: input.assigned_section_ids,
            profile_photo: input.profile_photo,
            is_active: true,
            created_at: Utc::now(),
        };
        clear_teacher_attributes(&mut member);

        // 2. Uniqueness + append
        let created = self
            .store
            .staff
            .mutate(|staff| {
                ensure_unique_staff(staff, None, &member.staff_id, &member.school_email)?;
                let mut next = staff.to_vec();
                next.push(member.clone());
                Ok(Mutation::new(next, member.clone()).mirrored(RemoteChange::Create {
                    resource: StaffMember::RESOURCE,
                    body: remote_body(&member.clone().redacted()),
                }))
            })
            .await?;

        tracing::info!("staff member {} ({:?}) created by {}", created.id, created.position, actor.id);
        Ok(created.redacted())
    }

    /// Profile edits. Staff may edit their own profile apart from position and scope.
    pub async fn update_staff_profile(
        &self,
        actor: &Actor,
        id: &str,
        input: UpdateStaffPayload,
    ) -> Result<StaffMember, AppError> {
        let touches_placement = input.position.is_some()
            || input.assigned_grade_level_ids.is_some()
            || input.assigned_section_ids.is_some()
            || input.is_active.is_some();
        if actor.id != id || touches_placement {
            require(actor, StaffPermission::EditStaffProfiles, None)?;
        }

        let updated = self
            .store
            .staff
            .mutate(|staff| {
                let mut member = find(staff, id)?.clone();
                if let Some(name) = &input.full_name {
                    member.full_name = name.trim().to_string();
                }
                if let Some(email) = &input.school_email {
                    member.school_email = email.trim().to_string();
                }
                if let Some(position) = input.position {
                    member.position = position;
                }
                if input.specialization.is_some() {
                    member.specialization = input.specialization.clone();
                }
                if input.rank.is_some() {
                    member.rank = input.rank.clone();
                }
                if input.cluster_role.is_some() {
                    member.cluster_role = input.cluster_role.clone();
                }
                if let Some(grades) = &input.assigned_grade_level_ids {
                    member.assigned_grade_level_ids = grades.clone();
                }
                if let Some(sections) = &input.assigned_section_ids {
                    member.assigned_section_ids = sections.clone();
                }
                if input.profile_photo.is_some() {
                    member.profile_photo = input.profile_photo.clone();
                }
                if let Some(active) = input.is_active {
                    member.is_active = active;
                }
                clear_teacher_attributes(&mut member);

                ensure_unique_staff(staff, Some(id), &member.staff_id, &member.school_email)?;
                replace(staff, member)
            })
            .await?;

        Ok(updated.redacted())
    }

    pub async fn update_staff_permissions(
        &self,
        actor: &Actor,
        id: &str,
        permissions: Vec<StaffPermission>,
    ) -> Result<StaffMember, AppError> {
        require(actor, StaffPermission::ManagePermissions, None)?;

        let mut permissions = permissions;
        permissions.sort();
        permissions.dedup();

        let updated = self
            .store
            .staff
            .mutate(|staff| {
                let mut member = find(staff, id)?.clone();
                member.permissions = permissions.clone();
                replace(staff, member)
            })
            .await?;

        tracing::info!("permissions for staff {} set to {:?} by {}", id, updated.permissions, actor.id);
        Ok(updated.redacted())
    }

    /// Fails while the staff member advises any section.
    pub async fn delete_staff(&self, actor: &Actor, id: &str) -> Result<bool, AppError> {
        require(actor, StaffPermission::ManageStaffAccounts, None)?;

        let sections = self.store.sections.items().await?;
        let advised = sections.iter().filter(|s| s.advisor_id.as_deref() == Some(id)).count();

        self.store
            .staff
            .mutate(|staff| {
                find(staff, id)?;
                if advised > 0 {
                    return Err(AppError::StaffInUse { sections: advised });
                }
                let next = staff.iter().filter(|m| m.id != id).cloned().collect();
                Ok(Mutation::new(next, true).mirrored(RemoteChange::Delete {
                    resource: StaffMember::RESOURCE,
                    id: id.to_string(),
                }))
            })
            .await
    }

    /// Always applied locally; mirrored to the remote keyed by school email.
    pub async fn change_staff_password(&self, actor: &Actor, id: &str, new_password: &str) -> Result<(), AppError> {
        if actor.id != id {
            require(actor, StaffPermission::ManageStaffAccounts, None)?;
        }

        let password_hash = hash_password(new_password, self.bcrypt_cost).await?;
        self.store
            .staff
            .mutate(|staff| {
                let mut member = find(staff, id)?.clone();
                member.password_hash = password_hash.clone();
                let identifier = if member.school_email.trim().is_empty() {
                    member.id.clone()
                } else {
                    member.school_email.clone()
                };
                let Mutation { items, .. } = replace(staff, member)?;
                Ok(Mutation { items, output: (), change: None }.mirrored(RemoteChange::PasswordChange {
                    identifier,
                    new_password: new_password.to_string(),
                }))
            })
            .await
    }
}

// Students never see the staff directory.
fn ensure_directory_access(actor: &Actor) -> Result<(), AppError> {
    match actor.kind {
        ActorKind::Student => Err(AppError::Forbidden("view_staff_directory".into())),
        ActorKind::Admin | ActorKind::Staff => Ok(()),
    }
}

fn find<'a>(staff: &'a [StaffMember], id: &str) -> Result<&'a StaffMember, AppError> {
    staff
        .iter()
        .find(|m| m.id == id)
        .ok_or_else(|| AppError::not_found("Staff member", id))
}

fn ensure_unique_staff(staff: &[StaffMember], except: Option<&str>, staff_id: &str, school_email: &str) -> Result<(), AppError> {
    for other in staff.iter().filter(|m| Some(m.id.as_str()) != except) {
        if other.staff_id == staff_id {
            return Err(AppError::StaffIdAlreadyExists(staff_id.to_string()));
        }
        if other.school_email.eq_ignore_ascii_case(school_email) {
            return Err(AppError::EmailAlreadyExists(school_email.to_string()));
        }
    }
    Ok(())
}

// Specialization, rank, cluster role and section scope only apply to teachers.
fn clear_teacher_attributes(member: &mut StaffMember) {
    if member.position != Position::Teacher {
        member.specialization = None;
        member.rank = None;
        member.cluster_role = None;
        member.assigned_grade_level_ids.clear();
        member.assigned_section_ids.clear();
    }
}

fn replace(staff: &[StaffMember], member: StaffMember) -> Result<Mutation<StaffMember, StaffMember>, AppError> {
    let mut next = staff.to_vec();
    let slot = next
        .iter_mut()
        .find(|m| m.id == member.id)
        .ok_or_else(|| AppError::not_found("Staff member", member.id.clone()))?;
    *slot = member.clone();

    let change = RemoteChange::Update {
        resource: StaffMember::RESOURCE,
        id: member.id.clone(),
        body: remote_body(&member.clone().redacted()),
    };
    Ok(Mutation::new(next, member).mirrored(change))
}
