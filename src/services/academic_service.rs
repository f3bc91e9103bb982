// src/services/academic_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{collection::remote_body, Mutation, RemoteChange, SchoolStore, StoredEntity},
    models::{
        academics::{
            CreateGradeLevelPayload, CreateSectionPayload, GradeLevel, Section, UpdateGradeLevelPayload,
            UpdateSectionPayload,
        },
        auth::Actor,
        staff::StaffPermission,
    },
    services::rbac_service::require,
};

/// Grade levels and sections. Referential checks read the student and section
/// collections in full before anything is written.
#[derive(Clone)]
pub struct AcademicService {
    store: SchoolStore,
}

impl AcademicService {
    pub fn new(store: SchoolStore) -> Self {
        Self { store }
    }

    // =========================================================================
    //  1. GRADE LEVELS
    // =========================================================================

    pub async fn list_grade_levels(&self) -> Result<Vec<GradeLevel>, AppError> {
        let mut grades = self.store.grade_levels.items().await?.to_vec();
        grades.sort_by_key(|g| g.order);
        Ok(grades)
    }

    pub async fn create_grade_level(&self, actor: &Actor, input: CreateGradeLevelPayload) -> Result<GradeLevel, AppError> {
        require(actor, StaffPermission::CreateGradesSections, None)?;

        let grade = GradeLevel {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            order: input.order,
            is_active: true,
        };

        self.store
            .grade_levels
            .mutate(|grades| {
                if grades.iter().any(|g| g.name.eq_ignore_ascii_case(&grade.name)) {
                    return Err(AppError::GradeLevelAlreadyExists(grade.name.clone()));
                }
                let mut next = grades.to_vec();
                next.push(grade.clone());
                Ok(Mutation::new(next, grade.clone()).mirrored(RemoteChange::Create {
                    resource: GradeLevel::RESOURCE,
                    body: remote_body(&grade),
                }))
            })
            .await
    }

    pub async fn update_grade_level(
        &self,
        actor: &Actor,
        id: &str,
        input: UpdateGradeLevelPayload,
    ) -> Result<GradeLevel, AppError> {
        require(actor, StaffPermission::CreateGradesSections, None)?;

        self.store
            .grade_levels
            .mutate(|grades| {
                let mut grade = grades
                    .iter()
                    .find(|g| g.id == id)
                    .cloned()
                    .ok_or_else(|| AppError::not_found("Grade level", id))?;

                if let Some(name) = &input.name {
                    let name = name.trim();
                    if grades.iter().any(|g| g.id != id && g.name.eq_ignore_ascii_case(name)) {
                        return Err(AppError::GradeLevelAlreadyExists(name.to_string()));
                    }
                    grade.name = name.to_string();
                }
                if let Some(order) = input.order {
                    grade.order = order;
                }
                if let Some(active) = input.is_active {
                    grade.is_active = active;
                }

                let next = grades.iter().map(|g| if g.id == id { grade.clone() } else { g.clone() }).collect();
                Ok(Mutation::new(next, grade.clone()).mirrored(RemoteChange::Update {
                    resource: GradeLevel::RESOURCE,
                    id: id.to_string(),
                    body: remote_body(&grade),
                }))
            })
            .await
    }

    /// Fails while any student or section still points at the grade level.
    pub async fn delete_grade_level(&self, actor: &Actor, id: &str) -> Result<bool, AppError> {
        require(actor, StaffPermission::CreateGradesSections, None)?;

        let students = self.store.students.items().await?;
        let sections = self.store.sections.items().await?;

        self.store
            .grade_levels
            .mutate(|grades| {
                if !grades.iter().any(|g| g.id == id) {
                    return Err(AppError::not_found("Grade level", id));
                }

                let student_refs = students.iter().filter(|s| s.grade_level_id == id).count();
                let section_refs = sections.iter().filter(|s| s.grade_level_id == id).count();
                if student_refs > 0 || section_refs > 0 {
                    return Err(AppError::GradeLevelInUse { students: student_refs, sections: section_refs });
                }

                let next = grades.iter().filter(|g| g.id != id).cloned().collect();
                Ok(Mutation::new(next, true).mirrored(RemoteChange::Delete {
                    resource: GradeLevel::RESOURCE,
                    id: id.to_string(),
                }))
            })
            .await
    }

    // =========================================================================
    //  2. SECTIONS
    // =========================================================================

    pub async fn list_sections(&self, grade_level_id: Option<&str>) -> Result<Vec<Section>, AppError> {
        let sections = self.store.sections.items().await?;
        Ok(sections
            .iter()
            .filter(|s| grade_level_id.is_none_or(|g| s.grade_level_id == g))
            .cloned()
            .collect())
    }

    pub async fn create_section(&self, actor: &Actor, input: CreateSectionPayload) -> Result<Section, AppError> {
        require(actor, StaffPermission::CreateGradesSections, None)?;

        if self.store.grade_levels.find(&input.grade_level_id).await?.is_none() {
            return Err(AppError::not_found("Grade level", input.grade_level_id));
        }
        if let Some(advisor_id) = &input.advisor_id {
            if self.store.staff.find(advisor_id).await?.is_none() {
                return Err(AppError::not_found("Staff member", advisor_id.clone()));
            }
        }

        let section = Section {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            grade_level_id: input.grade_level_id,
            advisor_id: input.advisor_id,
            is_active: true,
        };

        self.store
            .sections
            .mutate(|sections| {
                ensure_unique_section(sections, None, &section.name, &section.grade_level_id)?;
                let mut next = sections.to_vec();
                next.push(section.clone());
                Ok(Mutation::new(next, section.clone()).mirrored(RemoteChange::Create {
                    resource: Section::RESOURCE,
                    body: remote_body(&section),
                }))
            })
            .await
    }

    pub async fn update_section(&self, actor: &Actor, id: &str, input: UpdateSectionPayload) -> Result<Section, AppError> {
        require(actor, StaffPermission::CreateGradesSections, None)?;

        if let Some(advisor_id) = &input.advisor_id {
            if self.store.staff.find(advisor_id).await?.is_none() {
                return Err(AppError::not_found("Staff member", advisor_id.clone()));
            }
        }

        self.store
            .sections
            .mutate(|sections| {
                let mut section = sections
                    .iter()
                    .find(|s| s.id == id)
                    .cloned()
                    .ok_or_else(|| AppError::not_found("Section", id))?;

                if let Some(name) = &input.name {
                    section.name = name.trim().to_string();
                }
                if let Some(advisor_id) = &input.advisor_id {
                    section.advisor_id = Some(advisor_id.clone());
                }
                if let Some(active) = input.is_active {
                    section.is_active = active;
                }
                ensure_unique_section(sections, Some(id), &section.name, &section.grade_level_id)?;

                let next = sections.iter().map(|s| if s.id == id { section.clone() } else { s.clone() }).collect();
                Ok(Mutation::new(next, section.clone()).mirrored(RemoteChange::Update {
                    resource: Section::RESOURCE,
                    id: id.to_string(),
                    body: remote_body(&section),
                }))
            })
            .await
    }

    /// Fails while any student is placed in the section.
    pub async fn delete_section(&self, actor: &Actor, id: &str) -> Result<bool, AppError> {
        require(actor, StaffPermission::CreateGradesSections, None)?;

        let students = self.store.students.items().await?;

        self.store
            .sections
            .mutate(|sections| {
                if !sections.iter().any(|s| s.id == id) {
                    return Err(AppError::not_found("Section", id));
                }

                let student_refs = students.iter().filter(|s| s.section_id == id).count();
                if student_refs > 0 {
                    return Err(AppError::SectionInUse { students: student_refs });
                }

                let next = sections.iter().filter(|s| s.id != id).cloned().collect();
                Ok(Mutation::new(next, true).mirrored(RemoteChange::Delete {
                    resource: Section::RESOURCE,
                    id: id.to_string(),
                }))
            })
            .await
    }
}

/// (name, grade level) is unique, ignoring case on the name.
fn ensure_unique_section(sections: &[Section], except: Option<&str>, name: &str, grade_level_id: &str) -> Result<(), AppError> {
    let clash = sections.iter().any(|s| {
        Some(s.id.as_str()) != except && s.grade_level_id == grade_level_id && s.name.eq_ignore_ascii_case(name)
    });
    if clash {
        return Err(AppError::SectionAlreadyExists {
            name: name.to_string(),
            grade_level_id: grade_level_id.to_string(),
        });
    }
    Ok(())
}
