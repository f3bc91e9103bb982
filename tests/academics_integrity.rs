mod common;

use common::*;
use school_safety_backend::{
    common::error::AppError,
    models::{
        academics::{CreateGradeLevelPayload, CreateSectionPayload, UpdateGradeLevelPayload, UpdateSectionPayload},
        staff::Position,
    },
};

fn section(name: &str, grade: &str) -> CreateSectionPayload {
    CreateSectionPayload { name: name.into(), grade_level_id: grade.into(), advisor_id: None }
}

#[tokio::test]
async fn default_grade_levels_are_seeded_in_order() {
    let h = harness().await;
    let grades = h.state.academic_service.list_grade_levels().await.unwrap();

    let names: Vec<_> = grades.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, ["Grade 7", "Grade 8", "Grade 9", "Grade 10", "Grade 11", "Grade 12"]);
}

#[tokio::test]
async fn section_names_are_unique_per_grade_ignoring_case() {
    let h = harness().await;
    let service = &h.state.academic_service;

    service.create_section(&admin(), section("Rizal", "grade-7")).await.unwrap();

    let err = service.create_section(&admin(), section("rizal", "grade-7")).await.unwrap_err();
    assert!(matches!(err, AppError::SectionAlreadyExists { .. }));

    // Same name under another grade is fine.
    service.create_section(&admin(), section("RIZAL", "grade-8")).await.unwrap();

    let all = service.list_sections(None).await.unwrap();
    assert_eq!(all.len(), 2);
    let grade_7 = service.list_sections(Some("grade-7")).await.unwrap();
    assert_eq!(grade_7.len(), 1);
}

#[tokio::test]
async fn renaming_a_section_onto_a_sibling_fails() {
    let h = harness().await;
    let service = &h.state.academic_service;
    service.create_section(&admin(), section("Rizal", "grade-7")).await.unwrap();
    let other = service.create_section(&admin(), section("Bonifacio", "grade-7")).await.unwrap();

    let err = service
        .update_section(
            &admin(),
            &other.id,
            UpdateSectionPayload { name: Some("RIZAL".into()), ..Default::default() },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SectionAlreadyExists { .. }));
}

#[tokio::test]
async fn sections_need_an_existing_grade_level() {
    let h = harness().await;
    let err = h
        .state
        .academic_service
        .create_section(&admin(), section("Rizal", "grade-99"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { entity: "Grade level", .. }));
}

#[tokio::test]
async fn referenced_grade_level_cannot_be_deleted() {
    let h = harness().await;
    let state = &h.state;
    state.academic_service.create_section(&admin(), section("Rizal", "grade-7")).await.unwrap();
    state
        .student_service
        .create_student(&admin(), student_payload("1", "a@mail.test", "s1"))
        .await
        .unwrap();

    let before = state.academic_service.list_grade_levels().await.unwrap();
    let err = state.academic_service.delete_grade_level(&admin(), "grade-7").await.unwrap_err();
    assert!(matches!(err, AppError::GradeLevelInUse { students: 1, sections: 1 }));

    let after = state.academic_service.list_grade_levels().await.unwrap();
    assert_eq!(before, after);

    // An unreferenced grade goes away.
    assert!(state.academic_service.delete_grade_level(&admin(), "grade-12").await.unwrap());
    assert_eq!(state.academic_service.list_grade_levels().await.unwrap().len(), 5);
}

#[tokio::test]
async fn referenced_section_cannot_be_deleted() {
    let h = harness().await;
    let state = &h.state;
    let rizal = state.academic_service.create_section(&admin(), section("Rizal", "grade-7")).await.unwrap();
    state
        .student_service
        .create_student(&admin(), student_payload("1", "a@mail.test", &rizal.id))
        .await
        .unwrap();

    let err = state.academic_service.delete_section(&admin(), &rizal.id).await.unwrap_err();
    assert!(matches!(err, AppError::SectionInUse { students: 1 }));
    assert_eq!(state.academic_service.list_sections(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn grade_level_names_are_unique() {
    let h = harness().await;
    let service = &h.state.academic_service;

    let err = service
        .create_grade_level(&admin(), CreateGradeLevelPayload { name: "grade 7".into(), order: 13 })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::GradeLevelAlreadyExists(_)));

    let err = service
        .update_grade_level(
            &admin(),
            "grade-8",
            UpdateGradeLevelPayload { name: Some("Grade 7".into()), ..Default::default() },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::GradeLevelAlreadyExists(_)));
}

#[tokio::test]
async fn teachers_cannot_manage_the_structure() {
    let h = harness().await;
    let err = h
        .state
        .academic_service
        .create_section(&staff_actor("t1", Position::Teacher), section("Rizal", "grade-7"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(ref p) if p == "create_grades_sections"));
}
