mod common;

use common::*;
use school_safety_backend::{
    common::error::AppError,
    models::{
        academics::CreateSectionPayload,
        auth::ActorKind,
        building::{CreateBuildingPayload, UpdateBuildingPayload},
        staff::{CreateStaffPayload, Position, StaffPermission, UpdateStaffPayload},
    },
};

fn staff(staff_id: &str, email: &str, position: Position) -> CreateStaffPayload {
    CreateStaffPayload {
        full_name: format!("Staff {staff_id}"),
        staff_id: staff_id.into(),
        school_email: email.into(),
        password: "secret123".into(),
        position,
        specialization: Some("Math".into()),
        rank: Some("Teacher I".into()),
        cluster_role: None,
        permissions: None,
        assigned_grade_level_ids: vec!["grade-7".into()],
        assigned_section_ids: vec!["s1".into()],
        profile_photo: None,
    }
}

#[tokio::test]
async fn new_staff_get_their_position_bundle() {
    let h = harness().await;
    let service = &h.state.staff_service;

    let counselor = service
        .create_staff(&admin(), staff("G-1", "g1@school.test", Position::GuidanceCounselor))
        .await
        .unwrap();
    let mut expected = Position::GuidanceCounselor.default_permissions();
    expected.sort();
    assert_eq!(counselor.permissions, expected);

    // Teacher-only attributes are dropped for other positions.
    assert!(counselor.specialization.is_none());
    assert!(counselor.assigned_section_ids.is_empty());

    let teacher = service
        .create_staff(&admin(), staff("T-1", "t1@school.test", Position::Teacher))
        .await
        .unwrap();
    assert_eq!(teacher.assigned_section_ids, ["s1"]);
    assert!(teacher.password_hash.is_empty());
}

#[tokio::test]
async fn staff_id_and_email_are_unique() {
    let h = harness().await;
    let service = &h.state.staff_service;
    service
        .create_staff(&admin(), staff("T-1", "t1@school.test", Position::Teacher))
        .await
        .unwrap();

    let err = service
        .create_staff(&admin(), staff("T-1", "other@school.test", Position::Teacher))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StaffIdAlreadyExists(_)));

    let err = service
        .create_staff(&admin(), staff("T-2", "T1@School.test", Position::Teacher))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmailAlreadyExists(_)));
}

#[tokio::test]
async fn permission_edits_take_effect_on_the_next_request() {
    let h = harness().await;
    let member = h
        .state
        .staff_service
        .create_staff(&admin(), staff("T-1", "t1@school.test", Position::Teacher))
        .await
        .unwrap();

    let vp = staff_actor("vp", Position::VicePrincipal);
    let err = h
        .state
        .staff_service
        .update_staff_permissions(&vp, &member.id, vec![StaffPermission::EditAnyStudent])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(ref p) if p == "manage_permissions"));

    h.state
        .staff_service
        .update_staff_permissions(
            &admin(),
            &member.id,
            vec![StaffPermission::EditStudents, StaffPermission::EditAnyStudent, StaffPermission::EditStudents],
        )
        .await
        .unwrap();

    let token = h.state.auth_service.create_token(&member.id, ActorKind::Staff).unwrap();
    let actor = h.state.auth_service.validate_token(&token).await.unwrap();
    assert_eq!(actor.permissions, [StaffPermission::EditStudents, StaffPermission::EditAnyStudent]);
}

#[tokio::test]
async fn staff_edit_their_own_profile_but_not_their_placement() {
    let h = harness().await;
    let member = h
        .state
        .staff_service
        .create_staff(&admin(), staff("T-1", "t1@school.test", Position::Teacher))
        .await
        .unwrap();
    let me = teacher(&member.id, &["s1"]);

    let renamed = h
        .state
        .staff_service
        .update_staff_profile(&me, &member.id, UpdateStaffPayload { full_name: Some("Ms. Cruz".into()), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(renamed.full_name, "Ms. Cruz");

    let err = h
        .state
        .staff_service
        .update_staff_profile(
            &me,
            &member.id,
            UpdateStaffPayload { assigned_section_ids: Some(vec!["s2".into()]), ..Default::default() },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(ref p) if p == "edit_staff_profiles"));
}

#[tokio::test]
async fn advisors_cannot_be_deleted() {
    let h = harness().await;
    let member = h
        .state
        .staff_service
        .create_staff(&admin(), staff("T-1", "t1@school.test", Position::Teacher))
        .await
        .unwrap();
    h.state
        .academic_service
        .create_section(
            &admin(),
            CreateSectionPayload { name: "Rizal".into(), grade_level_id: "grade-7".into(), advisor_id: Some(member.id.clone()) },
        )
        .await
        .unwrap();

    let err = h.state.staff_service.delete_staff(&admin(), &member.id).await.unwrap_err();
    assert!(matches!(err, AppError::StaffInUse { sections: 1 }));
    assert_eq!(h.state.staff_service.list_staff(&admin()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn staff_and_students_sign_in_with_their_passwords() {
    let h = harness().await;
    let member = h
        .state
        .staff_service
        .create_staff(&admin(), staff("T-1", "t1@school.test", Position::Teacher))
        .await
        .unwrap();

    let (_, actor) = h.state.auth_service.login("T1@school.test", "secret123").await.unwrap();
    assert_eq!(actor.id, member.id);

    let err = h.state.auth_service.login("t1@school.test", "wrong").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));

    h.state.staff_service.change_staff_password(&actor, &member.id, "changed1").await.unwrap();
    h.state.auth_service.login("t1@school.test", "changed1").await.unwrap();

    h.state
        .student_service
        .create_student(&admin(), student_payload("1", "kid@mail.test", "s1"))
        .await
        .unwrap();
    let (_, student) = h.state.auth_service.login("kid@mail.test", "secret123").await.unwrap();
    assert_eq!(student.role_label(), "student");
}

#[tokio::test]
async fn building_names_are_unique_and_need_manage_buildings() {
    let h = harness().await;
    let service = &h.state.building_service;
    let building = |name: &str| CreateBuildingPayload { name: name.into(), floors: 3, color: "#2563eb".into() };

    let vp = staff_actor("vp", Position::VicePrincipal);
    let err = service.create_building(&vp, building("Main")).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(ref p) if p == "manage_buildings"));

    let principal = staff_actor("p", Position::Principal);
    let main = service.create_building(&principal, building("Main")).await.unwrap();
    let err = service.create_building(&principal, building("main")).await.unwrap_err();
    assert!(matches!(err, AppError::BuildingAlreadyExists(_)));

    let updated = service
        .update_building(&principal, &main.id, UpdateBuildingPayload { floors: Some(4), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(updated.floors, 4);

    assert!(service.delete_building(&principal, &main.id).await.unwrap());
    assert!(service.list_buildings().await.unwrap().is_empty());
}

#[tokio::test]
async fn students_cannot_browse_the_staff_directory() {
    let h = harness().await;
    let member = h
        .state
        .staff_service
        .create_staff(&admin(), staff("T-1", "t1@school.test", Position::Teacher))
        .await
        .unwrap();
    let service = &h.state.staff_service;

    let err = service.list_staff(&student_actor("kid")).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(ref p) if p == "view_staff_directory"));
    let err = service.get_staff(&student_actor("kid"), &member.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let colleague = staff_actor("other", Position::Teacher);
    assert_eq!(service.list_staff(&colleague).await.unwrap().len(), 1);
    assert!(service.get_staff(&colleague, &member.id).await.unwrap().password_hash.is_empty());
}
