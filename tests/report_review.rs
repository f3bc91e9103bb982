mod common;

use common::*;
use school_safety_backend::{
    common::error::AppError,
    models::{
        report::{IncidentType, Priority, ReportStatus, ReviewAction, SubmitReportPayload, VictimInfo},
        staff::Position,
    },
};

fn report(anonymous: bool) -> SubmitReportPayload {
    SubmitReportPayload {
        is_anonymous: anonymous,
        victim: VictimInfo { name: "Ben".into(), grade_level: Some("Grade 8".into()), section: None },
        incident_type: IncidentType::Verbal,
        priority: Priority::High,
        location: location(),
        description: "Name-calling during recess".into(),
        photo_evidence: None,
    }
}

#[tokio::test]
async fn submitted_reports_start_under_review() {
    let h = harness().await;
    let filed = h
        .state
        .report_service
        .submit_report(&student_actor("s1"), report(false))
        .await
        .unwrap();

    assert_eq!(filed.status, ReportStatus::UnderReview);
    assert_eq!(filed.reporter_id, "s1");
    assert!(filed.review_history.is_empty());
}

#[tokio::test]
async fn anonymity_hides_the_reporter_from_regular_staff_only() {
    let h = harness().await;
    let service = &h.state.report_service;
    let filed = service.submit_report(&student_actor("s1"), report(true)).await.unwrap();

    // Reporters still see themselves.
    assert_eq!(filed.reporter_name, "Student s1");

    let teacher_view = service.get_report(&teacher("t1", &[]), &filed.id).await.unwrap();
    assert_eq!(teacher_view.reporter_name, "Anonymous");
    assert!(teacher_view.reporter_id.is_empty());

    let counselor_view = service
        .get_report(&staff_actor("c1", Position::GuidanceCounselor), &filed.id)
        .await
        .unwrap();
    assert_eq!(counselor_view.reporter_id, "s1");

    // Storage keeps the identity.
    let stored = h.state.store.reports.find(&filed.id).await.unwrap().unwrap();
    assert_eq!(stored.reporter_name, "Student s1");
}

#[tokio::test]
async fn reporters_only_see_their_own_reports() {
    let h = harness().await;
    let service = &h.state.report_service;
    service.submit_report(&student_actor("s1"), report(false)).await.unwrap();
    service.submit_report(&student_actor("s2"), report(false)).await.unwrap();

    assert_eq!(service.list_reports(&student_actor("s1")).await.unwrap().len(), 1);
    assert_eq!(service.list_reports(&teacher("t1", &[])).await.unwrap().len(), 2);

    let other = service.list_reports(&student_actor("s2")).await.unwrap().remove(0);
    let err = service.get_report(&student_actor("s1"), &other.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn accepting_is_terminal() {
    let h = harness().await;
    let service = &h.state.report_service;
    let reviewer = staff_actor("c1", Position::GuidanceCounselor);
    let filed = service.submit_report(&student_actor("s1"), report(false)).await.unwrap();

    let accepted = service
        .accept_report(&reviewer, &filed.id, Some("Parents informed".into()))
        .await
        .unwrap();
    assert_eq!(accepted.status, ReportStatus::Accepted);
    assert_eq!(accepted.review_history.len(), 1);
    assert_eq!(accepted.review_history[0].action, ReviewAction::Accepted);

    let err = service.decline_report(&reviewer, &filed.id, "Duplicate").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));

    // Notes are still allowed afterwards.
    let noted = service.add_review_note(&reviewer, &filed.id, "Follow-up done").await.unwrap();
    assert_eq!(noted.status, ReportStatus::Accepted);
    assert_eq!(noted.review_history.len(), 2);
    assert_eq!(noted.review_history[1].action, ReviewAction::Note);
}

#[tokio::test]
async fn declining_needs_a_reason() {
    let h = harness().await;
    let service = &h.state.report_service;
    let reviewer = staff_actor("p1", Position::Principal);
    let filed = service.submit_report(&student_actor("s1"), report(false)).await.unwrap();

    let err = service.decline_report(&reviewer, &filed.id, "   ").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let declined = service.decline_report(&reviewer, &filed.id, "Not enough detail").await.unwrap();
    assert_eq!(declined.status, ReportStatus::Declined);
    assert_eq!(declined.decline_reason.as_deref(), Some("Not enough detail"));
}

#[tokio::test]
async fn students_cannot_review() {
    let h = harness().await;
    let service = &h.state.report_service;
    let filed = service.submit_report(&student_actor("s1"), report(false)).await.unwrap();

    let err = service.accept_report(&student_actor("s1"), &filed.id, None).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(ref p) if p == "manage_reports"));
}
