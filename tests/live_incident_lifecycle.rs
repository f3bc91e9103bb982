mod common;

use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use common::*;
use school_safety_backend::{
    common::error::AppError,
    models::{
        live_incident::{IncidentPhase, LiveIncidentStatus, ReportLiveIncidentPayload},
        report::IncidentType,
        staff::Position,
    },
    services::{alert_service::AlertVisibility, TickSource},
};

#[tokio::test]
async fn anyone_can_raise_a_live_incident() {
    let h = harness().await;
    let incident = h
        .state
        .live_incident_service
        .report_live_incident(
            &student_actor("stu1"),
            ReportLiveIncidentPayload {
                location: location(),
                incident_type: IncidentType::Physical,
                description: "  Fight in the canteen ".into(),
            },
        )
        .await
        .unwrap();

    assert_eq!(incident.status, LiveIncidentStatus::Active);
    assert_eq!(incident.phase(), IncidentPhase::NoResponse);
    assert_eq!(incident.description, "Fight in the canteen");
    assert_eq!(incident.reporter_id, "stu1");

    let active = h.state.live_incident_service.list_active_incidents().await.unwrap();
    assert_eq!(active.len(), 1);
}

#[tokio::test]
async fn only_fresh_incidents_pop_up() {
    let h = harness().await;
    seed_incident(&h.state, "old", 30).await;
    seed_incident(&h.state, "fresh", 10).await;

    let viewer = staff_actor("t1", Position::Teacher);
    let alert = h
        .state
        .live_incident_service
        .current_alert(&viewer, Utc::now())
        .await
        .unwrap()
        .expect("the 10s-old incident should alert");

    assert_eq!(alert.incident.id, "fresh");
    assert!(alert.remaining_seconds <= 15 && alert.remaining_seconds >= 14);
    assert_eq!(alert.window_seconds, 25);
}

#[tokio::test]
async fn dismissal_is_per_viewer_and_leaves_the_incident_alone() {
    let h = harness().await;
    seed_incident(&h.state, "fresh", 5).await;
    let service = &h.state.live_incident_service;
    let a = staff_actor("a", Position::Teacher);
    let b = staff_actor("b", Position::Teacher);

    assert!(service.current_alert(&a, Utc::now()).await.unwrap().is_some());
    service.dismiss_alert(&a, "fresh").await.unwrap();

    assert!(service.current_alert(&a, Utc::now()).await.unwrap().is_none());
    assert!(service.current_alert(&b, Utc::now()).await.unwrap().is_some());

    let incident = h.state.store.live_incidents.find("fresh").await.unwrap().unwrap();
    assert_eq!(incident.status, LiveIncidentStatus::Active);
    assert!(incident.responders.is_empty());
    assert_eq!(h.state.alert_center.visibility("a", "fresh").await, AlertVisibility::Dismissed);
}

#[tokio::test]
async fn dismissing_an_unknown_incident_is_not_found() {
    let h = harness().await;
    let err = h
        .state
        .live_incident_service
        .dismiss_alert(&admin(), "missing")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

#[tokio::test]
async fn responding_registers_once_and_hides_the_alert() {
    let h = harness().await;
    seed_incident(&h.state, "fresh", 3).await;
    let service = &h.state.live_incident_service;
    let responder = staff_actor("c1", Position::GuidanceCounselor);

    assert!(service.current_alert(&responder, Utc::now()).await.unwrap().is_some());

    let first = service.respond_to_incident(&responder, "fresh").await.unwrap();
    let version = h.state.store.live_incidents.snapshot().await.unwrap().version;
    let second = service.respond_to_incident(&responder, "fresh").await.unwrap();

    // The repeat is not written at all.
    assert_eq!(h.state.store.live_incidents.snapshot().await.unwrap().version, version);

    assert_eq!(first.responders.len(), 1);
    assert_eq!(second.responders.len(), 1);
    assert_eq!(second.responders[0].user_role, "guidance_counselor");
    assert_eq!(second.phase(), IncidentPhase::HasResponders);
    assert!(service.is_user_responding("c1", "fresh").await.unwrap());

    assert!(service.current_alert(&responder, Utc::now()).await.unwrap().is_none());
    assert_eq!(
        h.state.alert_center.visibility("c1", "fresh").await,
        AlertVisibility::RespondedTo
    );
}

#[tokio::test]
async fn students_cannot_respond() {
    let h = harness().await;
    seed_incident(&h.state, "fresh", 3).await;

    let err = h
        .state
        .live_incident_service
        .respond_to_incident(&student_actor("s"), "fresh")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn resolving_twice_fails_without_a_second_record() {
    let h = harness().await;
    seed_incident(&h.state, "fresh", 3).await;
    let service = &h.state.live_incident_service;
    let principal = staff_actor("p", Position::Principal);

    let resolved = service.resolve_incident(&principal, "fresh").await.unwrap();
    assert_eq!(resolved.status, LiveIncidentStatus::Resolved);
    assert_eq!(resolved.resolved_by.as_deref(), Some("Staff p"));
    let first_resolution = resolved.resolved_at;

    let err = service.resolve_incident(&principal, "fresh").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));

    let stored = h.state.store.live_incidents.find("fresh").await.unwrap().unwrap();
    assert_eq!(stored.resolved_at, first_resolution);

    // Nobody joins a resolved incident.
    let err = service
        .respond_to_incident(&staff_actor("t", Position::Teacher), "fresh")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
    assert!(service.list_active_incidents().await.unwrap().is_empty());
}

#[tokio::test]
async fn responders_can_resolve_without_manage_reports() {
    let h = harness().await;
    seed_incident(&h.state, "fresh", 3).await;
    let service = &h.state.live_incident_service;
    let helper = with_permissions(staff_actor("t", Position::Teacher), &[]);

    let err = service.resolve_incident(&helper, "fresh").await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    service.respond_to_incident(&helper, "fresh").await.unwrap();
    service.resolve_incident(&helper, "fresh").await.unwrap();
}

#[tokio::test]
async fn countdown_reaching_zero_auto_dismisses() {
    let h = harness().await;
    seed_incident(&h.state, "fresh", 20).await;
    let center = &h.state.alert_center;

    assert!(center.current_alert("t1", Utc::now()).await.unwrap().is_some());

    center.on_tick(Utc::now() + Duration::seconds(2)).await.unwrap();
    assert_eq!(center.visibility("t1", "fresh").await, AlertVisibility::AlertShown);

    center.on_tick(Utc::now() + Duration::seconds(10)).await.unwrap();
    assert_eq!(center.visibility("t1", "fresh").await, AlertVisibility::Dismissed);

    let incident = h.state.store.live_incidents.find("fresh").await.unwrap().unwrap();
    assert_eq!(incident.status, LiveIncidentStatus::Active);
}

#[tokio::test]
async fn unmounted_viewers_stop_ticking_but_keep_dismissals() {
    let h = harness().await;
    seed_incident(&h.state, "first", 5).await;
    seed_incident(&h.state, "second", 4).await;
    let center = &h.state.alert_center;

    let shown = center.current_alert("v", Utc::now()).await.unwrap().unwrap();
    assert_eq!(shown.incident.id, "first");
    center.dismiss("v", "first").await;

    assert!(center.unmount("v").await);
    assert!(!center.is_mounted("v").await);

    // Ticks past the window do not touch an unmounted viewer.
    center.on_tick(Utc::now() + Duration::seconds(60)).await.unwrap();
    assert_eq!(center.visibility("v", "second").await, AlertVisibility::New);

    let next = center.current_alert("v", Utc::now()).await.unwrap().unwrap();
    assert_eq!(next.incident.id, "second");
}

#[tokio::test]
async fn one_tick_source_drives_the_alert_center() {
    let h = harness().await;
    seed_incident(&h.state, "expiring", 25).await;
    let center = h.state.alert_center.clone();

    // Mounted while the incident is still (barely) in the window.
    let mounted_at = Utc::now() - Duration::seconds(1);
    assert!(center.current_alert("v", mounted_at).await.unwrap().is_some());

    let ticks = TickSource::new(StdDuration::from_millis(10));
    let receiver = ticks.subscribe();
    let ticking = ticks.spawn();
    let running = tokio::spawn(center.clone().run(receiver));

    tokio::time::sleep(StdDuration::from_millis(100)).await;
    assert_eq!(center.visibility("v", "expiring").await, AlertVisibility::Dismissed);

    ticking.abort();
    running.abort();
}
