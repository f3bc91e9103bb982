mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::*;
use serde_json::json;
use school_safety_backend::{
    common::error::{AppError, StoreError},
    db::{
        local_store::StoredValue, remote_sync::to_snake_case_keys, Collection, LoadSource, LocalStore,
        MemoryLocalStore, Mutation, RemoteChange, SqliteLocalStore, SyncGateway, SyncPolicy,
    },
    models::{academics::GradeLevel, student::Student},
};

#[tokio::test]
async fn remote_payload_is_normalized_and_cached() {
    let remote = FakeRemote::new();
    remote
        .serve(
            "grade-levels",
            json!([{ "id": "g7", "name": "Grade 7", "order": 7, "is_active": false }]),
        )
        .await;
    let h = harness_with(SyncPolicy::LocalWins, remote, Arc::new(MemoryLocalStore::new())).await;

    assert_eq!(h.state.store.grade_levels.reconcile().await.unwrap(), LoadSource::Remote);

    let grades = h.state.store.grade_levels.items().await.unwrap();
    assert_eq!(grades.len(), 1);
    assert!(!grades[0].is_active);

    let cached = h.local.read("school_grade_levels").await.unwrap().unwrap();
    assert!(cached.payload.contains("\"isActive\":false"));
}

#[tokio::test]
async fn remote_failure_falls_back_to_cache() {
    let local = Arc::new(MemoryLocalStore::new());
    local
        .seed(
            "school_grade_levels",
            r#"[{"id":"g1","name":"Kinder","order":0,"isActive":true}]"#,
        )
        .await;
    let remote = FakeRemote::new();
    remote.fail(true).await;
    let h = harness_with(SyncPolicy::LocalWins, remote, local).await;

    assert_eq!(h.state.store.grade_levels.reconcile().await.unwrap(), LoadSource::Cache);
    let grades = h.state.store.grade_levels.items().await.unwrap();
    assert_eq!(grades[0].name, "Kinder");
}

#[tokio::test]
async fn nothing_anywhere_uses_defaults() {
    let h = harness().await;

    assert_eq!(h.state.store.grade_levels.reconcile().await.unwrap(), LoadSource::Defaults);
    assert_eq!(h.state.store.students.reconcile().await.unwrap(), LoadSource::Defaults);
    assert!(h.state.store.students.items().await.unwrap().is_empty());

    let snapshot = h.state.store.grade_levels.snapshot().await.unwrap();
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.items.len(), 6);
}

#[tokio::test]
async fn strict_policy_surfaces_remote_failures() {
    let remote = FakeRemote::new();
    remote.fail(true).await;
    let h = harness_with(SyncPolicy::Strict, remote.clone(), Arc::new(MemoryLocalStore::new())).await;

    let err = h.state.store.students.reconcile().await.unwrap_err();
    assert!(matches!(err, AppError::RemoteSync(_)));

    // Once the remote answers, a failing push aborts the mutation before the local write.
    remote.serve("students", json!([])).await;
    remote.fail(false).await;
    h.state.store.students.reconcile().await.unwrap();
    remote.fail(true).await;

    let err = h
        .state
        .student_service
        .create_student(&admin(), student_payload("1", "a@mail.test", "s1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::RemoteSync(_)));
    assert!(h.state.store.students.items().await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_writers_do_not_lose_updates() {
    let local = Arc::new(MemoryLocalStore::new());
    let first = harness_with(SyncPolicy::LocalWins, FakeRemote::new(), local.clone()).await;
    let second = harness_with(SyncPolicy::LocalWins, FakeRemote::new(), local.clone()).await;

    // Both load the same (empty) version before either writes.
    first.state.store.students.items().await.unwrap();
    second.state.store.students.items().await.unwrap();

    first
        .state
        .student_service
        .create_student(&admin(), student_payload("1", "a@mail.test", "s1"))
        .await
        .unwrap();

    // The second writer's snapshot is stale; its CAS fails once and the retry
    // re-validates against the first writer's data.
    let err = second
        .state
        .student_service
        .create_student(&admin(), student_payload("1", "b@mail.test", "s1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::LrnAlreadyExists(_)));

    second
        .state
        .student_service
        .create_student(&admin(), student_payload("2", "b@mail.test", "s1"))
        .await
        .unwrap();

    let stored = local.read("school_students").await.unwrap().unwrap();
    let students: Vec<Student> = serde_json::from_str(&stored.payload).unwrap();
    let mut lrns: Vec<_> = students.iter().map(|s| s.lrn.as_str()).collect();
    lrns.sort();
    assert_eq!(lrns, ["1", "2"]);
}

/// Every write loses the race.
struct ContendedStore;

#[async_trait]
impl LocalStore for ContendedStore {
    async fn read(&self, _key: &str) -> Result<Option<StoredValue>, StoreError> {
        Ok(None)
    }

    async fn write(&self, key: &str, expected_version: u64, _payload: &str) -> Result<u64, StoreError> {
        Err(StoreError::VersionConflict { key: key.to_string(), expected: expected_version, found: expected_version + 1 })
    }
}

#[tokio::test]
async fn exhausted_retries_report_a_conflict() {
    let grades: Collection<GradeLevel> = Collection::new(Arc::new(ContendedStore), SyncGateway::offline());

    let mut attempts = 0;
    let err = grades
        .mutate(|items| {
            attempts += 1;
            Ok(Mutation::new(items.to_vec(), ()))
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict("school_grade_levels")));
    assert_eq!(attempts, 3);
}

#[tokio::test]
async fn subscribers_are_notified_of_changes() {
    let h = harness().await;
    let mut changes = h.state.store.students.subscribe();
    h.state.store.students.items().await.unwrap();
    changes.mark_unchanged();

    h.state
        .student_service
        .create_student(&admin(), student_payload("1", "a@mail.test", "s1"))
        .await
        .unwrap();

    assert!(changes.has_changed().unwrap());
    assert_eq!(*changes.borrow_and_update(), 1);
}

#[tokio::test]
async fn sqlite_store_survives_a_restart_of_the_collections() {
    let sqlite = Arc::new(SqliteLocalStore::connect("sqlite::memory:").await.unwrap());

    let first = school_safety_backend::config::AppState::assemble(
        sqlite.clone(),
        SyncGateway::offline(),
        None,
        JWT_SECRET.into(),
        BCRYPT_COST,
    );
    first
        .student_service
        .create_student(&admin(), student_payload("1", "a@mail.test", "s1"))
        .await
        .unwrap();

    let second = school_safety_backend::config::AppState::assemble(
        sqlite,
        SyncGateway::offline(),
        None,
        JWT_SECRET.into(),
        BCRYPT_COST,
    );
    assert_eq!(second.store.students.reconcile().await.unwrap(), LoadSource::Cache);
    assert_eq!(second.store.students.items().await.unwrap().len(), 1);
}

#[tokio::test]
async fn remote_refresh_keeps_local_password_hashes() {
    let h = harness().await;
    h.state
        .student_service
        .create_student(&admin(), student_payload("1", "kid@mail.test", "s1"))
        .await
        .unwrap();

    // The remote echoes back exactly what it was sent, without any hash.
    let pushed = h.remote.pushed().await;
    let Some(RemoteChange::Create { body, .. }) = pushed.first() else {
        panic!("student create was not mirrored: {pushed:?}");
    };
    assert!(body.get("passwordHash").is_none());
    h.remote.serve("students", json!([to_snake_case_keys(body.clone())])).await;

    assert_eq!(h.state.store.students.reconcile().await.unwrap(), LoadSource::Remote);

    let (_, actor) = h.state.auth_service.login("kid@mail.test", "secret123").await.unwrap();
    assert_eq!(actor.role_label(), "student");
    let cached = h.local.read("school_students").await.unwrap().unwrap();
    assert!(cached.payload.contains("passwordHash"));
}

#[tokio::test]
async fn unreadable_cache_falls_back_to_defaults_and_is_overwritten() {
    let local = Arc::new(MemoryLocalStore::new());
    local.seed("school_students", "{not json").await;
    let remote = FakeRemote::new();
    remote.fail(true).await;
    let h = harness_with(SyncPolicy::LocalWins, remote, local.clone()).await;

    assert_eq!(h.state.store.students.reconcile().await.unwrap(), LoadSource::Defaults);
    assert!(h.state.store.students.items().await.unwrap().is_empty());

    h.state
        .student_service
        .create_student(&admin(), student_payload("1", "kid@mail.test", "s1"))
        .await
        .unwrap();

    let stored = local.read("school_students").await.unwrap().unwrap();
    let students: Vec<Student> = serde_json::from_str(&stored.payload).unwrap();
    assert_eq!(students.len(), 1);
}
