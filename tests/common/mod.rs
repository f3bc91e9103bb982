#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::Value;
use tokio::sync::Mutex;

use school_safety_backend::{
    common::error::SyncError,
    config::AppState,
    db::{
        remote_sync::to_camel_case_keys, MemoryLocalStore, Mutation, RemoteChange, RemoteSync, SyncGateway,
        SyncPolicy,
    },
    models::{
        auth::{Actor, ActorKind},
        live_incident::{LiveIncident, LiveIncidentStatus},
        report::{IncidentLocation, IncidentType},
        staff::{Position, StaffPermission},
        student::CreateStudentPayload,
    },
    services::auth::{hash_password, AdminAccount},
};

pub const JWT_SECRET: &str = "test-secret";
pub const BCRYPT_COST: u32 = 4;
pub const ADMIN_EMAIL: &str = "admin@school.test";
pub const ADMIN_PASSWORD: &str = "admin-password";

/// Scripted remote: serves snake_case fixtures and records every push.
#[derive(Default)]
pub struct FakeRemote {
    collections: Mutex<HashMap<String, Value>>,
    pushed: Mutex<Vec<RemoteChange>>,
    failing: Mutex<bool>,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Serves `body` (snake_case, as the remote API sends it) for `resource`.
    pub async fn serve(&self, resource: &str, body: Value) {
        self.collections.lock().await.insert(resource.to_string(), body);
    }

    pub async fn fail(&self, failing: bool) {
        *self.failing.lock().await = failing;
    }

    pub async fn pushed(&self) -> Vec<RemoteChange> {
        self.pushed.lock().await.clone()
    }
}

#[async_trait]
impl RemoteSync for FakeRemote {
    async fn fetch(&self, resource: &str) -> Result<Value, SyncError> {
        if *self.failing.lock().await {
            return Err(SyncError::Status(503));
        }
        self.collections
            .lock()
            .await
            .get(resource)
            .cloned()
            .map(to_camel_case_keys)
            .ok_or(SyncError::Status(404))
    }

    async fn push(&self, change: RemoteChange) -> Result<(), SyncError> {
        if *self.failing.lock().await {
            return Err(SyncError::Status(503));
        }
        self.pushed.lock().await.push(change);
        Ok(())
    }
}

pub struct Harness {
    pub state: AppState,
    pub local: Arc<MemoryLocalStore>,
    pub remote: Arc<FakeRemote>,
}

pub async fn harness() -> Harness {
    harness_with(SyncPolicy::LocalWins, FakeRemote::new(), Arc::new(MemoryLocalStore::new())).await
}

pub async fn harness_with(policy: SyncPolicy, remote: Arc<FakeRemote>, local: Arc<MemoryLocalStore>) -> Harness {
    let admin = AdminAccount {
        email: ADMIN_EMAIL.to_string(),
        password_hash: hash_password(ADMIN_PASSWORD, BCRYPT_COST).await.unwrap(),
    };
    let state = AppState::assemble(
        local.clone(),
        SyncGateway::new(remote.clone(), policy),
        Some(admin),
        JWT_SECRET.to_string(),
        BCRYPT_COST,
    );
    Harness { state, local, remote }
}

// ---
// Actors
// ---

pub fn admin() -> Actor {
    Actor::admin("admin", "Administrator")
}

pub fn staff_actor(id: &str, position: Position) -> Actor {
    Actor {
        id: id.to_string(),
        name: format!("Staff {id}"),
        kind: ActorKind::Staff,
        position: Some(position),
        permissions: position.default_permissions(),
        assigned_section_ids: Vec::new(),
    }
}

pub fn teacher(id: &str, sections: &[&str]) -> Actor {
    Actor {
        assigned_section_ids: sections.iter().map(|s| s.to_string()).collect(),
        ..staff_actor(id, Position::Teacher)
    }
}

pub fn with_permissions(actor: Actor, permissions: &[StaffPermission]) -> Actor {
    Actor { permissions: permissions.to_vec(), ..actor }
}

pub fn student_actor(id: &str) -> Actor {
    Actor {
        id: id.to_string(),
        name: format!("Student {id}"),
        kind: ActorKind::Student,
        position: None,
        permissions: Vec::new(),
        assigned_section_ids: Vec::new(),
    }
}

// ---
// Fixtures
// ---

pub fn student_payload(lrn: &str, email: &str, section_id: &str) -> CreateStudentPayload {
    CreateStudentPayload {
        full_name: format!("Student {lrn}"),
        lrn: lrn.to_string(),
        email: email.to_string(),
        school_email: None,
        password: "secret123".to_string(),
        grade_level_id: "grade-7".to_string(),
        section_id: section_id.to_string(),
        assigned_teacher_id: None,
    }
}

pub fn location() -> IncidentLocation {
    IncidentLocation { building_id: "main".into(), floor: 2, room: Some("204".into()) }
}

/// Inserts an active incident raised `age_secs` ago, bypassing the service.
pub async fn seed_incident(state: &AppState, id: &str, age_secs: i64) -> LiveIncident {
    let incident = LiveIncident {
        id: id.to_string(),
        location: location(),
        incident_type: IncidentType::Physical,
        description: "Fight near the stairs".into(),
        reporter_id: "reporter".into(),
        reporter_name: "Reporter".into(),
        created_at: Utc::now() - Duration::seconds(age_secs),
        status: LiveIncidentStatus::Active,
        responders: Vec::new(),
        resolved_by: None,
        resolved_at: None,
    };
    let seeded = incident.clone();
    state
        .store
        .live_incidents
        .mutate(move |items| {
            let mut next = items.to_vec();
            next.push(seeded.clone());
            Ok(Mutation::new(next, ()))
        })
        .await
        .unwrap();
    incident
}
