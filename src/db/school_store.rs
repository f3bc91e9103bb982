// src/db/school_store.rs

use std::sync::Arc;

use crate::common::error::AppError;
use crate::db::collection::{Collection, LoadSource};
use crate::db::local_store::LocalStore;
use crate::db::remote_sync::SyncGateway;
use crate::models::{
    academics::{GradeLevel, Section},
    building::DynamicBuilding,
    live_incident::LiveIncident,
    report::IncidentReport,
    staff::StaffMember,
    student::Student,
};

/// Application state owning every collection. Services receive it by injection.
#[derive(Clone)]
pub struct SchoolStore {
    pub students: Arc<Collection<Student>>,
    pub staff: Arc<Collection<StaffMember>>,
    pub grade_levels: Arc<Collection<GradeLevel>>,
    pub sections: Arc<Collection<Section>>,
    pub reports: Arc<Collection<IncidentReport>>,
    pub live_incidents: Arc<Collection<LiveIncident>>,
    pub buildings: Arc<Collection<DynamicBuilding>>,
}

impl SchoolStore {
    pub fn new(store: Arc<dyn LocalStore>, sync: SyncGateway) -> Self {
        Self {
            students: Arc::new(Collection::new(store.clone(), sync.clone())),
            staff: Arc::new(Collection::new(store.clone(), sync.clone())),
            grade_levels: Arc::new(Collection::new(store.clone(), sync.clone())),
            sections: Arc::new(Collection::new(store.clone(), sync.clone())),
            reports: Arc::new(Collection::new(store.clone(), sync.clone())),
            live_incidents: Arc::new(Collection::new(store.clone(), sync.clone())),
            buildings: Arc::new(Collection::new(store, sync)),
        }
    }

    /// Loads every collection, remote first. Returns where each one came from.
    pub async fn reconcile_all(&self) -> Result<Vec<(&'static str, LoadSource)>, AppError> {
        Ok(vec![
            (self.students.key(), self.students.reconcile().await?),
            (self.staff.key(), self.staff.reconcile().await?),
            (self.grade_levels.key(), self.grade_levels.reconcile().await?),
            (self.sections.key(), self.sections.reconcile().await?),
            (self.reports.key(), self.reports.reconcile().await?),
            (self.live_incidents.key(), self.live_incidents.reconcile().await?),
            (self.buildings.key(), self.buildings.reconcile().await?),
        ])
    }
}
