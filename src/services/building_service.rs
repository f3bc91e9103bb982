// src/services/building_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{collection::remote_body, Mutation, RemoteChange, SchoolStore, StoredEntity},
    models::{
        auth::Actor,
        building::{CreateBuildingPayload, DynamicBuilding, UpdateBuildingPayload},
        staff::StaffPermission,
    },
    services::rbac_service::require,
};

#[derive(Clone)]
pub struct BuildingService {
    store: SchoolStore,
}

impl BuildingService {
    pub fn new(store: SchoolStore) -> Self {
        Self { store }
    }

    pub async fn list_buildings(&self) -> Result<Vec<DynamicBuilding>, AppError> {
        Ok(self.store.buildings.items().await?.to_vec())
    }

    pub async fn create_building(&self, actor: &Actor, input: CreateBuildingPayload) -> Result<DynamicBuilding, AppError> {
        require(actor, StaffPermission::ManageBuildings, None)?;

        let building = DynamicBuilding {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            floors: input.floors,
            color: input.color,
            is_active: true,
        };

        self.store
            .buildings
            .mutate(|buildings| {
                ensure_unique_name(buildings, None, &building.name)?;
                let mut next = buildings.to_vec();
                next.push(building.clone());
                Ok(Mutation::new(next, building.clone()).mirrored(RemoteChange::Create {
                    resource: DynamicBuilding::RESOURCE,
                    body: remote_body(&building),
                }))
            })
            .await
    }

    pub async fn update_building(
        &self,
        actor: &Actor,
        id: &str,
        input: UpdateBuildingPayload,
    ) -> Result<DynamicBuilding, AppError> {
        require(actor, StaffPermission::ManageBuildings, None)?;

        self.store
            .buildings
            .mutate(|buildings| {
                let mut building = buildings
                    .iter()
                    .find(|b| b.id == id)
                    .cloned()
                    .ok_or_else(|| AppError::not_found("Building", id))?;

                if let Some(name) = &input.name {
                    building.name = name.trim().to_string();
                    ensure_unique_name(buildings, Some(id), &building.name)?;
                }
                if let Some(floors) = input.floors {
                    building.floors = floors;
                }
                if let Some(color) = &input.color {
                    building.color = color.clone();
                }
                if let Some(active) = input.is_active {
                    building.is_active = active;
                }

                let next = buildings.iter().map(|b| if b.id == id { building.clone() } else { b.clone() }).collect();
                Ok(Mutation::new(next, building.clone()).mirrored(RemoteChange::Update {
                    resource: DynamicBuilding::RESOURCE,
                    id: id.to_string(),
                    body: remote_body(&building),
                }))
            })
            .await
    }

    pub async fn delete_building(&self, actor: &Actor, id: &str) -> Result<bool, AppError> {
        require(actor, StaffPermission::ManageBuildings, None)?;

        self.store
            .buildings
            .mutate(|buildings| {
                if !buildings.iter().any(|b| b.id == id) {
                    return Err(AppError::not_found("Building", id));
                }
                let next = buildings.iter().filter(|b| b.id != id).cloned().collect();
                Ok(Mutation::new(next, true).mirrored(RemoteChange::Delete {
                    resource: DynamicBuilding::RESOURCE,
                    id: id.to_string(),
                }))
            })
            .await
    }
}

fn ensure_unique_name(buildings: &[DynamicBuilding], except: Option<&str>, name: &str) -> Result<(), AppError> {
    if buildings
        .iter()
        .any(|b| Some(b.id.as_str()) != except && b.name.eq_ignore_ascii_case(name))
    {
        return Err(AppError::BuildingAlreadyExists(name.to_string()));
    }
    Ok(())
}
