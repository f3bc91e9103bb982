// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::AppError,
    models::{auth::Actor, staff::StaffPermission},
    services::rbac_service::require,
};

/// A permission known at compile time.
pub trait PermissionDef: Send + Sync + 'static {
    const PERMISSION: StaffPermission;

    fn slug() -> &'static str {
        Self::PERMISSION.slug()
    }
}

/// Rejects the request before the handler runs unless the actor holds `T`.
///
/// Only unscoped checks belong here. Checks that depend on the target record
/// (a teacher editing a student outside their sections) stay in the services.
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts.extensions.get::<Actor>().ok_or(AppError::InvalidToken)?;

        require(actor, T::PERMISSION, None).inspect_err(|_| {
            tracing::info!("{} denied '{}'", actor.id, T::slug());
        })?;

        Ok(RequirePermission(PhantomData))
    }
}

macro_rules! permission {
    ($name:ident => $variant:ident) => {
        pub struct $name;
        impl PermissionDef for $name {
            const PERMISSION: StaffPermission = StaffPermission::$variant;
        }
    };
}

permission!(PermCreateGradesSections => CreateGradesSections);
permission!(PermManageStaffAccounts => ManageStaffAccounts);
permission!(PermManagePermissions => ManagePermissions);
permission!(PermManageBuildings => ManageBuildings);
permission!(PermManageReports => ManageReports);
permission!(PermPromoteTransferStudents => PromoteTransferStudents);
permission!(PermRemoveStudents => RemoveStudents);
