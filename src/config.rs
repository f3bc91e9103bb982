// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;

use crate::{
    db::{HttpRemoteSync, LocalStore, OfflineRemote, RemoteSync, SchoolStore, SqliteLocalStore, SyncGateway, SyncPolicy},
    services::{
        auth::{hash_password, AdminAccount},
        AcademicService, AlertCenter, AuthService, BuildingService, LiveIncidentService, ReportService,
        StaffService, StudentService,
    },
};

/// Everything read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub remote_api_url: Option<String>,
    pub remote_timeout: Duration,
    pub sync_policy: SyncPolicy,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub bcrypt_cost: u32,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        let sync_policy = match env::var("SYNC_POLICY") {
            Ok(raw) => SyncPolicy::parse(&raw).with_context(|| format!("unknown SYNC_POLICY '{raw}'"))?,
            Err(_) => SyncPolicy::LocalWins,
        };

        let remote_timeout = env::var("REMOTE_TIMEOUT_SECS")
            .ok()
            .map(|raw| raw.parse::<u64>().context("REMOTE_TIMEOUT_SECS must be a number"))
            .transpose()?
            .unwrap_or(10);

        let bcrypt_cost = env::var("BCRYPT_COST")
            .ok()
            .map(|raw| raw.parse::<u32>().context("BCRYPT_COST must be a number"))
            .transpose()?
            .unwrap_or(bcrypt::DEFAULT_COST);

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://school_safety.db".to_string()),
            jwt_secret,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            remote_api_url: env::var("REMOTE_API_URL").ok().filter(|url| !url.trim().is_empty()),
            remote_timeout: Duration::from_secs(remote_timeout),
            sync_policy,
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            bcrypt_cost,
        })
    }
}

// The shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: SchoolStore,
    pub auth_service: AuthService,
    pub student_service: StudentService,
    pub academic_service: AcademicService,
    pub staff_service: StaffService,
    pub report_service: ReportService,
    pub live_incident_service: LiveIncidentService,
    pub building_service: BuildingService,
    pub alert_center: AlertCenter,
}

impl AppState {
    /// Opens local storage, picks the remote port and wires the services.
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let local = SqliteLocalStore::connect(&settings.database_url)
            .await
            .with_context(|| format!("failed to open local storage at {}", settings.database_url))?;
        tracing::info!("✅ Local storage ready at {}", settings.database_url);

        let remote: Arc<dyn RemoteSync> = match &settings.remote_api_url {
            Some(url) => {
                tracing::info!("Remote sync enabled against {} ({:?})", url, settings.sync_policy);
                Arc::new(HttpRemoteSync::new(url, settings.remote_timeout)?)
            }
            None => {
                tracing::info!("No REMOTE_API_URL set, running local-only");
                Arc::new(OfflineRemote)
            }
        };

        let admin = match (&settings.admin_email, &settings.admin_password) {
            (Some(email), Some(password)) => Some(AdminAccount {
                email: email.clone(),
                password_hash: hash_password(password, settings.bcrypt_cost).await?,
            }),
            _ => {
                tracing::warn!("ADMIN_EMAIL / ADMIN_PASSWORD not set, no administrator can sign in");
                None
            }
        };

        Ok(Self::assemble(
            Arc::new(local),
            SyncGateway::new(remote, settings.sync_policy),
            admin,
            settings.jwt_secret.clone(),
            settings.bcrypt_cost,
        ))
    }

    /// Builds the dependency graph over any storage/remote pair.
    pub fn assemble(
        local: Arc<dyn LocalStore>,
        sync: SyncGateway,
        admin: Option<AdminAccount>,
        jwt_secret: String,
        bcrypt_cost: u32,
    ) -> Self {
        let store = SchoolStore::new(local, sync);
        let alert_center = AlertCenter::new(store.live_incidents.clone());

        Self {
            auth_service: AuthService::new(store.clone(), admin, jwt_secret),
            student_service: StudentService::new(store.clone(), bcrypt_cost),
            academic_service: AcademicService::new(store.clone()),
            staff_service: StaffService::new(store.clone(), bcrypt_cost),
            report_service: ReportService::new(store.clone()),
            live_incident_service: LiveIncidentService::new(store.clone(), alert_center.clone()),
            building_service: BuildingService::new(store.clone()),
            alert_center,
            store,
        }
    }
}
