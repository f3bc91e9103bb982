// src/main.rs

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use school_safety_backend::{
    config::{AppState, Settings},
    routes::build_router,
    services::TickSource,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let settings = Settings::from_env()?;
    let app_state = AppState::new(&settings).await?;

    // First load of every collection: remote, then cache, then defaults.
    for (key, source) in app_state.store.reconcile_all().await? {
        tracing::info!("✅ {} loaded from {:?}", key, source);
    }

    let ticks = TickSource::every_second();
    let receiver = ticks.subscribe();
    let _tick_task = ticks.spawn();
    tokio::spawn(app_state.alert_center.clone().run(receiver));

    let app = build_router(app_state);

    let listener = TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;
    tracing::info!("🚀 Listening on {}", listener.local_addr()?);
    tracing::info!("📚 API docs at /swagger-ui");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
