pub mod auth;
pub mod config;
pub mod errors;
pub mod heartbeat;
pub mod location;
pub mod metrics_defs;
pub mod model;
pub mod request;
pub mod service;
pub mod state;

#[cfg(test)]
mod testutils;

use auth::GlobalAuth;
use docstore::DocumentStore;
use errors::TrackerError;
use service::TrackerService;
use shared::admin_service::AdminService;
use shared::http::{bind, serve};
use state::AppState;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Serves the tracking endpoints and the admin probes until either listener fails.
pub async fn run(
    config: config::Config,
    store: Arc<dyn DocumentStore>,
) -> Result<(), TrackerError> {
    config.validate()?;
    let auth = GlobalAuth::from_config(&config.auth)?;
    let state = Arc::new(AppState::new(store, auth, config.collections.clone()));

    let ready = Arc::new(AtomicBool::new(false));
    let ready_clone = ready.clone();
    let admin_listener = bind(&config.admin_listener.host, config.admin_listener.port).await?;
    let admin_task = serve(
        admin_listener,
        AdminService::new(move || ready_clone.load(Ordering::Relaxed)),
    );

    let listener = bind(&config.listener.host, config.listener.port).await?;
    let tracker_task = serve(listener, TrackerService::new(state));
    ready.store(true, Ordering::Relaxed);

    tracing::info!(
        host = %config.listener.host,
        port = config.listener.port,
        admin_port = config.admin_listener.port,
        "Tracker listening"
    );

    tokio::try_join!(tracker_task, admin_task)?;
    Ok(())
}
