pub mod health;
pub mod import;
pub mod jobs;
pub mod settings;
pub mod wizard;

use axum::{routing::get, routing::post, Router};
use cluster_planner::{
    progress::ProgressHub,
    storage::{load_draft, load_settings, save_settings, settings_path, AppSettings},
    wizard::WizardStore,
};
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<WizardStore>>,
    pub settings: AppSettings,
    pub progress: ProgressHub,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/wizard", get(wizard::get_wizard))
        .route("/api/wizard/commands", post(wizard::dispatch_command))
        .route("/api/wizard/step", post(wizard::set_step))
        .route("/api/wizard/next", post(wizard::next_step))
        .route("/api/wizard/back", post(wizard::previous_step))
        .route("/api/wizard/servers", get(wizard::get_servers))
        .route("/api/wizard/ports/preview", get(wizard::port_preview))
        .route("/api/wizard/reset-overrides", post(wizard::reset_overrides))
        .route("/api/wizard/import", post(import::import_document))
        .route("/api/wizard/submit", post(jobs::submit))
        .route(
            "/api/jobs/:job_id/progress",
            get(jobs::get_progress).post(jobs::push_progress),
        )
        .route("/api/jobs/:job_id/stream", get(jobs::stream_progress))
        .route("/api/settings", get(settings::get_settings_api))
        .route("/health", get(health::health))
        .with_state(state)
}

pub async fn default_state() -> AppState {
    let path = settings_path();
    let settings = match load_settings(&path).await {
        Ok(settings) => settings,
        Err(err) => {
            warn!(error = %err, "falling back to default settings");
            AppSettings::default()
        }
    };
    if tokio::fs::metadata(&path).await.is_err() {
        if let Err(err) = save_settings(&path, &settings).await {
            warn!(error = %err, "failed to write default settings");
        }
    }
    let settings = settings.with_env_overrides();

    let store = match load_draft(&PathBuf::from(&settings.draft_path)).await {
        Ok(store) => store,
        Err(err) => {
            warn!(error = %err, "starting with a fresh draft");
            WizardStore::new()
        }
    };

    AppState {
        store: Arc::new(Mutex::new(store)),
        settings,
        progress: ProgressHub::new(),
    }
}
