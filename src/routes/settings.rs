use crate::routes::AppState;
use axum::{extract::State, Json};
use cluster_planner::storage::AppSettings;

pub async fn get_settings_api(State(state): State<AppState>) -> Json<AppSettings> {
    Json(state.settings.clone())
}
