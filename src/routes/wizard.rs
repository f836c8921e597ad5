use crate::forms::StepRequest;
use crate::routes::AppState;
use crate::services::{persist_draft, snapshot, WizardSnapshot};
use axum::{extract::State, http::StatusCode, Json};
use cluster_planner::{
    error::WizardError,
    models::{ServerConfig, WizardStep},
    ports::ServerPorts,
    validation,
    wizard::WizardCommand,
};

pub async fn get_wizard(State(state): State<AppState>) -> Json<WizardSnapshot> {
    let store = state.store.lock().await;
    Json(snapshot(&store))
}

pub async fn dispatch_command(
    State(state): State<AppState>,
    Json(command): Json<WizardCommand>,
) -> Result<Json<WizardSnapshot>, (StatusCode, String)> {
    let mut store = state.store.lock().await;
    store
        .dispatch(command)
        .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;
    persist_draft(&state, &store).await;
    Ok(Json(snapshot(&store)))
}

pub async fn set_step(
    State(state): State<AppState>,
    Json(request): Json<StepRequest>,
) -> Result<Json<WizardSnapshot>, (StatusCode, String)> {
    let step: WizardStep = request
        .step
        .parse()
        .map_err(|err: WizardError| (StatusCode::BAD_REQUEST, err.to_string()))?;
    let mut store = state.store.lock().await;
    store.go_to(step);
    persist_draft(&state, &store).await;
    Ok(Json(snapshot(&store)))
}

pub async fn next_step(
    State(state): State<AppState>,
) -> Result<Json<WizardSnapshot>, (StatusCode, String)> {
    let mut store = state.store.lock().await;
    let next = validation::next_step(store.step(), store.data())
        .map_err(|issues| (StatusCode::BAD_REQUEST, issues.join("; ")))?;
    store.go_to(next);
    persist_draft(&state, &store).await;
    Ok(Json(snapshot(&store)))
}

pub async fn previous_step(
    State(state): State<AppState>,
) -> Result<Json<WizardSnapshot>, (StatusCode, String)> {
    let mut store = state.store.lock().await;
    let current = store.step();
    let previous = current
        .previous()
        .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("{current} is the first step")))?;
    store.go_to(previous);
    persist_draft(&state, &store).await;
    Ok(Json(snapshot(&store)))
}

pub async fn get_servers(State(state): State<AppState>) -> Json<Vec<ServerConfig>> {
    let store = state.store.lock().await;
    Json(store.servers())
}

pub async fn port_preview(State(state): State<AppState>) -> Json<Vec<ServerPorts>> {
    let store = state.store.lock().await;
    Json(store.port_preview())
}

pub async fn reset_overrides(
    State(state): State<AppState>,
) -> Result<Json<WizardSnapshot>, (StatusCode, String)> {
    let mut store = state.store.lock().await;
    store
        .dispatch(WizardCommand::ResetServerOverrides)
        .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;
    persist_draft(&state, &store).await;
    Ok(Json(snapshot(&store)))
}
