use crate::routes::AppState;
use crate::services::{persist_draft, snapshot, WizardSnapshot};
use axum::{extract::State, http::StatusCode, Json};

/// Body is the raw import document. A rejected document leaves the draft untouched.
pub async fn import_document(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<WizardSnapshot>, (StatusCode, String)> {
    if body.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "import document is empty".to_string()));
    }

    let mut store = state.store.lock().await;
    store
        .import_document(&body)
        .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;
    persist_draft(&state, &store).await;
    Ok(Json(snapshot(&store)))
}
