use crate::forms::HistoryQuery;
use crate::routes::AppState;
use crate::services::{submit_plan, SubmitRejection};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, Sse},
    Json,
};
use cluster_planner::{
    plan::SubmittedPlan,
    progress::{ProgressDisplay, ProgressEvent},
};
use serde::Serialize;
use tokio_stream::StreamExt;

pub async fn submit(
    State(state): State<AppState>,
) -> Result<Json<SubmittedPlan>, (StatusCode, String)> {
    let mut store = state.store.lock().await;
    submit_plan(&state, &mut store)
        .await
        .map(Json)
        .map_err(|rejection| match rejection {
            SubmitRejection::Incomplete(issues) => (StatusCode::BAD_REQUEST, issues.join("; ")),
            SubmitRejection::Storage(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        })
}

/// Called by the provisioning backend for each progress report.
pub async fn push_progress(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(event): Json<ProgressEvent>,
) -> Result<Json<ProgressDisplay>, (StatusCode, String)> {
    if let Some(event_job) = event.job_id.as_deref() {
        if event_job != job_id {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("event is for job {event_job}, not {job_id}"),
            ));
        }
    }
    if !state.progress.is_known(&job_id).await {
        return Err((StatusCode::NOT_FOUND, format!("unknown job {job_id}")));
    }
    Ok(Json(state.progress.push(&job_id, event).await))
}

#[derive(Serialize)]
pub struct ProgressResponse {
    latest: ProgressDisplay,
    events: Vec<ProgressEvent>,
}

pub async fn get_progress(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ProgressResponse>, (StatusCode, String)> {
    let latest = state
        .progress
        .latest(&job_id)
        .await
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("unknown job {job_id}")))?;
    let events = state.progress.history(&job_id, query.n.unwrap_or(20)).await;
    Ok(Json(ProgressResponse { latest, events }))
}

pub async fn stream_progress(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<
    Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>,
    (StatusCode, String),
> {
    if !state.progress.is_known(&job_id).await {
        return Err((StatusCode::NOT_FOUND, format!("unknown job {job_id}")));
    }
    let stream = state.progress.follow(&job_id).await.map(|display| {
        let data = serde_json::to_string(&display).unwrap_or_default();
        Ok(Event::default().event("progress").data(data))
    });
    Ok(Sse::new(stream))
}
