//! /status, /events, and /daemon handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use verdict_core::OracleEvent;

use super::{parse_task_id, ApiState};

// ── /status (GET) ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatusResponse {
    pub tasks: usize,
    pub threshold: u32,
    pub submitters: usize,
    pub verifiers: usize,
    /// Whether the registry has an authorized tally identity configured.
    pub tally_linked: bool,
}

pub async fn handle_status(State(state): State<ApiState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        tasks: state.registry.task_count(),
        threshold: state.tally.threshold(),
        submitters: state.registry.submitters().len(),
        verifiers: state.tally.verifiers().len(),
        tally_linked: state.registry.tally_identity().is_some(),
    })
}

// ── /events/{id} (GET) ────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventListResponse {
    pub task_id: String,
    pub events: Vec<EventJson>,
}

#[derive(Serialize)]
pub struct EventJson {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agree: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sealed: Option<bool>,
}

pub async fn handle_events_get(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<EventListResponse>, (StatusCode, String)> {
    let task_id = parse_task_id(&id)?;

    let events = state
        .events
        .events_for(&task_id)
        .into_iter()
        .map(event_to_json)
        .collect();

    Ok(Json(EventListResponse { task_id: id, events }))
}

fn event_to_json(event: OracleEvent) -> EventJson {
    match event {
        OracleEvent::TaskSubmitted { submitter, .. } => EventJson {
            kind: "task_submitted".to_string(),
            submitter: Some(hex::encode(submitter)),
            verifier: None,
            agree: None,
            sealed: None,
        },
        OracleEvent::VoteCast {
            verifier,
            agree,
            sealed,
            ..
        } => EventJson {
            kind: "vote_cast".to_string(),
            submitter: None,
            verifier: Some(hex::encode(verifier)),
            agree: Some(agree),
            sealed: Some(sealed),
        },
        OracleEvent::TaskFinalized { .. } => EventJson {
            kind: "task_finalized".to_string(),
            submitter: None,
            verifier: None,
            agree: None,
            sealed: None,
        },
    }
}

// ── /daemon/shutdown (POST) ───────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ShutdownResponse {
    pub shutting_down: bool,
}

pub async fn handle_shutdown(State(state): State<ApiState>) -> Json<ShutdownResponse> {
    tracing::info!("shutdown requested via API");
    let _ = state.shutdown_tx.send(());
    Json(ShutdownResponse {
        shutting_down: true,
    })
}
