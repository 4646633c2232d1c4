//! /tasks handlers — submission and task reads.
//!
//! Task payloads cross the API as UTF-8 strings (the common case is a
//! URL in, a normalized numeric string out); the core stores raw bytes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use verdict_core::{Task, TaskType};

use super::{parse_identity, parse_task_id, reject, ApiState};

// ── /tasks (POST) ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct TaskSubmitRequest {
    /// Submitter identity, hex-encoded.
    pub caller: String,
    pub task_type: TaskType,
    /// Opaque request payload, UTF-8.
    pub input: String,
}

#[derive(Serialize)]
pub struct TaskSubmitResponse {
    pub task_id: String,
}

pub async fn handle_task_submit(
    State(state): State<ApiState>,
    Json(req): Json<TaskSubmitRequest>,
) -> Result<Json<TaskSubmitResponse>, (StatusCode, String)> {
    let caller = parse_identity(&req.caller)?;

    let task_id = state
        .registry
        .submit(&caller, req.task_type, Bytes::from(req.input))
        .map_err(reject)?;

    Ok(Json(TaskSubmitResponse {
        task_id: hex::encode(task_id),
    }))
}

// ── /tasks/{id} (GET) ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct TaskJson {
    pub task_id: String,
    pub submitter: String,
    pub task_type: TaskType,
    pub input: String,
    pub output: String,
    pub state: String,
    pub submitted_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<u64>,
}

pub async fn handle_task_get(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<TaskJson>, (StatusCode, String)> {
    let task_id = parse_task_id(&id)?;

    match state.registry.task(&task_id) {
        Some(task) => Ok(Json(task_to_json(task))),
        None => Err((StatusCode::NOT_FOUND, format!("unknown task {id}"))),
    }
}

// ── /tasks (GET) ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskJson>,
}

pub async fn handle_task_list(State(state): State<ApiState>) -> Json<TaskListResponse> {
    let tasks = state
        .registry
        .task_ids()
        .iter()
        .filter_map(|id| state.registry.task(id))
        .map(task_to_json)
        .collect();

    Json(TaskListResponse { tasks })
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn task_to_json(task: Task) -> TaskJson {
    TaskJson {
        task_id: hex::encode(task.id),
        submitter: hex::encode(task.submitter),
        task_type: task.task_type,
        input: String::from_utf8_lossy(&task.input).into_owned(),
        output: String::from_utf8_lossy(&task.output).into_owned(),
        state: format!("{:?}", task.state),
        submitted_at: task.submitted_at,
        finalized_at: task.finalized_at,
    }
}
