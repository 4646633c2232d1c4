//! /votes and /tally handlers — vote casting and tally reads.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::{parse_identity, parse_task_id, reject, ApiState};

// ── /votes (POST) ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VoteRequest {
    /// Verifier identity, hex-encoded.
    pub caller: String,
    pub task_id: String,
    /// Asserted result payload, UTF-8.
    pub proposed_output: String,
    pub agree: bool,
}

#[derive(Serialize)]
pub struct VoteResponse {
    pub task_id: String,
    /// Whether this vote reached threshold and sealed the task.
    pub sealed: bool,
}

pub async fn handle_vote(
    State(state): State<ApiState>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, (StatusCode, String)> {
    let caller = parse_identity(&req.caller)?;
    let task_id = parse_task_id(&req.task_id)?;

    let sealed = state
        .tally
        .vote(&caller, &task_id, Bytes::from(req.proposed_output), req.agree)
        .map_err(reject)?;

    Ok(Json(VoteResponse {
        task_id: req.task_id,
        sealed,
    }))
}

// ── /tally/{id} (GET) ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct TallyResponse {
    pub task_id: String,
    /// Currently leading proposal, UTF-8.
    pub output: String,
    pub agree_count: u32,
    pub sealed: bool,
    pub vote_count: usize,
}

pub async fn handle_tally_get(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<TallyResponse>, (StatusCode, String)> {
    let task_id = parse_task_id(&id)?;

    match state.tally.tally(&task_id) {
        Some(snap) => Ok(Json(TallyResponse {
            task_id: id,
            output: String::from_utf8_lossy(&snap.output).into_owned(),
            agree_count: snap.agree_count,
            sealed: snap.sealed,
            vote_count: snap.vote_count,
        })),
        None => Err((StatusCode::NOT_FOUND, format!("no votes for task {id}"))),
    }
}

// ── /votes/{id} (GET) ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct VoteListResponse {
    pub task_id: String,
    pub votes: Vec<VoteJson>,
}

#[derive(Serialize)]
pub struct VoteJson {
    pub verifier: String,
    pub proposed_output: String,
    pub agree: bool,
    pub cast_at: u64,
}

pub async fn handle_votes_get(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<VoteListResponse>, (StatusCode, String)> {
    let task_id = parse_task_id(&id)?;

    let votes = state
        .tally
        .votes(&task_id)
        .into_iter()
        .map(|v| VoteJson {
            verifier: hex::encode(v.verifier),
            proposed_output: String::from_utf8_lossy(&v.proposed_output).into_owned(),
            agree: v.agree,
            cast_at: v.cast_at,
        })
        .collect();

    Ok(Json(VoteListResponse { task_id: id, votes }))
}
