//! Role and threshold handlers — the administrative surface.
//!
//! Every mutation here is gated on the single admin identity by the core;
//! the API only parses and forwards the claimed caller.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{parse_identity, reject, ApiState};

#[derive(Deserialize)]
pub struct RoleChangeRequest {
    /// Admin identity, hex-encoded.
    pub caller: String,
    /// Identity being added or removed, hex-encoded.
    pub identity: String,
}

#[derive(Serialize)]
pub struct RoleChangeResponse {
    pub identity: String,
    /// False when the change was an idempotent no-op.
    pub changed: bool,
}

#[derive(Serialize)]
pub struct RoleListResponse {
    pub members: Vec<String>,
}

// ── /submitters ───────────────────────────────────────────────────────────────

pub async fn handle_submitter_list(State(state): State<ApiState>) -> Json<RoleListResponse> {
    let members = state
        .registry
        .submitters()
        .iter()
        .map(hex::encode)
        .collect();
    Json(RoleListResponse { members })
}

pub async fn handle_submitter_add(
    State(state): State<ApiState>,
    Json(req): Json<RoleChangeRequest>,
) -> Result<Json<RoleChangeResponse>, (StatusCode, String)> {
    let caller = parse_identity(&req.caller)?;
    let id = parse_identity(&req.identity)?;

    let changed = state.registry.add_submitter(&caller, id).map_err(reject)?;
    Ok(Json(RoleChangeResponse {
        identity: req.identity,
        changed,
    }))
}

pub async fn handle_submitter_remove(
    State(state): State<ApiState>,
    Json(req): Json<RoleChangeRequest>,
) -> Result<Json<RoleChangeResponse>, (StatusCode, String)> {
    let caller = parse_identity(&req.caller)?;
    let id = parse_identity(&req.identity)?;

    let changed = state
        .registry
        .remove_submitter(&caller, &id)
        .map_err(reject)?;
    Ok(Json(RoleChangeResponse {
        identity: req.identity,
        changed,
    }))
}

// ── /verifiers ────────────────────────────────────────────────────────────────

pub async fn handle_verifier_list(State(state): State<ApiState>) -> Json<RoleListResponse> {
    let members = state.tally.verifiers().iter().map(hex::encode).collect();
    Json(RoleListResponse { members })
}

pub async fn handle_verifier_add(
    State(state): State<ApiState>,
    Json(req): Json<RoleChangeRequest>,
) -> Result<Json<RoleChangeResponse>, (StatusCode, String)> {
    let caller = parse_identity(&req.caller)?;
    let id = parse_identity(&req.identity)?;

    let changed = state.tally.add_verifier(&caller, id).map_err(reject)?;
    Ok(Json(RoleChangeResponse {
        identity: req.identity,
        changed,
    }))
}

pub async fn handle_verifier_remove(
    State(state): State<ApiState>,
    Json(req): Json<RoleChangeRequest>,
) -> Result<Json<RoleChangeResponse>, (StatusCode, String)> {
    let caller = parse_identity(&req.caller)?;
    let id = parse_identity(&req.identity)?;

    let changed = state.tally.remove_verifier(&caller, &id).map_err(reject)?;
    Ok(Json(RoleChangeResponse {
        identity: req.identity,
        changed,
    }))
}

// ── /threshold ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ThresholdResponse {
    pub threshold: u32,
}

pub async fn handle_threshold_get(State(state): State<ApiState>) -> Json<ThresholdResponse> {
    Json(ThresholdResponse {
        threshold: state.tally.threshold(),
    })
}

#[derive(Deserialize)]
pub struct ThresholdSetRequest {
    pub caller: String,
    pub threshold: u32,
}

pub async fn handle_threshold_set(
    State(state): State<ApiState>,
    Json(req): Json<ThresholdSetRequest>,
) -> Result<Json<ThresholdResponse>, (StatusCode, String)> {
    let caller = parse_identity(&req.caller)?;

    state
        .tally
        .set_threshold(&caller, req.threshold)
        .map_err(reject)?;
    Ok(Json(ThresholdResponse {
        threshold: req.threshold,
    }))
}

// ── /tally-identity ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct TallyIdentityRequest {
    pub caller: String,
    /// Identity the registry will accept finalize calls from.
    pub identity: String,
}

#[derive(Serialize)]
pub struct TallyIdentityResponse {
    pub identity: String,
}

pub async fn handle_tally_identity_set(
    State(state): State<ApiState>,
    Json(req): Json<TallyIdentityRequest>,
) -> Result<Json<TallyIdentityResponse>, (StatusCode, String)> {
    let caller = parse_identity(&req.caller)?;
    let id = parse_identity(&req.identity)?;

    state.registry.set_tally(&caller, id).map_err(reject)?;
    Ok(Json(TallyIdentityResponse {
        identity: req.identity,
    }))
}
