//! HTTP API handlers — exposes oracle state as JSON.
//!
//! Caller identities arrive as hex request fields. Authenticating them
//! (signatures, transport auth) is outside the core's contract; the API
//! forwards the claimed identity and the core compares it against its
//! role sets.

pub mod roles;
pub mod status;
pub mod tally;
pub mod tasks;

use std::sync::Arc;

use axum::http::StatusCode;

use verdict_core::identity::Identity;
use verdict_core::{OracleError, TaskId};
use verdict_services::{EventLog, TaskRegistry, VerificationTally};

#[derive(Clone)]
pub struct ApiState {
    pub registry: Arc<TaskRegistry>,
    pub tally: Arc<VerificationTally>,
    pub events: EventLog,
    /// Shutdown broadcast sender — signals graceful daemon shutdown.
    pub shutdown_tx: tokio::sync::broadcast::Sender<()>,
}

// ── Shared helpers ────────────────────────────────────────────────────────────

/// Parse a hex-encoded 32-byte identity.
fn parse_identity(hex_str: &str) -> Result<Identity, (StatusCode, String)> {
    verdict_core::identity::parse(hex_str)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}

/// Parse a hex-encoded 32-byte task id.
fn parse_task_id(hex_str: &str) -> Result<TaskId, (StatusCode, String)> {
    let bytes =
        hex::decode(hex_str).map_err(|_| (StatusCode::BAD_REQUEST, "invalid hex".to_string()))?;
    if bytes.len() != 32 {
        return Err((
            StatusCode::BAD_REQUEST,
            "task id must be 32 bytes".to_string(),
        ));
    }
    let mut id = [0u8; 32];
    id.copy_from_slice(&bytes);
    Ok(id)
}

/// Map a core rejection onto an HTTP status.
fn reject(err: OracleError) -> (StatusCode, String) {
    let status = match err {
        OracleError::Unauthorized(_) => StatusCode::FORBIDDEN,
        OracleError::UnknownTask(_) => StatusCode::NOT_FOUND,
        OracleError::DuplicateTask(_)
        | OracleError::DuplicateVote(_)
        | OracleError::AlreadyFinalized(_)
        | OracleError::AlreadySealed(_) => StatusCode::CONFLICT,
        OracleError::InvalidThreshold => StatusCode::BAD_REQUEST,
    };
    (status, err.to_string())
}

// Re-export handler functions for use in router setup.
pub use roles::{
    handle_submitter_add, handle_submitter_list, handle_submitter_remove, handle_tally_identity_set,
    handle_threshold_get, handle_threshold_set, handle_verifier_add, handle_verifier_list,
    handle_verifier_remove,
};
pub use status::{handle_events_get, handle_shutdown, handle_status};
pub use tally::{handle_tally_get, handle_vote, handle_votes_get};
pub use tasks::{handle_task_get, handle_task_list, handle_task_submit};
