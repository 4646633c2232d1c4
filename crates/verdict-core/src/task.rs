//! Task and vote records.
//!
//! `Task` is owned by the task registry; `Vote` records are owned by the
//! verification tally. Payloads are opaque `Bytes` — each task type implies
//! an out-of-band request/response encoding understood only by verifier
//! agents, never by the core.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::task_id::TaskId;

/// Kind of off-chain computation a task requests.
///
/// The numbering is part of the task-id preimage and must never change
/// for an existing variant. New kinds append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    None,
    /// request: UTF-8 URL (plus optional params), response: result bytes.
    HttpCall,
}

impl TaskType {
    pub fn as_u8(self) -> u8 {
        match self {
            TaskType::None => 0,
            TaskType::HttpCall => 1,
        }
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(TaskType::None),
            1 => Some(TaskType::HttpCall),
            _ => None,
        }
    }
}

/// Lifecycle state of a task. Pending tasks have an empty output;
/// finalized tasks were written exactly once and never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Finalized,
}

/// A registered unit of off-chain computation.
#[derive(Debug, Clone)]
pub struct Task {
    /// BLAKE3 of `(submitter, task_type, input)`. Sole identifier.
    pub id: TaskId,
    /// Identity that created the task. Immutable.
    pub submitter: Identity,
    pub task_type: TaskType,
    /// Opaque request payload, interpreted per `task_type`.
    pub input: Bytes,
    /// Agreed result. Empty until finalized; written exactly once.
    pub output: Bytes,
    pub state: TaskState,
    /// Unix ms when the task was submitted.
    pub submitted_at: u64,
    /// Unix ms when the task was finalized.
    pub finalized_at: Option<u64>,
}

/// A verifier's assertion about a task's result.
#[derive(Debug, Clone)]
pub struct Vote {
    pub verifier: Identity,
    /// Bytes the verifier asserts as the task's result.
    pub proposed_output: Bytes,
    /// Whether this vote supports the leading proposal.
    pub agree: bool,
    /// Unix ms when the vote was recorded.
    pub cast_at: u64,
}
