//! Oracle events — one per state transition, emitted exactly once.
//!
//! Events are the sole communication channel from the core to external
//! verifier agents. The core's contract is only the emission; delivery is
//! a broadcast/log concern handled in `verdict-services`.

use crate::identity::Identity;
use crate::task_id::TaskId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleEvent {
    /// A new task exists. The sole signal that work is available.
    TaskSubmitted { submitter: Identity, task_id: TaskId },
    /// A vote was recorded. `sealed` is set on the vote that reached
    /// threshold, so agents can stop work on the task.
    VoteCast {
        task_id: TaskId,
        verifier: Identity,
        agree: bool,
        sealed: bool,
    },
    /// The task's output was written. Consumers may now read it from the
    /// registry.
    TaskFinalized { task_id: TaskId },
}

impl OracleEvent {
    /// The task this event belongs to.
    pub fn task_id(&self) -> TaskId {
        match self {
            OracleEvent::TaskSubmitted { task_id, .. } => *task_id,
            OracleEvent::VoteCast { task_id, .. } => *task_id,
            OracleEvent::TaskFinalized { task_id } => *task_id,
        }
    }

    /// Short kind tag for logs and the event read API.
    pub fn kind(&self) -> &'static str {
        match self {
            OracleEvent::TaskSubmitted { .. } => "task_submitted",
            OracleEvent::VoteCast { .. } => "vote_cast",
            OracleEvent::TaskFinalized { .. } => "task_finalized",
        }
    }
}
