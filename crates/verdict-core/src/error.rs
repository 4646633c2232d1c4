//! Error taxonomy for registry and tally operations.
//!
//! Every error is a synchronous rejection of the triggering operation —
//! no operation partially applies. Callers observe the rejection and may
//! retry with corrected parameters; the core never retries on its own.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// Caller lacks the required role or identity.
    #[error("caller is not an authorized {0}")]
    Unauthorized(&'static str),

    /// A task with this id already exists.
    #[error("task {0} already exists")]
    DuplicateTask(String),

    /// No task with this id.
    #[error("unknown task {0}")]
    UnknownTask(String),

    /// The task is past its mutable window.
    #[error("task {0} is already finalized")]
    AlreadyFinalized(String),

    /// The tally for this task has reached threshold; votes are rejected,
    /// not silently ignored, so a late verifier can tell "too late" apart
    /// from "recorded".
    #[error("tally for task {0} is sealed")]
    AlreadySealed(String),

    /// The verifier already voted on this task.
    #[error("verifier already voted on task {0}")]
    DuplicateVote(String),

    /// Threshold must be at least 1.
    #[error("threshold must be at least 1")]
    InvalidThreshold,
}

pub type Result<T> = std::result::Result<T, OracleError>;
