//! verdict-services — the behavioral core of the oracle.
//!
//! Owns the role sets, the task registry, the verification tally, the
//! event log, and the off-chain verifier agent that consumes them.

pub mod agent;
pub mod events;
pub mod interpreter;
pub mod registry;
pub mod roles;
pub mod tally;

pub use agent::{DissentPolicy, VerifierAgent};
pub use events::EventLog;
pub use interpreter::{HttpCallInterpreter, InterpreterRegistry, TaskInterpreter};
pub use registry::TaskRegistry;
pub use roles::RoleSet;
pub use tally::{TallySnapshot, VerificationTally};

/// Unix ms for record timestamps.
pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
