//! Off-chain verifier agent — computes tasks and votes on results.
//!
//! One agent runs per local verifier identity. It subscribes to the event
//! feed, executes newly submitted tasks through the interpreter registry,
//! and votes. The race with other verifiers is intentional: whoever votes
//! first sets the leading proposal, and everyone else falls into the
//! confirmation path — recomputing independently, comparing within the
//! interpreter's tolerance, and (when agreeing) reusing the proposal's
//! EXACT bytes so that byte-equality holds at the tally.

use std::sync::Arc;

use dashmap::DashSet;
use tokio::sync::broadcast;

use verdict_core::identity::{self, Identity};
use verdict_core::{OracleError, OracleEvent, TaskId, TaskState};

use crate::interpreter::InterpreterRegistry;
use crate::registry::TaskRegistry;
use crate::tally::VerificationTally;

/// What an agent does with a result outside tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DissentPolicy {
    /// Cast no vote. Keeps the task's vote slot open for this verifier.
    Abstain,
    /// Cast a recorded (non-counting) vote with the agent's own bytes.
    Dissent,
}

impl DissentPolicy {
    /// Parse the config string; unknown values fall back to abstaining.
    pub fn from_config(value: &str) -> Self {
        match value {
            "dissent" => DissentPolicy::Dissent,
            "abstain" => DissentPolicy::Abstain,
            other => {
                tracing::warn!(value = other, "unknown dissent policy, defaulting to abstain");
                DissentPolicy::Abstain
            }
        }
    }
}

pub struct VerifierAgent {
    identity: Identity,
    registry: Arc<TaskRegistry>,
    tally: Arc<VerificationTally>,
    interpreters: Arc<InterpreterRegistry>,
    policy: DissentPolicy,
    /// Tasks this agent no longer needs to work on (sealed or finalized).
    done: Arc<DashSet<TaskId>>,
}

impl VerifierAgent {
    pub fn new(
        identity: Identity,
        registry: Arc<TaskRegistry>,
        tally: Arc<VerificationTally>,
        interpreters: Arc<InterpreterRegistry>,
        policy: DissentPolicy,
    ) -> Self {
        Self {
            identity,
            registry,
            tally,
            interpreters,
            policy,
            done: Arc::new(DashSet::new()),
        }
    }

    /// Consume the event feed until it closes. Each submission is handled
    /// on its own task so a slow fetch never blocks the feed.
    pub async fn run(self, mut events: broadcast::Receiver<OracleEvent>) {
        tracing::info!(verifier = identity::short(&self.identity), "verifier agent started");
        loop {
            match events.recv().await {
                Ok(OracleEvent::TaskSubmitted { task_id, .. }) => {
                    let agent = self.clone();
                    tokio::spawn(async move { agent.handle_submission(task_id).await });
                }
                Ok(OracleEvent::VoteCast { task_id, sealed: true, .. })
                | Ok(OracleEvent::TaskFinalized { task_id }) => {
                    // Stop any in-flight work on this task.
                    self.done.insert(task_id);
                }
                Ok(OracleEvent::VoteCast { .. }) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(
                        verifier = identity::short(&self.identity),
                        missed,
                        "event feed lagged"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!(verifier = identity::short(&self.identity), "verifier agent stopped");
    }

    async fn handle_submission(&self, task_id: TaskId) {
        if self.done.contains(&task_id) {
            return;
        }
        let task = match self.registry.task(&task_id) {
            Some(t) => t,
            None => return,
        };
        if task.state == TaskState::Finalized {
            return;
        }
        let interpreter = match self.interpreters.get(task.task_type) {
            Some(i) => i,
            None => {
                tracing::debug!(
                    task_id = &hex::encode(task_id)[..16],
                    task_type = ?task.task_type,
                    "no interpreter for task type, skipping"
                );
                return;
            }
        };

        let computed = match interpreter.execute(&task.input).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(
                    task_id = &hex::encode(task_id)[..16],
                    verifier = identity::short(&self.identity),
                    error = %e,
                    "task execution failed, abstaining"
                );
                return;
            }
        };

        // The window between this read and the vote is racy on purpose:
        // losing the first-vote slot just turns this into a mismatching
        // recorded vote, and a seal surfaces as AlreadySealed below.
        if self.done.contains(&task_id) {
            return;
        }
        let (ballot, agree) = match self.tally.tally(&task_id) {
            None => (computed, true),
            Some(snap) if snap.sealed => return,
            Some(snap) => {
                if interpreter.within_tolerance(&snap.output, &computed) {
                    // Confirm with the adopted bytes, not our own, so the
                    // byte-equality check at the tally holds.
                    (snap.output, true)
                } else {
                    match self.policy {
                        DissentPolicy::Abstain => {
                            tracing::info!(
                                task_id = &hex::encode(task_id)[..16],
                                verifier = identity::short(&self.identity),
                                "result outside tolerance, abstaining"
                            );
                            return;
                        }
                        DissentPolicy::Dissent => (computed, false),
                    }
                }
            }
        };

        match self.tally.vote(&self.identity, &task_id, ballot, agree) {
            Ok(sealed) => {
                if sealed {
                    self.done.insert(task_id);
                }
                tracing::info!(
                    task_id = &hex::encode(task_id)[..16],
                    verifier = identity::short(&self.identity),
                    agree,
                    sealed,
                    "vote cast"
                );
            }
            Err(OracleError::AlreadySealed(_)) => {
                // Too late — another verifier's vote reached threshold first.
                self.done.insert(task_id);
            }
            Err(e) => {
                tracing::warn!(
                    task_id = &hex::encode(task_id)[..16],
                    verifier = identity::short(&self.identity),
                    error = %e,
                    "vote rejected"
                );
            }
        }
    }
}

impl Clone for VerifierAgent {
    fn clone(&self) -> Self {
        Self {
            identity: self.identity,
            registry: self.registry.clone(),
            tally: self.tally.clone(),
            interpreters: self.interpreters.clone(),
            policy: self.policy,
            done: self.done.clone(),
        }
    }
}
