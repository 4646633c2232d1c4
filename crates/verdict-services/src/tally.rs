//! Verification tally — per-task votes and threshold agreement.
//!
//! The first vote on a task adopts its proposed output as the leading
//! proposal; every later vote counts toward agreement only if it is a
//! byte-for-byte match with `agree = true`. This collapses consensus to a
//! single round of byte-equality checks: verifiers race to be first, and
//! the rest confirm (or dissent, which is recorded but never counted).
//! Tolerance and normalization are verifier-agent concerns that happen
//! before a vote is cast, never here.
//!
//! All per-task state lives in one map entry and is mutated under that
//! entry's lock, so votes on the same task are serialized while unrelated
//! tasks never contend. The seal flag is set under the lock and the
//! registry callback runs after it is released, which makes `finalize`
//! at-most-once even when threshold-reaching votes race.

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use verdict_core::identity::{self, Identity};
use verdict_core::{OracleError, OracleEvent, Result, TaskId, Vote};

use crate::events::EventLog;
use crate::now_ms;
use crate::registry::TaskRegistry;
use crate::roles::RoleSet;

/// Per-task vote aggregation.
struct TallyEntry {
    /// The leading proposal — set by the first vote, never replaced.
    output: Bytes,
    /// Votes byte-equal to `output` with `agree = true`. The first vote
    /// counts regardless of its flag.
    agree_count: u32,
    sealed: bool,
    /// Every recorded vote, in arrival order. Dissents included.
    votes: Vec<Vote>,
}

/// Read-only view of a task's tally.
#[derive(Debug, Clone)]
pub struct TallySnapshot {
    pub output: Bytes,
    pub agree_count: u32,
    pub sealed: bool,
    pub vote_count: usize,
}

pub struct VerificationTally {
    /// The identity the linked registry authorizes for `finalize`.
    identity: Identity,
    admin: Identity,
    verifiers: RoleSet,
    threshold: Arc<AtomicU32>,
    entries: Arc<DashMap<TaskId, TallyEntry>>,
    /// One-way capability link: the tally can finalize, nothing else.
    registry: Arc<TaskRegistry>,
    events: EventLog,
}

impl VerificationTally {
    pub fn new(
        identity: Identity,
        admin: Identity,
        verifiers: RoleSet,
        threshold: u32,
        registry: Arc<TaskRegistry>,
        events: EventLog,
    ) -> Self {
        Self {
            identity,
            admin,
            verifiers,
            threshold: Arc::new(AtomicU32::new(threshold.max(1))),
            entries: Arc::new(DashMap::new()),
            registry,
            events,
        }
    }

    /// The identity this tally finalizes as. The registry must be linked
    /// to it via `set_tally` for finalization to succeed.
    pub fn identity(&self) -> Identity {
        self.identity
    }

    // ── Protocol operation ────────────────────────────────────────────────

    /// Record a vote. Returns whether this vote sealed the task.
    pub fn vote(
        &self,
        caller: &Identity,
        task_id: &TaskId,
        proposed_output: Bytes,
        agree: bool,
    ) -> Result<bool> {
        if !self.verifiers.contains(caller) {
            return Err(OracleError::Unauthorized("verifier"));
        }
        if !self.registry.contains(task_id) {
            return Err(OracleError::UnknownTask(hex::encode(task_id)));
        }

        let threshold = self.threshold.load(Ordering::Relaxed);
        let vote = Vote {
            verifier: *caller,
            proposed_output: proposed_output.clone(),
            agree,
            cast_at: now_ms(),
        };

        // Everything up to sealing happens under the entry lock; votes on
        // one task are serialized, unrelated tasks never contend.
        let (sealed_now, adopted) = match self.entries.entry(*task_id) {
            Entry::Vacant(slot) => {
                // First vote adopts the proposal and counts as agreement,
                // whatever its flag says.
                let sealed = 1 >= threshold;
                slot.insert(TallyEntry {
                    output: proposed_output.clone(),
                    agree_count: 1,
                    sealed,
                    votes: vec![vote],
                });
                (sealed, proposed_output)
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                if entry.sealed {
                    return Err(OracleError::AlreadySealed(hex::encode(task_id)));
                }
                if entry.votes.iter().any(|v| v.verifier == *caller) {
                    return Err(OracleError::DuplicateVote(hex::encode(task_id)));
                }

                let counts = agree && proposed_output == entry.output;
                entry.votes.push(vote);
                let mut sealed = false;
                if counts {
                    entry.agree_count += 1;
                    if entry.agree_count >= threshold {
                        entry.sealed = true;
                        sealed = true;
                    }
                }
                (sealed, entry.output.clone())
            }
        };

        tracing::debug!(
            task_id = &hex::encode(task_id)[..16],
            verifier = identity::short(caller),
            agree,
            sealed = sealed_now,
            "vote recorded"
        );
        self.events.emit(OracleEvent::VoteCast {
            task_id: *task_id,
            verifier: *caller,
            agree,
            sealed: sealed_now,
        });

        if sealed_now {
            // At-most-once from the tally's perspective: the entry is
            // already sealed, so a failure here is reported, not retried.
            if let Err(e) = self.registry.finalize(&self.identity, task_id, adopted) {
                tracing::warn!(
                    task_id = &hex::encode(task_id)[..16],
                    error = %e,
                    "tally sealed but finalize failed"
                );
            }
        }

        Ok(sealed_now)
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    pub fn tally(&self, task_id: &TaskId) -> Option<TallySnapshot> {
        self.entries.get(task_id).map(|entry| TallySnapshot {
            output: entry.output.clone(),
            agree_count: entry.agree_count,
            sealed: entry.sealed,
            vote_count: entry.votes.len(),
        })
    }

    pub fn votes(&self, task_id: &TaskId) -> Vec<Vote> {
        self.entries
            .get(task_id)
            .map(|entry| entry.votes.clone())
            .unwrap_or_default()
    }

    pub fn threshold(&self) -> u32 {
        self.threshold.load(Ordering::Relaxed)
    }

    pub fn is_verifier(&self, id: &Identity) -> bool {
        self.verifiers.contains(id)
    }

    pub fn verifiers(&self) -> Vec<Identity> {
        self.verifiers.list()
    }

    // ── Administrative operations ─────────────────────────────────────────

    /// Set the agreement threshold. A threshold above the current verifier
    /// count is accepted but can never seal — surfaced as a warning only.
    pub fn set_threshold(&self, caller: &Identity, threshold: u32) -> Result<()> {
        if *caller != self.admin {
            return Err(OracleError::Unauthorized("admin"));
        }
        if threshold == 0 {
            return Err(OracleError::InvalidThreshold);
        }
        if threshold as usize > self.verifiers.len() {
            tracing::warn!(
                threshold,
                verifiers = self.verifiers.len(),
                "threshold exceeds verifier count — tasks cannot seal until more verifiers join"
            );
        }
        self.threshold.store(threshold, Ordering::Relaxed);
        tracing::info!(threshold, "verify threshold set");
        Ok(())
    }

    /// Add a verifier. Idempotent: returns false if already present.
    pub fn add_verifier(&self, caller: &Identity, id: Identity) -> Result<bool> {
        if *caller != self.admin {
            return Err(OracleError::Unauthorized("admin"));
        }
        Ok(self.verifiers.add(id))
    }

    /// Remove a verifier. Idempotent: returns false if not present.
    pub fn remove_verifier(&self, caller: &Identity, id: &Identity) -> Result<bool> {
        if *caller != self.admin {
            return Err(OracleError::Unauthorized("admin"));
        }
        Ok(self.verifiers.remove(id))
    }
}

impl Clone for VerificationTally {
    fn clone(&self) -> Self {
        Self {
            identity: self.identity,
            admin: self.admin,
            verifiers: self.verifiers.clone(),
            threshold: self.threshold.clone(),
            entries: self.entries.clone(),
            registry: self.registry.clone(),
            events: self.events.clone(),
        }
    }
}
