//! Task registry — the durable record of tasks and their final outputs.
//!
//! Owns `Task` records exclusively. Tasks are created by `submit` and
//! mutated exactly once, by `finalize` — which only the registered tally
//! identity may call. The link to the tally is a capability, not
//! containment: the registry knows one identity it will accept `finalize`
//! from, nothing more.

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::{Arc, RwLock};

use verdict_core::identity::{self, Identity};
use verdict_core::{task_id, OracleError, OracleEvent, Result, Task, TaskId, TaskState, TaskType};

use crate::events::EventLog;
use crate::now_ms;
use crate::roles::RoleSet;

pub struct TaskRegistry {
    admin: Identity,
    submitters: RoleSet,
    tasks: Arc<DashMap<TaskId, Task>>,
    /// The single identity authorized to call `finalize`. Set once at
    /// bootstrap, changeable only by the admin.
    tally_identity: Arc<RwLock<Option<Identity>>>,
    events: EventLog,
}

impl TaskRegistry {
    pub fn new(admin: Identity, submitters: RoleSet, events: EventLog) -> Self {
        Self {
            admin,
            submitters,
            tasks: Arc::new(DashMap::new()),
            tally_identity: Arc::new(RwLock::new(None)),
            events,
        }
    }

    // ── Protocol operations ───────────────────────────────────────────────

    /// Register a new task. The returned id is `task_id(caller, type, input)`
    /// and doubles as a content commitment: the same triple can never yield
    /// a second task record.
    pub fn submit(&self, caller: &Identity, task_type: TaskType, input: Bytes) -> Result<TaskId> {
        if !self.submitters.contains(caller) {
            return Err(OracleError::Unauthorized("submitter"));
        }

        let id = task_id(caller, task_type, &input);
        match self.tasks.entry(id) {
            Entry::Occupied(_) => return Err(OracleError::DuplicateTask(hex::encode(id))),
            Entry::Vacant(slot) => {
                slot.insert(Task {
                    id,
                    submitter: *caller,
                    task_type,
                    input,
                    output: Bytes::new(),
                    state: TaskState::Pending,
                    submitted_at: now_ms(),
                    finalized_at: None,
                });
            }
        }

        tracing::info!(
            task_id = &hex::encode(id)[..16],
            submitter = identity::short(caller),
            ?task_type,
            "task submitted"
        );
        self.events.emit(OracleEvent::TaskSubmitted {
            submitter: *caller,
            task_id: id,
        });
        Ok(id)
    }

    /// Write the agreed output onto a pending task. This is the only path
    /// by which a task's output is ever set.
    pub fn finalize(&self, caller: &Identity, task_id: &TaskId, output: Bytes) -> Result<()> {
        let authorized = self
            .tally_identity
            .read()
            .ok()
            .and_then(|guard| *guard)
            .map(|tally| tally == *caller)
            .unwrap_or(false);
        if !authorized {
            return Err(OracleError::Unauthorized("tally"));
        }

        {
            let mut task = self
                .tasks
                .get_mut(task_id)
                .ok_or_else(|| OracleError::UnknownTask(hex::encode(task_id)))?;
            if task.state != TaskState::Pending {
                return Err(OracleError::AlreadyFinalized(hex::encode(task_id)));
            }
            task.output = output;
            task.state = TaskState::Finalized;
            task.finalized_at = Some(now_ms());
        }

        tracing::info!(task_id = &hex::encode(task_id)[..16], "task finalized");
        self.events
            .emit(OracleEvent::TaskFinalized { task_id: *task_id });
        Ok(())
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    pub fn task(&self, task_id: &TaskId) -> Option<Task> {
        self.tasks.get(task_id).map(|t| t.clone())
    }

    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.tasks.contains_key(task_id)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn task_ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|entry| *entry.key()).collect()
    }

    pub fn is_submitter(&self, id: &Identity) -> bool {
        self.submitters.contains(id)
    }

    pub fn submitters(&self) -> Vec<Identity> {
        self.submitters.list()
    }

    pub fn tally_identity(&self) -> Option<Identity> {
        self.tally_identity.read().ok().and_then(|guard| *guard)
    }

    // ── Administrative operations ─────────────────────────────────────────

    /// Set or replace the identity authorized to finalize tasks.
    pub fn set_tally(&self, caller: &Identity, tally: Identity) -> Result<()> {
        if *caller != self.admin {
            return Err(OracleError::Unauthorized("admin"));
        }
        if let Ok(mut guard) = self.tally_identity.write() {
            *guard = Some(tally);
        }
        tracing::info!(tally = identity::short(&tally), "tally identity set");
        Ok(())
    }

    /// Add a submitter. Idempotent: returns false if already present.
    pub fn add_submitter(&self, caller: &Identity, id: Identity) -> Result<bool> {
        if *caller != self.admin {
            return Err(OracleError::Unauthorized("admin"));
        }
        Ok(self.submitters.add(id))
    }

    /// Remove a submitter. Idempotent: returns false if not present.
    pub fn remove_submitter(&self, caller: &Identity, id: &Identity) -> Result<bool> {
        if *caller != self.admin {
            return Err(OracleError::Unauthorized("admin"));
        }
        Ok(self.submitters.remove(id))
    }
}

impl Clone for TaskRegistry {
    fn clone(&self) -> Self {
        Self {
            admin: self.admin,
            submitters: self.submitters.clone(),
            tasks: self.tasks.clone(),
            tally_identity: self.tally_identity.clone(),
            events: self.events.clone(),
        }
    }
}
