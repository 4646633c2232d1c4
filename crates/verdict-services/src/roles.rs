//! Role sets — allow-listed identities for a single capability.
//!
//! A `RoleSet` is a flat membership set: an identity is either in the
//! role or it is not. Add and remove are idempotent (adding an existing
//! member is a no-op, not an error). Gating who may mutate a set is the
//! owning component's concern, not the set's.
//!
//! When constructed with a persist path, membership is written to disk on
//! every mutation and reloaded on startup, so runtime role changes (via
//! the API) survive daemon restarts.

use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;

use verdict_core::identity::{self, Identity};

pub struct RoleSet {
    /// Role name for logs: "submitter", "verifier".
    name: &'static str,
    members: Arc<DashMap<Identity, ()>>,
    persist_path: Arc<Option<PathBuf>>,
}

impl RoleSet {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            members: Arc::new(DashMap::new()),
            persist_path: Arc::new(None),
        }
    }

    /// Create a set that persists membership to the given file path.
    /// Loads existing membership from disk if the file exists.
    pub fn with_persistence(name: &'static str, path: PathBuf) -> Self {
        let set = Self {
            name,
            members: Arc::new(DashMap::new()),
            persist_path: Arc::new(Some(path)),
        };
        set.load_from_disk();
        set
    }

    /// Seed membership from configured hex identities. Invalid entries are
    /// skipped with a warning.
    pub fn apply_config(&self, configured: &[String]) {
        for hex_id in configured {
            match identity::parse(hex_id) {
                Ok(id) => {
                    self.members.insert(id, ());
                    tracing::info!(
                        role = self.name,
                        identity = &hex_id[..16.min(hex_id.len())],
                        "pre-configured role member"
                    );
                }
                Err(e) => {
                    tracing::warn!(role = self.name, error = %e, "skipping invalid configured identity");
                }
            }
        }
    }

    pub fn contains(&self, id: &Identity) -> bool {
        self.members.contains_key(id)
    }

    /// Add a member. Returns false if already present (no-op).
    pub fn add(&self, id: Identity) -> bool {
        let added = self.members.insert(id, ()).is_none();
        if added {
            self.save_to_disk();
            tracing::info!(role = self.name, identity = identity::short(&id), "role member added");
        }
        added
    }

    /// Remove a member. Returns false if not present (no-op).
    pub fn remove(&self, id: &Identity) -> bool {
        let removed = self.members.remove(id).is_some();
        if removed {
            self.save_to_disk();
            tracing::info!(role = self.name, identity = identity::short(id), "role member removed");
        }
        removed
    }

    pub fn list(&self) -> Vec<Identity> {
        self.members.iter().map(|entry| *entry.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl RoleSet {
    /// Serialize membership to disk as a JSON array of hex identities.
    /// Best-effort — logs on failure.
    fn save_to_disk(&self) {
        let path = match self.persist_path.as_ref() {
            Some(p) => p,
            None => return,
        };
        let snapshot: Vec<String> = self.members.iter().map(|e| hex::encode(e.key())).collect();
        match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    tracing::warn!(role = self.name, error = %e, path = %path.display(), "failed to persist role set");
                }
            }
            Err(e) => {
                tracing::warn!(role = self.name, error = %e, "failed to serialize role set");
            }
        }
    }

    /// Load membership from disk. Called once during construction.
    fn load_from_disk(&self) {
        let path = match self.persist_path.as_ref() {
            Some(p) => p,
            None => return,
        };
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                tracing::warn!(role = self.name, error = %e, path = %path.display(), "failed to read role set");
                return;
            }
        };
        let ids: Vec<String> = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(role = self.name, error = %e, path = %path.display(), "failed to parse role set");
                return;
            }
        };
        let mut loaded = 0usize;
        for hex_id in &ids {
            if let Ok(id) = identity::parse(hex_id) {
                self.members.insert(id, ());
                loaded += 1;
            }
        }
        if loaded > 0 {
            tracing::info!(role = self.name, count = loaded, path = %path.display(), "loaded persisted role set");
        }
    }
}

impl Clone for RoleSet {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            members: self.members.clone(),
            persist_path: self.persist_path.clone(),
        }
    }
}
