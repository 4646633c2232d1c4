//! Configuration system for Verdict.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $VERDICT_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/verdict/config.toml
//!   3. ~/.config/verdict/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictConfig {
    pub node: NodeConfig,
    pub roles: RolesConfig,
    pub consensus: ConsensusConfig,
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// TCP port for the JSON API.
    pub api_port: u16,
    /// If true, role sets are written to data_dir on every mutation and
    /// reloaded on startup.
    pub persist_roles: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RolesConfig {
    /// Administrator identity (hex). Empty = generate on startup.
    pub admin: String,
    /// Identities (hex) allowed to submit tasks.
    pub submitters: Vec<String>,
    /// Identities (hex) allowed to vote on task results.
    pub verifiers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Matching agree-votes required to finalize a task. Must be ≥ 1.
    pub threshold: u32,
    /// Identity (hex) the registry authorizes to finalize tasks.
    /// Empty = generate on startup.
    pub tally_identity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Run local verifier agents inside the daemon.
    pub enabled: bool,
    /// Verifier identities (hex) the local agents vote as.
    pub identities: Vec<String>,
    /// HTTP timeout for http_call tasks, in seconds.
    pub http_timeout_secs: u64,
    /// JSON pointer applied to http_call responses, e.g.
    /// "/parsed/0/price/price". Empty = raw response body.
    pub json_pointer: String,
    /// Relative numeric deviation an agent accepts when confirming
    /// another verifier's proposal.
    pub tolerance: f64,
    /// What to do with a result outside tolerance: "abstain" or "dissent".
    pub dissent: String,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for VerdictConfig {
    fn default() -> Self {
        Self {
            node: NodeConfig::default(),
            roles: RolesConfig::default(),
            consensus: ConsensusConfig::default(),
            agent: AgentConfig::default(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            api_port: 9420,
            persist_roles: false,
        }
    }
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            admin: String::new(),
            submitters: Vec::new(),
            verifiers: Vec::new(),
        }
    }
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            threshold: 1,
            tally_identity: String::new(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            identities: Vec::new(),
            http_timeout_secs: 10,
            json_pointer: String::new(),
            tolerance: 0.01,
            dissent: "abstain".to_string(),
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

pub fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("verdict")
}

pub fn data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".local").join("share"))
        .join("verdict")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl VerdictConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            VerdictConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("VERDICT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&VerdictConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text)
                .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply VERDICT_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("VERDICT_NODE__API_PORT") {
            if let Ok(p) = v.parse() {
                self.node.api_port = p;
            }
        }
        if let Ok(v) = std::env::var("VERDICT_NODE__PERSIST_ROLES") {
            self.node.persist_roles = v == "true" || v == "1";
        }
        if let Ok(v) = std::env::var("VERDICT_ROLES__ADMIN") {
            self.roles.admin = v;
        }
        if let Ok(v) = std::env::var("VERDICT_CONSENSUS__THRESHOLD") {
            if let Ok(t) = v.parse() {
                self.consensus.threshold = t;
            }
        }
        if let Ok(v) = std::env::var("VERDICT_AGENT__ENABLED") {
            self.agent.enabled = v == "true" || v == "1";
        }
        if let Ok(v) = std::env::var("VERDICT_AGENT__TOLERANCE") {
            if let Ok(t) = v.parse() {
                self.agent.tolerance = t;
            }
        }
    }
}
