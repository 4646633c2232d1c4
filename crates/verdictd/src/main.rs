//! verdictd — Verdict oracle daemon.
//!
//! Hosts the task registry, the verification tally, the JSON API, and
//! (optionally) local verifier agents that compute and vote on tasks.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::broadcast;

use verdict_core::config::{data_dir, VerdictConfig};
use verdict_core::identity::{self, Identity};
use verdict_services::{
    DissentPolicy, EventLog, HttpCallInterpreter, InterpreterRegistry, RoleSet, TaskRegistry,
    VerifierAgent, VerificationTally,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = VerdictConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = VerdictConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        VerdictConfig::default()
    });

    let admin = configured_identity(&config.roles.admin, "admin");
    let tally_identity = configured_identity(&config.consensus.tally_identity, "tally");

    // Role sets
    let (submitters, verifiers) = if config.node.persist_roles {
        let dir = data_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        (
            RoleSet::with_persistence("submitter", dir.join("submitters.json")),
            RoleSet::with_persistence("verifier", dir.join("verifiers.json")),
        )
    } else {
        (RoleSet::new("submitter"), RoleSet::new("verifier"))
    };
    submitters.apply_config(&config.roles.submitters);
    verifiers.apply_config(&config.roles.verifiers);

    // Core state
    let events = EventLog::new();
    let registry = Arc::new(TaskRegistry::new(admin, submitters, events.clone()));
    let tally = Arc::new(VerificationTally::new(
        tally_identity,
        admin,
        verifiers,
        config.consensus.threshold,
        registry.clone(),
        events.clone(),
    ));
    registry
        .set_tally(&admin, tally.identity())
        .context("failed to link tally identity")?;
    tracing::info!(
        threshold = tally.threshold(),
        submitters = registry.submitters().len(),
        verifiers = tally.verifiers().len(),
        "oracle state ready"
    );

    // Local verifier agents
    if config.agent.enabled {
        let pointer = if config.agent.json_pointer.is_empty() {
            None
        } else {
            Some(config.agent.json_pointer.clone())
        };
        let mut interpreters = InterpreterRegistry::new();
        interpreters.register(Arc::new(HttpCallInterpreter::new(
            Duration::from_secs(config.agent.http_timeout_secs),
            pointer,
            config.agent.tolerance,
        )?));
        let interpreters = Arc::new(interpreters);
        tracing::info!(task_types = ?interpreters.task_types(), "interpreter registry ready");
        let policy = DissentPolicy::from_config(&config.agent.dissent);

        for hex_id in &config.agent.identities {
            let id = match identity::parse(hex_id) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping invalid agent identity");
                    continue;
                }
            };
            if !tally.is_verifier(&id) {
                tracing::warn!(
                    identity = identity::short(&id),
                    "agent identity is not a registered verifier — its votes will be rejected"
                );
            }
            let agent = VerifierAgent::new(
                id,
                registry.clone(),
                tally.clone(),
                interpreters.clone(),
                policy,
            );
            tokio::spawn(agent.run(events.subscribe()));
        }
    }

    // Shutdown plumbing: ctrl-c or POST /api/daemon/shutdown
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    {
        let shutdown_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("ctrl-c received, shutting down");
                let _ = shutdown_tx.send(());
            }
        });
    }

    let state = verdict_api::ApiState {
        registry,
        tally,
        events,
        shutdown_tx,
    };
    verdict_api::serve(state, config.node.api_port).await?;

    tracing::info!("verdictd stopped");
    Ok(())
}

/// Parse a configured identity, generating a fresh one when unset.
fn configured_identity(hex_id: &str, role: &str) -> Identity {
    if hex_id.is_empty() {
        let id = identity::generate();
        tracing::info!(role, identity = hex::encode(id), "generated identity");
        return id;
    }
    match identity::parse(hex_id) {
        Ok(id) => id,
        Err(e) => {
            let id = identity::generate();
            tracing::warn!(role, error = %e, identity = hex::encode(id), "invalid configured identity, generated a fresh one");
            id
        }
    }
}
