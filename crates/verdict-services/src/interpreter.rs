//! Task-type interpreters — the pluggable executors verifier agents use.
//!
//! An interpreter maps a task type's opaque request bytes to computed
//! response bytes, and owns the task-type-specific tolerance rule an
//! agent applies before confirming another verifier's proposal. The
//! on-chain core never sees any of this: by the time a vote is cast, the
//! agent has already normalized its result into canonical bytes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;

use verdict_core::TaskType;

/// Executor for one task type.
///
/// Object-safe so the registry can hold a heterogeneous set; `execute`
/// returns a boxed future for the same reason.
pub trait TaskInterpreter: Send + Sync {
    fn task_type(&self) -> TaskType;

    /// Perform the task. `input` is the task's opaque request payload;
    /// the returned bytes are the canonical form the agent will vote with.
    fn execute<'a>(&'a self, input: &'a [u8]) -> BoxFuture<'a, anyhow::Result<Bytes>>;

    /// Whether `computed` confirms the already-adopted proposal. Defaults
    /// to exact equality; numeric task types override with a deviation rule.
    fn within_tolerance(&self, adopted: &[u8], computed: &[u8]) -> bool {
        adopted == computed
    }
}

/// Static task-type → interpreter map, built once at startup.
#[derive(Default)]
pub struct InterpreterRegistry {
    interpreters: HashMap<TaskType, Arc<dyn TaskInterpreter>>,
}

impl InterpreterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, interpreter: Arc<dyn TaskInterpreter>) {
        self.interpreters
            .insert(interpreter.task_type(), interpreter);
    }

    pub fn get(&self, task_type: TaskType) -> Option<Arc<dyn TaskInterpreter>> {
        self.interpreters.get(&task_type).cloned()
    }

    pub fn task_types(&self) -> Vec<TaskType> {
        self.interpreters.keys().copied().collect()
    }
}

// ── http_call ─────────────────────────────────────────────────────────────────

/// Interpreter for `http_call` tasks.
///
/// Request: a UTF-8 URL. Response: the body, or — when a JSON pointer is
/// configured — the pointed-at value normalized to its canonical string
/// bytes (so every agent that fetches the same value votes the same bytes).
pub struct HttpCallInterpreter {
    client: reqwest::Client,
    json_pointer: Option<String>,
    /// Max relative deviation accepted when confirming a numeric result.
    tolerance: f64,
}

impl HttpCallInterpreter {
    pub fn new(
        timeout: Duration,
        json_pointer: Option<String>,
        tolerance: f64,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            json_pointer,
            tolerance,
        })
    }

    async fn fetch(&self, input: &[u8]) -> anyhow::Result<Bytes> {
        let url = std::str::from_utf8(input).context("http_call input is not UTF-8")?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;
        if !response.status().is_success() {
            bail!("GET {url} returned {}", response.status());
        }
        let body = response.bytes().await.context("failed to read body")?;

        match &self.json_pointer {
            None => Ok(body),
            Some(pointer) => {
                let json: serde_json::Value =
                    serde_json::from_slice(&body).context("response is not JSON")?;
                let value = json
                    .pointer(pointer)
                    .with_context(|| format!("JSON pointer {pointer} not found"))?;
                normalize_json_value(value)
            }
        }
    }
}

impl TaskInterpreter for HttpCallInterpreter {
    fn task_type(&self) -> TaskType {
        TaskType::HttpCall
    }

    fn execute<'a>(&'a self, input: &'a [u8]) -> BoxFuture<'a, anyhow::Result<Bytes>> {
        self.fetch(input).boxed()
    }

    /// Numeric results within the configured relative deviation confirm the
    /// proposal; anything non-numeric falls back to exact equality.
    fn within_tolerance(&self, adopted: &[u8], computed: &[u8]) -> bool {
        match (parse_number(adopted), parse_number(computed)) {
            (Some(a), Some(c)) => {
                if a == c {
                    return true;
                }
                let scale = a.abs().max(c.abs());
                (a - c).abs() / scale <= self.tolerance
            }
            _ => adopted == computed,
        }
    }
}

/// Canonical byte form of an extracted JSON value. String values are taken
/// verbatim (price feeds often quote numbers as strings); numbers and bools
/// use their JSON rendering; structured values are re-serialized.
fn normalize_json_value(value: &serde_json::Value) -> anyhow::Result<Bytes> {
    let text = match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        other => serde_json::to_string(other).context("failed to serialize JSON value")?,
    };
    Ok(Bytes::from(text))
}

fn parse_number(bytes: &[u8]) -> Option<f64> {
    std::str::from_utf8(bytes).ok()?.trim().parse().ok()
}
