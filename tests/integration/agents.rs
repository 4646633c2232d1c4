//! Verifier agents racing over the event feed.
//!
//! Each agent gets its own interpreter returning a slightly different
//! result, the way independent fetchers of a live price feed would.
//! Delays stagger the agents so the race has a deterministic winner and
//! the followers exercise the confirmation path.

use crate::*;
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::time::Duration;
use verdict_core::{TaskState, TaskType};
use verdict_services::{DissentPolicy, InterpreterRegistry, TaskInterpreter, VerifierAgent};

/// Deterministic stand-in for an HTTP fetcher: waits `delay_ms`, then
/// returns fixed bytes. Tolerance is a 1% relative deviation, matching
/// the numeric rule of the real http_call interpreter.
struct StubInterpreter {
    result: Bytes,
    delay_ms: u64,
}

impl TaskInterpreter for StubInterpreter {
    fn task_type(&self) -> TaskType {
        TaskType::HttpCall
    }

    fn execute<'a>(&'a self, _input: &'a [u8]) -> BoxFuture<'a, anyhow::Result<Bytes>> {
        async move {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            Ok(self.result.clone())
        }
        .boxed()
    }

    fn within_tolerance(&self, adopted: &[u8], computed: &[u8]) -> bool {
        let parse = |b: &[u8]| std::str::from_utf8(b).ok()?.parse::<f64>().ok();
        match (parse(adopted), parse(computed)) {
            (Some(a), Some(c)) => (a - c).abs() / a.abs().max(c.abs()) <= 0.01,
            _ => adopted == computed,
        }
    }
}

fn spawn_agent(
    oracle: &Oracle,
    verifier: verdict_core::Identity,
    result: &'static [u8],
    delay_ms: u64,
    policy: DissentPolicy,
) {
    let mut interpreters = InterpreterRegistry::new();
    interpreters.register(std::sync::Arc::new(StubInterpreter {
        result: Bytes::from_static(result),
        delay_ms,
    }));
    let agent = VerifierAgent::new(
        verifier,
        oracle.registry.clone(),
        oracle.tally.clone(),
        std::sync::Arc::new(interpreters),
        policy,
    );
    tokio::spawn(agent.run(oracle.events.subscribe()));
}

#[tokio::test]
async fn three_agents_race_and_confirm_to_finalization() {
    let oracle = oracle(3, 3);

    // A wins the race; B and C land within 1% and confirm A's exact bytes.
    spawn_agent(&oracle, oracle.verifiers[0], b"478113417292", 0, DissentPolicy::Abstain);
    spawn_agent(&oracle, oracle.verifiers[1], b"478200000000", 150, DissentPolicy::Abstain);
    spawn_agent(&oracle, oracle.verifiers[2], b"477900000000", 300, DissentPolicy::Abstain);

    let mut feed = oracle.events.subscribe();
    let task_id = oracle
        .registry
        .submit(&SUBMITTER, TaskType::HttpCall, Bytes::from_static(b"url"))
        .unwrap();

    wait_for_finalized(&mut feed, task_id).await.unwrap();

    let task = oracle.registry.task(&task_id).unwrap();
    assert_eq!(task.state, TaskState::Finalized);
    assert_eq!(task.output, Bytes::from_static(b"478113417292"));

    // Every confirming vote reused the adopted bytes verbatim.
    let votes = oracle.tally.votes(&task_id);
    assert_eq!(votes.len(), 3);
    for vote in &votes {
        assert_eq!(vote.proposed_output, task.output);
        assert!(vote.agree);
    }

    let snap = oracle.tally.tally(&task_id).unwrap();
    assert_eq!(snap.agree_count, 3);
    assert!(snap.sealed);
}

#[tokio::test]
async fn abstaining_agent_casts_no_vote_outside_tolerance() {
    let oracle = oracle(2, 2);

    spawn_agent(&oracle, oracle.verifiers[0], b"1000", 0, DissentPolicy::Abstain);
    // Far outside 1% — this agent observes the proposal and abstains.
    spawn_agent(&oracle, oracle.verifiers[1], b"2000", 150, DissentPolicy::Abstain);

    let task_id = oracle
        .registry
        .submit(&SUBMITTER, TaskType::HttpCall, Bytes::from_static(b"url"))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(600)).await;

    let snap = oracle.tally.tally(&task_id).unwrap();
    assert_eq!(snap.vote_count, 1);
    assert_eq!(snap.agree_count, 1);
    assert!(!snap.sealed);
    assert_eq!(oracle.registry.task(&task_id).unwrap().state, TaskState::Pending);
}

#[tokio::test]
async fn dissenting_agent_records_a_non_counting_vote() {
    let oracle = oracle(2, 2);

    spawn_agent(&oracle, oracle.verifiers[0], b"1000", 0, DissentPolicy::Dissent);
    spawn_agent(&oracle, oracle.verifiers[1], b"2000", 150, DissentPolicy::Dissent);

    let task_id = oracle
        .registry
        .submit(&SUBMITTER, TaskType::HttpCall, Bytes::from_static(b"url"))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(600)).await;

    let snap = oracle.tally.tally(&task_id).unwrap();
    assert_eq!(snap.vote_count, 2);
    assert_eq!(snap.agree_count, 1);
    assert!(!snap.sealed);

    let votes = oracle.tally.votes(&task_id);
    let dissent = votes.iter().find(|v| !v.agree).unwrap();
    assert_eq!(dissent.proposed_output, Bytes::from_static(b"2000"));
}

/// With threshold 1 the winning agent's vote both adopts the output and
/// immediately seals; the slower agent observes the seal and stays quiet.
#[tokio::test]
async fn sealed_task_short_circuits_remaining_agents() {
    let oracle = oracle(1, 2);

    spawn_agent(&oracle, oracle.verifiers[0], b"42", 0, DissentPolicy::Abstain);
    spawn_agent(&oracle, oracle.verifiers[1], b"42", 200, DissentPolicy::Abstain);

    let mut feed = oracle.events.subscribe();
    let task_id = oracle
        .registry
        .submit(&SUBMITTER, TaskType::HttpCall, Bytes::from_static(b"url"))
        .unwrap();

    wait_for_finalized(&mut feed, task_id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;

    let snap = oracle.tally.tally(&task_id).unwrap();
    assert_eq!(snap.vote_count, 1);
    assert!(snap.sealed);
}
