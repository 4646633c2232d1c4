//! End-to-end consensus flow, driven directly against the service layer.

use crate::*;
use bytes::Bytes;
use verdict_core::{OracleError, TaskState, TaskType};

/// Mirrors the reference flow: one submitter, three verifiers, threshold 3.
/// Verifier A proposes; B and C each recompute off-chain, find their result
/// within tolerance, and confirm with A's exact bytes.
#[test]
fn three_verifier_price_feed_flow() {
    let oracle = oracle(3, 3);
    let [a, b, c] = [oracle.verifiers[0], oracle.verifiers[1], oracle.verifiers[2]];

    let url = "https://hermes.pyth.network/v2/updates/price/latest?ids[]=8963";
    let task_id = oracle
        .registry
        .submit(&SUBMITTER, TaskType::HttpCall, Bytes::from(url))
        .unwrap();

    let task = oracle.registry.task(&task_id).unwrap();
    assert_eq!(task.submitter, SUBMITTER);
    assert_eq!(task.input, Bytes::from(url));
    assert_eq!(task.state, TaskState::Pending);

    // Verifier A computes the price and casts the first vote.
    let price_a = Bytes::from_static(b"478113417292");
    let sealed = oracle.tally.vote(&a, &task_id, price_a.clone(), true).unwrap();
    assert!(!sealed);
    let snap = oracle.tally.tally(&task_id).unwrap();
    assert_eq!(snap.output, price_a);
    assert_eq!(snap.agree_count, 1);
    assert_eq!(oracle.registry.task(&task_id).unwrap().state, TaskState::Pending);

    // Verifier B fetches independently (478200000000 — within 1% of A),
    // so it confirms with A's exact bytes, not its own.
    let price_b: f64 = 478_200_000_000.0;
    let adopted: f64 = std::str::from_utf8(&snap.output).unwrap().parse().unwrap();
    assert!((adopted - price_b).abs() / price_b < 0.01);
    let sealed = oracle
        .tally
        .vote(&b, &task_id, snap.output.clone(), true)
        .unwrap();
    assert!(!sealed);
    assert_eq!(oracle.tally.tally(&task_id).unwrap().agree_count, 2);
    assert_eq!(oracle.registry.task(&task_id).unwrap().state, TaskState::Pending);

    // Verifier C does the same; this vote reaches threshold.
    let sealed = oracle
        .tally
        .vote(&c, &task_id, snap.output.clone(), true)
        .unwrap();
    assert!(sealed);

    let task = oracle.registry.task(&task_id).unwrap();
    assert_eq!(task.state, TaskState::Finalized);
    assert_eq!(task.output, price_a);

    // Exactly one finalization event, after the sealing vote.
    let log = oracle.events.events_for(&task_id);
    let finalized: Vec<_> = log.iter().filter(|e| e.kind() == "task_finalized").collect();
    assert_eq!(finalized.len(), 1);
    assert_eq!(log.last().unwrap().kind(), "task_finalized");

    // Late vote: rejected, not recorded.
    let err = oracle
        .tally
        .vote(&a, &task_id, price_a, true)
        .unwrap_err();
    assert!(matches!(err, OracleError::AlreadySealed(_)));
}

#[test]
fn only_the_linked_tally_can_finalize() {
    let oracle = oracle(1, 1);
    let task_id = oracle
        .registry
        .submit(&SUBMITTER, TaskType::HttpCall, Bytes::from_static(b"url"))
        .unwrap();

    for caller in [&SUBMITTER, &ADMIN, &oracle.verifiers[0]] {
        let err = oracle
            .registry
            .finalize(caller, &task_id, Bytes::from_static(b"spoofed"))
            .unwrap_err();
        assert_eq!(err, OracleError::Unauthorized("tally"));
    }
    assert_eq!(oracle.registry.task(&task_id).unwrap().state, TaskState::Pending);
}

#[test]
fn resubmission_of_the_same_triple_is_rejected() {
    let oracle = oracle(3, 3);
    let input = Bytes::from_static(b"https://example.com");

    oracle
        .registry
        .submit(&SUBMITTER, TaskType::HttpCall, input.clone())
        .unwrap();
    let err = oracle
        .registry
        .submit(&SUBMITTER, TaskType::HttpCall, input.clone())
        .unwrap_err();
    assert!(matches!(err, OracleError::DuplicateTask(_)));

    // A different submitter with the identical (type, input) gets its own task.
    let other = [0x52u8; 32];
    oracle.registry.add_submitter(&ADMIN, other).unwrap();
    let second = oracle
        .registry
        .submit(&other, TaskType::HttpCall, input)
        .unwrap();
    assert_eq!(oracle.registry.task_count(), 2);
    assert_eq!(oracle.registry.task(&second).unwrap().submitter, other);
}

#[test]
fn dissenting_votes_never_reach_threshold() {
    let oracle = oracle(2, 3);
    let [a, b, c] = [oracle.verifiers[0], oracle.verifiers[1], oracle.verifiers[2]];

    let task_id = oracle
        .registry
        .submit(&SUBMITTER, TaskType::HttpCall, Bytes::from_static(b"url"))
        .unwrap();

    oracle
        .tally
        .vote(&a, &task_id, Bytes::from_static(b"100"), true)
        .unwrap();
    // B disputes the value outright; C proposes different bytes.
    oracle
        .tally
        .vote(&b, &task_id, Bytes::from_static(b"100"), false)
        .unwrap();
    oracle
        .tally
        .vote(&c, &task_id, Bytes::from_static(b"200"), true)
        .unwrap();

    let snap = oracle.tally.tally(&task_id).unwrap();
    assert_eq!(snap.agree_count, 1);
    assert_eq!(snap.vote_count, 3);
    assert!(!snap.sealed);
    assert_eq!(oracle.registry.task(&task_id).unwrap().state, TaskState::Pending);
}

#[test]
fn threshold_one_finalizes_on_the_first_vote() {
    let oracle = oracle(1, 1);
    let task_id = oracle
        .registry
        .submit(&SUBMITTER, TaskType::HttpCall, Bytes::from_static(b"url"))
        .unwrap();

    let sealed = oracle
        .tally
        .vote(&oracle.verifiers[0], &task_id, Bytes::from_static(b"42"), true)
        .unwrap();
    assert!(sealed);

    let task = oracle.registry.task(&task_id).unwrap();
    assert_eq!(task.state, TaskState::Finalized);
    assert_eq!(task.output, Bytes::from_static(b"42"));
}

/// Threshold above the verifier count is a valid-but-stuck configuration:
/// votes accumulate but the task can never seal.
#[test]
fn unreachable_threshold_leaves_tasks_pending() {
    let oracle = oracle(5, 2);
    let task_id = oracle
        .registry
        .submit(&SUBMITTER, TaskType::HttpCall, Bytes::from_static(b"url"))
        .unwrap();

    let output = Bytes::from_static(b"7");
    for v in &oracle.verifiers {
        assert!(!oracle.tally.vote(v, &task_id, output.clone(), true).unwrap());
    }

    let snap = oracle.tally.tally(&task_id).unwrap();
    assert_eq!(snap.agree_count, 2);
    assert!(!snap.sealed);
    assert_eq!(oracle.registry.task(&task_id).unwrap().state, TaskState::Pending);
}
