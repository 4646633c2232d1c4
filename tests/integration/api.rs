//! Full JSON API flow against an in-process server on an ephemeral port.

use crate::*;
use serde_json::{json, Value};
use verdict_api::ApiState;

/// Bind the API on an ephemeral localhost port, returning its base URL.
async fn start_api(oracle: &Oracle) -> String {
    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    let state = ApiState {
        registry: oracle.registry.clone(),
        tally: oracle.tally.clone(),
        events: oracle.events.clone(),
        shutdown_tx,
    };
    let app = verdict_api::router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api", addr)
}

async fn post(client: &reqwest::Client, url: &str, body: Value) -> (u16, Value) {
    let response = client.post(url).json(&body).send().await.unwrap();
    let status = response.status().as_u16();
    let text = response.text().await.unwrap();
    (status, serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

async fn get(client: &reqwest::Client, url: &str) -> (u16, Value) {
    let response = client.get(url).send().await.unwrap();
    let status = response.status().as_u16();
    let text = response.text().await.unwrap();
    (status, serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

#[tokio::test]
async fn submit_vote_finalize_over_http() {
    let oracle = oracle(2, 2);
    let base = start_api(&oracle).await;
    let client = reqwest::Client::new();

    // Fresh oracle status.
    let (status, body) = get(&client, &format!("{base}/status")).await;
    assert_eq!(status, 200);
    assert_eq!(body["tasks"], 0);
    assert_eq!(body["threshold"], 2);
    assert_eq!(body["tally_linked"], true);

    // A non-submitter is turned away.
    let (status, _) = post(
        &client,
        &format!("{base}/tasks"),
        json!({
            "caller": hex::encode([0x99u8; 32]),
            "task_type": "http_call",
            "input": "https://example.com/price",
        }),
    )
    .await;
    assert_eq!(status, 403);

    // Submit.
    let (status, body) = post(
        &client,
        &format!("{base}/tasks"),
        json!({
            "caller": hex::encode(SUBMITTER),
            "task_type": "http_call",
            "input": "https://example.com/price",
        }),
    )
    .await;
    assert_eq!(status, 200);
    let task_id = body["task_id"].as_str().unwrap().to_string();

    // Resubmission conflicts.
    let (status, _) = post(
        &client,
        &format!("{base}/tasks"),
        json!({
            "caller": hex::encode(SUBMITTER),
            "task_type": "http_call",
            "input": "https://example.com/price",
        }),
    )
    .await;
    assert_eq!(status, 409);

    // Pending task reads back unchanged.
    let (status, body) = get(&client, &format!("{base}/tasks/{task_id}")).await;
    assert_eq!(status, 200);
    assert_eq!(body["state"], "Pending");
    assert_eq!(body["input"], "https://example.com/price");
    assert_eq!(body["output"], "");

    // First vote.
    let (status, body) = post(
        &client,
        &format!("{base}/votes"),
        json!({
            "caller": hex::encode(oracle.verifiers[0]),
            "task_id": task_id,
            "proposed_output": "478113417292",
            "agree": true,
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["sealed"], false);

    // Double vote conflicts.
    let (status, _) = post(
        &client,
        &format!("{base}/votes"),
        json!({
            "caller": hex::encode(oracle.verifiers[0]),
            "task_id": task_id,
            "proposed_output": "478113417292",
            "agree": true,
        }),
    )
    .await;
    assert_eq!(status, 409);

    // Confirming vote reaches threshold and seals.
    let (status, body) = post(
        &client,
        &format!("{base}/votes"),
        json!({
            "caller": hex::encode(oracle.verifiers[1]),
            "task_id": task_id,
            "proposed_output": "478113417292",
            "agree": true,
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["sealed"], true);

    // Task is finalized with the agreed output.
    let (status, body) = get(&client, &format!("{base}/tasks/{task_id}")).await;
    assert_eq!(status, 200);
    assert_eq!(body["state"], "Finalized");
    assert_eq!(body["output"], "478113417292");

    // Tally view matches.
    let (status, body) = get(&client, &format!("{base}/tally/{task_id}")).await;
    assert_eq!(status, 200);
    assert_eq!(body["agree_count"], 2);
    assert_eq!(body["sealed"], true);

    // Event log: submitted, vote, vote(sealed), finalized.
    let (status, body) = get(&client, &format!("{base}/events/{task_id}")).await;
    assert_eq!(status, 200);
    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 4);
    assert_eq!(events[0]["kind"], "task_submitted");
    assert_eq!(events[2]["sealed"], true);
    assert_eq!(events[3]["kind"], "task_finalized");

    // Late vote on the sealed task.
    let (status, _) = post(
        &client,
        &format!("{base}/votes"),
        json!({
            "caller": hex::encode(oracle.verifiers[1]),
            "task_id": task_id,
            "proposed_output": "478113417292",
            "agree": true,
        }),
    )
    .await;
    assert_eq!(status, 409);
}

#[tokio::test]
async fn unknown_ids_and_bad_input_are_rejected() {
    let oracle = oracle(1, 1);
    let base = start_api(&oracle).await;
    let client = reqwest::Client::new();

    let (status, _) = get(&client, &format!("{base}/tasks/{}", "00".repeat(32))).await;
    assert_eq!(status, 404);

    let (status, _) = get(&client, &format!("{base}/tasks/nothex")).await;
    assert_eq!(status, 400);

    let (status, _) = post(
        &client,
        &format!("{base}/votes"),
        json!({
            "caller": hex::encode(oracle.verifiers[0]),
            "task_id": "00".repeat(32),
            "proposed_output": "1",
            "agree": true,
        }),
    )
    .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn admin_surface_over_http() {
    let oracle = oracle(1, 1);
    let base = start_api(&oracle).await;
    let client = reqwest::Client::new();
    let newcomer = hex::encode([0x61u8; 32]);

    // Only the admin may change role sets.
    let (status, _) = post(
        &client,
        &format!("{base}/submitters/add"),
        json!({ "caller": hex::encode([0x99u8; 32]), "identity": newcomer }),
    )
    .await;
    assert_eq!(status, 403);

    // Admin adds; the second add is an idempotent no-op.
    let (status, body) = post(
        &client,
        &format!("{base}/submitters/add"),
        json!({ "caller": hex::encode(ADMIN), "identity": newcomer }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["changed"], true);
    let (_, body) = post(
        &client,
        &format!("{base}/submitters/add"),
        json!({ "caller": hex::encode(ADMIN), "identity": newcomer }),
    )
    .await;
    assert_eq!(body["changed"], false);

    let (_, body) = get(&client, &format!("{base}/submitters")).await;
    let members = body["members"].as_array().unwrap();
    assert!(members.iter().any(|m| m == &Value::String(newcomer.clone())));

    // Threshold: admin-gated, zero rejected.
    let (status, _) = post(
        &client,
        &format!("{base}/threshold"),
        json!({ "caller": hex::encode(oracle.verifiers[0]), "threshold": 2 }),
    )
    .await;
    assert_eq!(status, 403);
    let (status, _) = post(
        &client,
        &format!("{base}/threshold"),
        json!({ "caller": hex::encode(ADMIN), "threshold": 0 }),
    )
    .await;
    assert_eq!(status, 400);
    let (status, body) = post(
        &client,
        &format!("{base}/threshold"),
        json!({ "caller": hex::encode(ADMIN), "threshold": 2 }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["threshold"], 2);
    let (_, body) = get(&client, &format!("{base}/threshold")).await;
    assert_eq!(body["threshold"], 2);
}
