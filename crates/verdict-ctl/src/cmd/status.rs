//! Status and event-log commands.

use anyhow::Result;
use serde::Deserialize;

use super::http::{base_url, get_json};

#[derive(Deserialize)]
struct StatusResponse {
    tasks: usize,
    threshold: u32,
    submitters: usize,
    verifiers: usize,
    tally_linked: bool,
}

pub async fn cmd_status(port: u16) -> Result<()> {
    let resp: StatusResponse = get_json(&format!("{}/status", base_url(port))).await?;

    println!("═══════════════════════════════════════");
    println!("  Verdict Oracle Status");
    println!("═══════════════════════════════════════");
    println!("  Tasks       : {}", resp.tasks);
    println!("  Threshold   : {}", resp.threshold);
    println!("  Submitters  : {}", resp.submitters);
    println!("  Verifiers   : {}", resp.verifiers);
    println!(
        "  Tally link  : {}",
        if resp.tally_linked { "configured" } else { "NOT CONFIGURED" }
    );

    if resp.threshold as usize > resp.verifiers {
        println!();
        println!("  ⚠ threshold exceeds verifier count — tasks cannot seal");
    }

    Ok(())
}

#[derive(Deserialize)]
struct EventListResponse {
    events: Vec<EventJson>,
}

#[derive(Deserialize)]
struct EventJson {
    kind: String,
    submitter: Option<String>,
    verifier: Option<String>,
    agree: Option<bool>,
    sealed: Option<bool>,
}

pub async fn cmd_events(port: u16, task_id: &str) -> Result<()> {
    let resp: EventListResponse =
        get_json(&format!("{}/events/{}", base_url(port), task_id)).await?;

    if resp.events.is_empty() {
        println!("No events for task {}.", task_id);
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  Events for {}", &task_id[..16.min(task_id.len())]);
    println!("═══════════════════════════════════════");

    for event in &resp.events {
        match event.kind.as_str() {
            "task_submitted" => {
                let submitter = event.submitter.as_deref().unwrap_or("?");
                println!("  + submitted by {}", &submitter[..16.min(submitter.len())]);
            }
            "vote_cast" => {
                let verifier = event.verifier.as_deref().unwrap_or("?");
                let mark = if event.agree.unwrap_or(false) { "✓" } else { "✗" };
                let sealed = if event.sealed.unwrap_or(false) { " [sealed]" } else { "" };
                println!("  {} vote by {}{}", mark, &verifier[..16.min(verifier.len())], sealed);
            }
            "task_finalized" => println!("  ■ finalized"),
            other => println!("  ? {}", other),
        }
    }

    Ok(())
}
