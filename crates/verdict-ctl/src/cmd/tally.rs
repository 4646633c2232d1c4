//! Vote and tally commands.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::http::{base_url, get_json, post_json_body};

#[derive(Serialize)]
struct VoteRequest {
    caller: String,
    task_id: String,
    proposed_output: String,
    agree: bool,
}

#[derive(Deserialize)]
struct VoteResponse {
    task_id: String,
    sealed: bool,
}

#[derive(Deserialize)]
struct TallyResponse {
    output: String,
    agree_count: u32,
    sealed: bool,
    vote_count: usize,
}

#[derive(Deserialize)]
struct VoteListResponse {
    votes: Vec<VoteJson>,
}

#[derive(Deserialize)]
struct VoteJson {
    verifier: String,
    proposed_output: String,
    agree: bool,
}

pub async fn cmd_vote(port: u16, caller: &str, task_id: &str, output: &str, agree: bool) -> Result<()> {
    let req = VoteRequest {
        caller: caller.to_string(),
        task_id: task_id.to_string(),
        proposed_output: output.to_string(),
        agree,
    };

    let resp: VoteResponse = post_json_body(&format!("{}/votes", base_url(port)), &req).await?;

    let mark = if agree { "✓" } else { "✗" };
    println!("{} Vote recorded on {}", mark, &resp.task_id[..16.min(resp.task_id.len())]);
    if resp.sealed {
        println!("  Threshold reached — task sealed and finalized.");
    }
    Ok(())
}

pub async fn cmd_tally(port: u16, task_id: &str) -> Result<()> {
    let resp: TallyResponse = get_json(&format!("{}/tally/{}", base_url(port), task_id)).await?;

    println!("═══════════════════════════════════════");
    println!("  Tally for {}", &task_id[..16.min(task_id.len())]);
    println!("═══════════════════════════════════════");
    println!("  Leading output : {}", resp.output);
    println!("  Agree count    : {}", resp.agree_count);
    println!("  Votes recorded : {}", resp.vote_count);
    println!("  Sealed         : {}", resp.sealed);

    Ok(())
}

pub async fn cmd_votes(port: u16, task_id: &str) -> Result<()> {
    let resp: VoteListResponse = get_json(&format!("{}/votes/{}", base_url(port), task_id)).await?;

    if resp.votes.is_empty() {
        println!("No votes for task {}.", task_id);
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  Votes ({})", resp.votes.len());
    println!("═══════════════════════════════════════");
    for vote in &resp.votes {
        let mark = if vote.agree { "✓" } else { "✗" };
        println!(
            "  {} {} — {}",
            mark,
            &vote.verifier[..16.min(vote.verifier.len())],
            vote.proposed_output
        );
    }
    Ok(())
}
