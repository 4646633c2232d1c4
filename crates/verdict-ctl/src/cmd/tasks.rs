//! Task commands — submit and read tasks.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::http::{base_url, get_json, post_json_body};

#[derive(Serialize)]
struct TaskSubmitRequest {
    caller: String,
    task_type: String,
    input: String,
}

#[derive(Deserialize)]
struct TaskSubmitResponse {
    task_id: String,
}

#[derive(Deserialize)]
struct TaskJson {
    task_id: String,
    submitter: String,
    task_type: String,
    input: String,
    output: String,
    state: String,
}

#[derive(Deserialize)]
struct TaskListResponse {
    tasks: Vec<TaskJson>,
}

pub async fn cmd_task_submit(port: u16, caller: &str, task_type: &str, input: &str) -> Result<()> {
    // The API takes the serde rendering of TaskType.
    if !matches!(task_type, "http_call" | "none") {
        bail!("unknown task type '{}' (expected: http_call)", task_type);
    }
    let req = TaskSubmitRequest {
        caller: caller.to_string(),
        task_type: task_type.to_string(),
        input: input.to_string(),
    };

    let resp: TaskSubmitResponse = post_json_body(&format!("{}/tasks", base_url(port)), &req).await?;

    println!("✓ Task submitted: {}", resp.task_id);
    Ok(())
}

pub async fn cmd_task_get(port: u16, task_id: &str) -> Result<()> {
    let task: TaskJson = get_json(&format!("{}/tasks/{}", base_url(port), task_id)).await?;
    print_task(&task);
    Ok(())
}

pub async fn cmd_task_list(port: u16) -> Result<()> {
    let resp: TaskListResponse = get_json(&format!("{}/tasks", base_url(port))).await?;

    if resp.tasks.is_empty() {
        println!("No tasks submitted yet.");
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  Tasks ({})", resp.tasks.len());
    println!("═══════════════════════════════════════");
    for task in &resp.tasks {
        print_task(task);
    }
    Ok(())
}

fn print_task(task: &TaskJson) {
    println!("  ┌─ {}", &task.task_id[..16.min(task.task_id.len())]);
    println!("  │  submitter : {}", &task.submitter[..16.min(task.submitter.len())]);
    println!("  │  type      : {}", task.task_type);
    println!("  │  input     : {}", task.input);
    if task.output.is_empty() {
        println!("  └─ state     : {}", task.state);
    } else {
        println!("  │  output    : {}", task.output);
        println!("  └─ state     : {}", task.state);
    }
}
