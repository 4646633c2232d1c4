//! verdict-ctl — command-line interface for the Verdict daemon.

use anyhow::{Context, Result};

mod cmd;

const DEFAULT_PORT: u16 = 9420;

fn print_usage() {
    println!("Usage: verdict-ctl [--port <port>] <command>");
    println!();
    println!("Commands:");
    println!("  status                                   Show oracle status");
    println!("  task submit <caller> <type> <input>      Submit a task (type: http_call)");
    println!("  task get <task-id>                       Show a task");
    println!("  task list                                List all tasks");
    println!("  vote <caller> <task-id> <output>         Cast an agreeing vote");
    println!("  vote <caller> <task-id> <output> --disagree");
    println!("  tally <task-id>                          Show a task's tally");
    println!("  votes <task-id>                          List a task's votes");
    println!("  events <task-id>                         Show a task's event log");
    println!("  submitters [list]                        List submitters");
    println!("  submitters add <admin> <identity>        Add a submitter");
    println!("  submitters remove <admin> <identity>     Remove a submitter");
    println!("  verifiers [list|add|remove]              Same, for verifiers");
    println!("  threshold                                Show the agreement threshold");
    println!("  threshold set <admin> <n>                Set the agreement threshold");
    println!();
    println!("Options:");
    println!("  --port <port>   Daemon API port (default: {})", DEFAULT_PORT);
    println!();
    println!("Identities are 32-byte hex strings.");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Parse --port option
    let mut port = DEFAULT_PORT;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--port" {
            i += 1;
            port = args
                .get(i)
                .context("--port requires a value")?
                .parse()
                .context("--port must be a number")?;
        } else {
            remaining.push(&args[i]);
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["status"] | [] => cmd::status::cmd_status(port).await,
        ["task", "submit", caller, task_type, input] => {
            cmd::tasks::cmd_task_submit(port, caller, task_type, input).await
        }
        ["task", "get", id] => cmd::tasks::cmd_task_get(port, id).await,
        ["task", "list"] => cmd::tasks::cmd_task_list(port).await,
        ["vote", caller, id, output] => cmd::tally::cmd_vote(port, caller, id, output, true).await,
        ["vote", caller, id, output, "--disagree"] => {
            cmd::tally::cmd_vote(port, caller, id, output, false).await
        }
        ["tally", id] => cmd::tally::cmd_tally(port, id).await,
        ["votes", id] => cmd::tally::cmd_votes(port, id).await,
        ["events", id] => cmd::status::cmd_events(port, id).await,
        ["submitters"] | ["submitters", "list"] => {
            cmd::roles::cmd_role_list(port, "submitters").await
        }
        ["submitters", "add", admin, id] => {
            cmd::roles::cmd_role_change(port, "submitters", "add", admin, id).await
        }
        ["submitters", "remove", admin, id] => {
            cmd::roles::cmd_role_change(port, "submitters", "remove", admin, id).await
        }
        ["verifiers"] | ["verifiers", "list"] => cmd::roles::cmd_role_list(port, "verifiers").await,
        ["verifiers", "add", admin, id] => {
            cmd::roles::cmd_role_change(port, "verifiers", "add", admin, id).await
        }
        ["verifiers", "remove", admin, id] => {
            cmd::roles::cmd_role_change(port, "verifiers", "remove", admin, id).await
        }
        ["threshold"] => cmd::roles::cmd_threshold_get(port).await,
        ["threshold", "set", admin, value] => {
            cmd::roles::cmd_threshold_set(port, admin, value).await
        }
        ["help"] | ["--help"] | ["-h"] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
