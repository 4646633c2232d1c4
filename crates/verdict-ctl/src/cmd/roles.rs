//! Role and threshold management commands.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::http::{base_url, get_json, post_json_body};

#[derive(Deserialize)]
struct RoleListResponse {
    members: Vec<String>,
}

#[derive(Serialize)]
struct RoleChangeRequest {
    caller: String,
    identity: String,
}

#[derive(Deserialize)]
struct RoleChangeResponse {
    identity: String,
    changed: bool,
}

#[derive(Serialize)]
struct ThresholdSetRequest {
    caller: String,
    threshold: u32,
}

#[derive(Deserialize)]
struct ThresholdResponse {
    threshold: u32,
}

pub async fn cmd_role_list(port: u16, role: &str) -> Result<()> {
    let resp: RoleListResponse = get_json(&format!("{}/{}", base_url(port), role)).await?;

    if resp.members.is_empty() {
        println!("No {} registered.", role);
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  Registered {} ({})", role, resp.members.len());
    println!("═══════════════════════════════════════");
    for member in &resp.members {
        println!("  • {}", member);
    }
    Ok(())
}

pub async fn cmd_role_change(
    port: u16,
    role: &str,
    action: &str,
    admin: &str,
    identity: &str,
) -> Result<()> {
    if !matches!(action, "add" | "remove") {
        bail!("unknown role action '{}'", action);
    }
    let req = RoleChangeRequest {
        caller: admin.to_string(),
        identity: identity.to_string(),
    };

    let resp: RoleChangeResponse =
        post_json_body(&format!("{}/{}/{}", base_url(port), role, action), &req).await?;

    let verb = if action == "add" { "added to" } else { "removed from" };
    if resp.changed {
        println!("✓ {} {} {}", &resp.identity[..16.min(resp.identity.len())], verb, role);
    } else {
        println!("• No change — already in the requested state.");
    }
    Ok(())
}

pub async fn cmd_threshold_get(port: u16) -> Result<()> {
    let resp: ThresholdResponse = get_json(&format!("{}/threshold", base_url(port))).await?;
    println!("Agreement threshold: {}", resp.threshold);
    Ok(())
}

pub async fn cmd_threshold_set(port: u16, admin: &str, value: &str) -> Result<()> {
    let threshold: u32 = value.parse().map_err(|_| anyhow::anyhow!("threshold must be a number"))?;
    let req = ThresholdSetRequest {
        caller: admin.to_string(),
        threshold,
    };

    let resp: ThresholdResponse =
        post_json_body(&format!("{}/threshold", base_url(port)), &req).await?;

    println!("✓ Agreement threshold set to {}", resp.threshold);
    Ok(())
}
