//! Shared HTTP request helpers for CLI commands.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub fn base_url(port: u16) -> String {
    format!("http://127.0.0.1:{}/api", port)
}

pub async fn get_json<T: for<'de> Deserialize<'de>>(url: &str) -> Result<T> {
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("failed to connect to verdictd at {} — is it running?", url))?;
    parse_response(response).await
}

pub async fn post_json_body<T, R>(url: &str, body: &T) -> Result<R>
where
    T: Serialize,
    R: for<'de> Deserialize<'de>,
{
    let response = reqwest::Client::new()
        .post(url)
        .json(body)
        .send()
        .await
        .with_context(|| format!("failed to connect to verdictd at {} — is it running?", url))?;
    parse_response(response).await
}

/// Surface the daemon's rejection text instead of a JSON parse error.
async fn parse_response<R: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<R> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        anyhow::bail!("daemon rejected the request ({}): {}", status, text);
    }
    response.json::<R>().await.context("failed to parse response")
}
