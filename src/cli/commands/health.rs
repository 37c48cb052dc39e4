use anyhow::Context;
use clap::Args;
use serde_json::Value;
use std::time::Duration;

use crate::cli::{
    utils::{output_error, output_success},
    OutputFormat,
};
use crate::config::AppConfig;

#[derive(Debug, Args)]
pub struct HealthArgs {
    #[arg(long, help = "Server base URL (defaults to the configured bind address)")]
    pub url: Option<String>,

    #[arg(long, default_value_t = 5, help = "Request timeout in seconds")]
    pub timeout: u64,
}

pub async fn handle(args: HealthArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let base = args
        .url
        .unwrap_or_else(|| format!("http://127.0.0.1:{}", config.server.port));
    let url = url::Url::parse(&base)
        .and_then(|b| b.join("/health"))
        .with_context(|| format!("invalid server URL '{}'", base))?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()?;

    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            output_error(output_format, &format!("{} unreachable: {}", url, e), Some("UNREACHABLE"))?;
            anyhow::bail!("health check failed");
        }
    };

    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if status.is_success() {
        output_success(output_format, &format!("{} is healthy", base), Some(body))
    } else {
        output_error(output_format, &format!("{} reported {}", base, status), Some("DEGRADED"))?;
        anyhow::bail!("health check failed");
    }
}
