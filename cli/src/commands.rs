use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use ledger_gateway::HttpLedgerGateway;

use crate::config::RelayConfig;

pub mod gateway;
pub mod mappings;
pub mod run;

fn create_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("static spinner template")
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    pb
}

fn connect_gateway(config: &RelayConfig) -> Result<Arc<HttpLedgerGateway>> {
    let client = HttpLedgerGateway::new(&config.gateway_url, &config.operator_token)
        .with_context(|| format!("gateway client for {}", config.gateway_url))?;
    Ok(Arc::new(client))
}
