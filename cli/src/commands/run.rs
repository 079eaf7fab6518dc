use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chain_listeners::{
    CursorStore, HorizonClient, SourceChain, StellarPoller, XrplSubscriber, CURSOR_NOW,
    EVENT_CHANNEL_CAPACITY,
};
use colored::*;
use ledger_gateway::{HttpLedgerGateway, LedgerGateway};
use metrics_exporter_prometheus::PrometheusBuilder;
use payment_normalization::MappingConfig;
use relay_orchestration::{ProcessedTxStore, RelayOrchestrator};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::RelayConfig;

/// Starts every configured listener and its orchestrator, then waits for
/// Ctrl-C. Listener failures are retried internally and never abort the run.
pub async fn start(config: &RelayConfig) -> Result<()> {
    if config.stellar_account.is_none() && config.xrpl_account.is_none() {
        bail!("no chains configured: set STELLAR_ACCOUNT and/or XRPL_ACCOUNT");
    }

    if let Some(addr) = &config.metrics_addr {
        install_metrics_exporter(addr)?;
    }

    std::fs::create_dir_all(&config.state_dir)
        .with_context(|| format!("create state directory {}", config.state_dir.display()))?;

    let mappings = Arc::new(
        MappingConfig::from_file(&config.mappings_file)
            .with_context(|| format!("load mappings from {}", config.mappings_file.display()))?,
    );
    let store = Arc::new(
        ProcessedTxStore::load(config.processed_path())
            .context("load processed transaction store")?,
    );
    let cursors =
        Arc::new(CursorStore::load(config.cursors_path()).context("load cursor store")?);
    let gateway: Arc<dyn LedgerGateway> = Arc::new(
        HttpLedgerGateway::new(&config.gateway_url, &config.operator_token)
            .with_context(|| format!("gateway client for {}", config.gateway_url))?,
    );

    log_startup_summary(config, &store, &cursors);
    match gateway.health().await {
        Ok(info) => info!(
            "ledger gateway {} {} is {}",
            info.service, info.version, info.status
        ),
        Err(e) => warn!("ledger gateway not reachable yet, continuing: {}", e),
    }

    let cancel = CancellationToken::new();
    let mut tasks = Vec::new();

    if let Some(account) = &config.stellar_account {
        let client = HorizonClient::new(&config.horizon_url)?;
        let poller = StellarPoller::new(client, account, cursors.clone())?;
        let relay = RelayOrchestrator::new(
            SourceChain::Stellar,
            gateway.clone(),
            store.clone(),
            mappings.clone(),
        );
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tasks.push(tokio::spawn(poller.run(events_tx, cancel.clone())));
        tasks.push(tokio::spawn(relay.run(events_rx, cancel.clone())));
    }

    if let Some(account) = &config.xrpl_account {
        let subscriber = XrplSubscriber::new(&config.xrpl_ws_url, account)?;
        let relay = RelayOrchestrator::new(
            SourceChain::Xrpl,
            gateway.clone(),
            store.clone(),
            mappings.clone(),
        );
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tasks.push(tokio::spawn(subscriber.run(events_tx, cancel.clone())));
        tasks.push(tokio::spawn(relay.run(events_rx, cancel.clone())));
    }

    println!("{}", "Relay running. Press Ctrl-C to stop.".green());
    tokio::signal::ctrl_c()
        .await
        .context("wait for shutdown signal")?;
    info!("shutdown requested, stopping listeners");
    cancel.cancel();
    for task in tasks {
        if let Err(e) = task.await {
            warn!("relay task ended abnormally: {}", e);
        }
    }
    println!("{}", "Relay stopped.".green());
    Ok(())
}

fn log_startup_summary(config: &RelayConfig, store: &ProcessedTxStore, cursors: &CursorStore) {
    info!("ledger gateway: {}", config.gateway_url);
    match &config.stellar_account {
        Some(account) => info!(
            "stellar: watching {} via {} (cursor {})",
            account,
            config.horizon_url,
            cursors
                .get(SourceChain::Stellar.name())
                .unwrap_or_else(|| CURSOR_NOW.to_string())
        ),
        None => info!("stellar: not configured"),
    }
    match &config.xrpl_account {
        Some(account) => info!("xrpl: watching {} via {}", account, config.xrpl_ws_url),
        None => info!("xrpl: not configured"),
    }
    info!("{} previously credited transactions loaded", store.len());
}

fn install_metrics_exporter(addr: &str) -> Result<()> {
    let addr: std::net::SocketAddr = addr
        .parse()
        .with_context(|| format!("parse metrics address {}", addr))?;
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("install prometheus exporter")?;
    info!("prometheus metrics exposed on {}", addr);
    Ok(())
}
