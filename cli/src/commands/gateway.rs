use anyhow::{Context, Result};
use colored::*;
use ledger_gateway::LedgerGateway;
use payment_normalization::amount::format_minor_units;
use prettytable::{Cell, Row, Table};

use crate::config::RelayConfig;

use super::{connect_gateway, create_progress_bar};

pub async fn health(config: &RelayConfig) -> Result<()> {
    let gateway = connect_gateway(config)?;
    let pb = create_progress_bar("Probing ledger gateway...");
    let result = gateway.health().await;
    match result {
        Ok(info) => {
            pb.finish_with_message("Gateway reachable");
            let status = if info.status == "ok" {
                info.status.green()
            } else {
                info.status.yellow()
            };
            println!("{} {} ({})", info.service, info.version, status);
            Ok(())
        }
        Err(e) => {
            pb.finish_with_message("Gateway probe failed");
            Err(e).with_context(|| format!("health probe against {}", config.gateway_url))
        }
    }
}

pub async fn audit(config: &RelayConfig) -> Result<()> {
    let gateway = connect_gateway(config)?;
    let snapshot = gateway
        .get_state_root()
        .await
        .with_context(|| format!("audit snapshot from {}", config.gateway_url))?;

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Field").style_spec("Fb"),
        Cell::new("Value").style_spec("Fb"),
    ]));
    table.add_row(Row::new(vec![
        Cell::new("State root"),
        Cell::new(&snapshot.state_root),
    ]));
    table.add_row(Row::new(vec![
        Cell::new("Height"),
        Cell::new(&snapshot.height.to_string()),
    ]));
    table.printstd();
    Ok(())
}

pub async fn balance(config: &RelayConfig, account: &str, asset: Option<&str>) -> Result<()> {
    let gateway = connect_gateway(config)?;
    let pb = create_progress_bar("Fetching balances...");

    if let Some(asset) = asset {
        let balance = gateway.get_balance(asset, account).await;
        pb.finish_and_clear();
        let balance = balance.with_context(|| format!("balance of {} for {}", asset, account))?;
        println!(
            "{}: {} {} ({} wei)",
            account,
            format_minor_units(balance).green(),
            asset.to_uppercase(),
            balance
        );
        return Ok(());
    }

    let balances = gateway.list_balances(account).await;
    pb.finish_and_clear();
    let balances = balances.with_context(|| format!("balances for {}", account))?;
    if balances.is_empty() {
        println!("{}", format!("No balances held for {}", account).yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Asset").style_spec("Fb"),
        Cell::new("Balance").style_spec("Fb"),
        Cell::new("Wei").style_spec("Fb"),
    ]));
    for entry in &balances {
        table.add_row(Row::new(vec![
            Cell::new(&entry.asset),
            Cell::new(&format_minor_units(entry.balance_wei)),
            Cell::new(&entry.balance_wei.to_string()),
        ]));
    }
    table.printstd();
    Ok(())
}
