use anyhow::{Context, Result};
use colored::*;
use payment_normalization::{ChainMappings, MappingConfig};
use prettytable::{Cell, Row, Table};

use crate::config::RelayConfig;

pub fn show(config: &RelayConfig, json: bool) -> Result<()> {
    let mappings = MappingConfig::from_file(&config.mappings_file)
        .with_context(|| format!("load mappings from {}", config.mappings_file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&mappings)?);
        return Ok(());
    }

    print_chain("stellar", &mappings.stellar);
    print_chain("xrpl", &mappings.xrpl);
    Ok(())
}

fn print_chain(chain: &str, mappings: &ChainMappings) {
    println!(
        "\n{} ({} accounts, {} assets)",
        chain.bold(),
        mappings.accounts.len(),
        mappings.assets.len()
    );
    if mappings.accounts.is_empty() && mappings.assets.is_empty() {
        println!("{}", "  nothing mapped".yellow());
        return;
    }

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Kind").style_spec("Fb"),
        Cell::new("Chain key").style_spec("Fb"),
        Cell::new("Ledger value").style_spec("Fb"),
    ]));

    let mut accounts: Vec<_> = mappings.accounts.iter().collect();
    accounts.sort();
    for (address, ledger_account) in accounts {
        table.add_row(Row::new(vec![
            Cell::new("account"),
            Cell::new(address),
            Cell::new(ledger_account),
        ]));
    }

    let mut assets: Vec<_> = mappings.assets.iter().collect();
    assets.sort();
    for (asset_key, symbol) in assets {
        table.add_row(Row::new(vec![
            Cell::new("asset"),
            Cell::new(asset_key),
            Cell::new(symbol),
        ]));
    }

    table.printstd();
}
