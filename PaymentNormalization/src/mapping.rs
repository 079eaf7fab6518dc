use std::collections::HashMap;
use std::path::Path;

use chain_listeners::SourceChain;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MappingError {
    #[error("Failed to read mapping file {path}: {detail}")]
    Read { path: String, detail: String },
    #[error("Invalid mapping file {path}: {detail}")]
    Parse { path: String, detail: String },
}

/// Static lookup tables for one chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainMappings {
    /// Chain address to ledger account id.
    #[serde(default)]
    pub accounts: HashMap<String, String>,
    /// Chain asset key to ledger asset symbol.
    #[serde(default)]
    pub assets: HashMap<String, String>,
}

impl ChainMappings {
    pub fn ledger_account(&self, address: &str) -> Option<&str> {
        self.accounts.get(address).map(String::as_str)
    }

    /// Canonical symbol for `asset_key`, falling back to the raw key when the
    /// asset is not mapped.
    pub fn asset_symbol(&self, asset_key: &str) -> String {
        self.assets
            .get(asset_key)
            .cloned()
            .unwrap_or_else(|| asset_key.to_string())
    }
}

/// Per-chain account and asset mapping tables, loaded once at startup and
/// immutable afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingConfig {
    #[serde(default)]
    pub stellar: ChainMappings,
    #[serde(default)]
    pub xrpl: ChainMappings,
}

impl MappingConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MappingError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| MappingError::Read {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| MappingError::Parse {
            path: path.display().to_string(),
            detail: e.to_string(),
        })
    }

    pub fn for_chain(&self, chain: SourceChain) -> &ChainMappings {
        match chain {
            SourceChain::Stellar => &self.stellar,
            SourceChain::Xrpl => &self.xrpl,
        }
    }
}
