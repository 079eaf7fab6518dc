use std::path::PathBuf;

// Defaults
const DEFAULT_GATEWAY_URL: &str = "http://localhost:8089";
const DEFAULT_OPERATOR_TOKEN: &str = "INSECURE_DEV_TOKEN";
const DEFAULT_HORIZON_URL: &str = "https://horizon.stellar.org";
const DEFAULT_XRPL_WS_URL: &str = "wss://s1.ripple.com";
const DEFAULT_STATE_DIR: &str = "./relay-state";
const DEFAULT_MAPPINGS_FILE: &str = "./mappings.json";

/// Runtime configuration, read from the environment. A chain with no tracked
/// account is simply not started.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub gateway_url: String,
    pub operator_token: String,
    pub horizon_url: String,
    pub stellar_account: Option<String>,
    pub xrpl_ws_url: String,
    pub xrpl_account: Option<String>,
    pub state_dir: PathBuf,
    pub mappings_file: PathBuf,
    pub metrics_addr: Option<String>,
}

impl RelayConfig {
    pub fn from_env() -> Self {
        Self {
            gateway_url: env_or("LEDGER_GATEWAY_URL", DEFAULT_GATEWAY_URL),
            operator_token: env_or("LEDGER_OPERATOR_TOKEN", DEFAULT_OPERATOR_TOKEN),
            horizon_url: env_or("STELLAR_HORIZON_URL", DEFAULT_HORIZON_URL),
            stellar_account: env_opt("STELLAR_ACCOUNT"),
            xrpl_ws_url: env_or("XRPL_WEBSOCKET_URL", DEFAULT_XRPL_WS_URL),
            xrpl_account: env_opt("XRPL_ACCOUNT"),
            state_dir: PathBuf::from(env_or("RELAY_STATE_DIR", DEFAULT_STATE_DIR)),
            mappings_file: PathBuf::from(env_or("RELAY_MAPPINGS_FILE", DEFAULT_MAPPINGS_FILE)),
            metrics_addr: env_opt("RELAY_METRICS_ADDR"),
        }
    }

    /// File holding the ids of already-credited transactions.
    pub fn processed_path(&self) -> PathBuf {
        self.state_dir.join("processed_txs.json")
    }

    /// File holding per-chain poll cursors.
    pub fn cursors_path(&self) -> PathBuf {
        self.state_dir.join("cursors.json")
    }
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
