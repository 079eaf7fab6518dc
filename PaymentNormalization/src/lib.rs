use chain_listeners::SourceChain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod amount;
pub mod mapping;
pub mod normalize;

pub use amount::{AmountError, AmountResult, LEDGER_DECIMALS};
pub use mapping::{ChainMappings, MappingConfig, MappingError};
pub use normalize::normalize;

/// A detected incoming payment in chain-agnostic form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPayment {
    pub source_chain: SourceChain,
    /// Chain-native transaction hash.
    pub source_tx_id: String,
    /// Ledger account to credit.
    pub destination_account: String,
    /// Canonical ledger asset symbol, or the raw chain asset key when the
    /// asset is unmapped.
    pub asset_symbol: String,
    /// Amount in ledger minor units, fixed point at 18 decimal places.
    pub amount_minor_units: u128,
    /// Sender-supplied memo, trimmed, empty when absent.
    pub memo: String,
    pub observed_at: DateTime<Utc>,
}

impl CanonicalPayment {
    /// Memo attached to the ledger credit call: `{chain_prefix}:{tx_hash}`.
    pub fn credit_memo(&self) -> String {
        format!("{}:{}", self.source_chain.memo_prefix(), self.source_tx_id)
    }
}
