use serde::{Deserialize, Serialize};

/// Chains the relay can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceChain {
    Stellar,
    Xrpl,
}

impl SourceChain {
    pub fn name(&self) -> &'static str {
        match self {
            SourceChain::Stellar => "stellar",
            SourceChain::Xrpl => "xrpl",
        }
    }

    /// Prefix used in ledger credit memos for payments from this chain.
    pub fn memo_prefix(&self) -> &'static str {
        match self {
            SourceChain::Stellar => "xlm",
            SourceChain::Xrpl => "xrpl",
        }
    }
}

impl std::fmt::Display for SourceChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One observed chain transaction, tagged by its source chain.
///
/// Every field a chain may omit is an `Option`; validation happens in the
/// normalizer, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RawTransaction {
    Stellar(StellarTxEnvelope),
    Xrpl(XrplTxMessage),
}

impl RawTransaction {
    pub fn chain(&self) -> SourceChain {
        match self {
            RawTransaction::Stellar(_) => SourceChain::Stellar,
            RawTransaction::Xrpl(_) => SourceChain::Xrpl,
        }
    }

    /// Chain-native transaction hash, when the record carries one.
    pub fn tx_id(&self) -> Option<&str> {
        match self {
            RawTransaction::Stellar(envelope) => envelope.transaction.hash.as_deref(),
            RawTransaction::Xrpl(message) => message
                .transaction
                .as_ref()
                .and_then(|tx| tx.hash.as_deref()),
        }
    }
}

/// A Horizon transaction record together with its operations, fetched in a
/// second request. Operations carry the payment details; the transaction
/// carries the memo and paging token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StellarTxEnvelope {
    pub transaction: StellarTransactionRecord,
    pub operations: Vec<StellarOperationRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StellarTransactionRecord {
    pub id: Option<String>,
    pub paging_token: Option<String>,
    pub hash: Option<String>,
    pub successful: Option<bool>,
    pub memo: Option<String>,
    pub memo_type: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StellarOperationRecord {
    pub id: Option<String>,
    pub transaction_hash: Option<String>,
    #[serde(rename = "type")]
    pub op_type: Option<String>,
    pub asset_type: Option<String>,
    pub asset_code: Option<String>,
    pub asset_issuer: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub amount: Option<String>,
}

/// One message from the XRPL transaction stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XrplTxMessage {
    #[serde(rename = "type")]
    pub msg_type: Option<String>,
    pub transaction: Option<XrplTransaction>,
    pub validated: Option<bool>,
    pub engine_result: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XrplTransaction {
    #[serde(rename = "TransactionType")]
    pub transaction_type: Option<String>,
    #[serde(rename = "Account")]
    pub account: Option<String>,
    #[serde(rename = "Destination")]
    pub destination: Option<String>,
    #[serde(rename = "Amount")]
    pub amount: Option<XrplAmount>,
    pub hash: Option<String>,
    #[serde(rename = "Memos")]
    pub memos: Option<Vec<XrplMemoEntry>>,
}

/// XRPL amounts are either a drops string (native XRP) or an issued-currency
/// object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum XrplAmount {
    Drops(String),
    Issued(XrplIssuedAmount),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XrplIssuedAmount {
    pub currency: String,
    pub issuer: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XrplMemoEntry {
    #[serde(rename = "Memo")]
    pub memo: Option<XrplMemo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XrplMemo {
    #[serde(rename = "MemoType")]
    pub memo_type: Option<String>,
    #[serde(rename = "MemoData")]
    pub memo_data: Option<String>,
    #[serde(rename = "MemoFormat")]
    pub memo_format: Option<String>,
}
