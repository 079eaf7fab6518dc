//! Shared fixtures for the relay integration tests and benchmarks.
//!
//! The builders construct chain records the way the live listeners would,
//! so pipeline tests exercise the same shapes the wire produces.

use chain_listeners::types::{
    RawTransaction, StellarOperationRecord, StellarTransactionRecord, StellarTxEnvelope,
    XrplAmount, XrplIssuedAmount, XrplMemo, XrplMemoEntry, XrplTransaction, XrplTxMessage,
};
use payment_normalization::MappingConfig;

/// Mapping tables used across the integration tests: one tracked address and
/// the native asset mapped per chain.
pub fn sample_mappings() -> MappingConfig {
    serde_json::from_str(
        r#"{
            "stellar": {
                "accounts": {"ADDR1": "acct:treasury:X"},
                "assets": {"native": "XLM", "USDC:GISSUER": "USDC"}
            },
            "xrpl": {
                "accounts": {"rADDR2": "acct:user:alice"},
                "assets": {"XRP": "XRP", "USD": "USD"}
            }
        }"#,
    )
    .expect("static mapping fixture parses")
}

/// A successful Stellar transaction carrying one native payment operation.
pub fn stellar_native_payment(tx_hash: &str, to: &str, amount: &str) -> RawTransaction {
    stellar_payment_with_asset(tx_hash, to, amount, "native", None, None)
}

pub fn stellar_payment_with_asset(
    tx_hash: &str,
    to: &str,
    amount: &str,
    asset_type: &str,
    asset_code: Option<&str>,
    asset_issuer: Option<&str>,
) -> RawTransaction {
    RawTransaction::Stellar(StellarTxEnvelope {
        transaction: StellarTransactionRecord {
            id: Some(tx_hash.to_string()),
            paging_token: Some(format!("{tx_hash}-pt")),
            hash: Some(tx_hash.to_string()),
            successful: Some(true),
            memo: Some("order 42".to_string()),
            memo_type: Some("text".to_string()),
            created_at: Some("2024-03-01T12:00:00Z".to_string()),
        },
        operations: vec![StellarOperationRecord {
            id: Some(format!("{tx_hash}-op1")),
            transaction_hash: Some(tx_hash.to_string()),
            op_type: Some("payment".to_string()),
            asset_type: Some(asset_type.to_string()),
            asset_code: asset_code.map(str::to_string),
            asset_issuer: asset_issuer.map(str::to_string),
            from: Some("GSENDER".to_string()),
            to: Some(to.to_string()),
            amount: Some(amount.to_string()),
        }],
    })
}

/// A validated XRPL payment of `drops` native units.
pub fn xrpl_drops_payment(tx_hash: &str, destination: &str, drops: &str) -> RawTransaction {
    xrpl_message(XrplTransaction {
        transaction_type: Some("Payment".to_string()),
        account: Some("rSENDER".to_string()),
        destination: Some(destination.to_string()),
        amount: Some(XrplAmount::Drops(drops.to_string())),
        hash: Some(tx_hash.to_string()),
        memos: None,
    })
}

/// A validated XRPL issued-currency payment with a hex-encoded memo.
pub fn xrpl_issued_payment(
    tx_hash: &str,
    destination: &str,
    currency: &str,
    value: &str,
    memo_hex: Option<&str>,
) -> RawTransaction {
    xrpl_message(XrplTransaction {
        transaction_type: Some("Payment".to_string()),
        account: Some("rSENDER".to_string()),
        destination: Some(destination.to_string()),
        amount: Some(XrplAmount::Issued(XrplIssuedAmount {
            currency: currency.to_string(),
            issuer: Some("rISSUER".to_string()),
            value: value.to_string(),
        })),
        hash: Some(tx_hash.to_string()),
        memos: memo_hex.map(|data| {
            vec![XrplMemoEntry {
                memo: Some(XrplMemo {
                    memo_type: None,
                    memo_data: Some(data.to_string()),
                    memo_format: None,
                }),
            }]
        }),
    })
}

fn xrpl_message(transaction: XrplTransaction) -> RawTransaction {
    RawTransaction::Xrpl(XrplTxMessage {
        msg_type: Some("transaction".to_string()),
        transaction: Some(transaction),
        validated: Some(true),
        engine_result: Some("tesSUCCESS".to_string()),
    })
}
