use chain_listeners::types::{
    RawTransaction, StellarOperationRecord, StellarTxEnvelope, XrplAmount, XrplTransaction,
    XrplTxMessage,
};
use chain_listeners::SourceChain;
use chrono::Utc;
use metrics::counter;
use tracing::{debug, warn};

use crate::amount;
use crate::mapping::MappingConfig;
use crate::CanonicalPayment;

/// Decimal places of the XRP native unit (drops).
const XRP_DECIMALS: u32 = 6;
/// Asset key used for native XRP in the mapping tables.
const XRP_ASSET_KEY: &str = "XRP";

/// Maps one raw chain transaction to at most one canonical payment.
///
/// Everything that is not an incoming payment to a mapped destination yields
/// `None`: wrong record type, failed transaction, unmapped destination
/// (warned, never retried), or an amount that cannot be represented exactly
/// (warned).
pub fn normalize(raw: &RawTransaction, mappings: &MappingConfig) -> Option<CanonicalPayment> {
    match raw {
        RawTransaction::Stellar(envelope) => normalize_stellar(envelope, mappings),
        RawTransaction::Xrpl(message) => normalize_xrpl(message, mappings),
    }
}

/// The first payment operation to a mapped destination wins; the rest of the
/// envelope is ignored.
fn normalize_stellar(
    envelope: &StellarTxEnvelope,
    mappings: &MappingConfig,
) -> Option<CanonicalPayment> {
    let tx = &envelope.transaction;
    if tx.successful == Some(false) {
        return None;
    }
    let tx_id = tx.hash.as_deref()?;
    let tables = mappings.for_chain(SourceChain::Stellar);

    for op in &envelope.operations {
        if op.op_type.as_deref() != Some("payment") {
            continue;
        }
        let Some(to) = op.to.as_deref() else {
            continue;
        };
        let Some(account) = tables.ledger_account(to) else {
            warn!(
                "stellar payment {} to unmapped destination {} dropped",
                tx_id, to
            );
            counter!("relay_mapping_misses_total", "chain" => SourceChain::Stellar.name())
                .increment(1);
            continue;
        };
        let Some(amount_raw) = op.amount.as_deref() else {
            warn!("stellar payment {} without amount dropped", tx_id);
            return None;
        };
        let amount_minor_units = match amount::decimal_to_minor_units(amount_raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    "stellar payment {} amount {:?} not representable, dropped: {}",
                    tx_id, amount_raw, e
                );
                return None;
            }
        };
        return Some(CanonicalPayment {
            source_chain: SourceChain::Stellar,
            source_tx_id: tx_id.to_string(),
            destination_account: account.to_string(),
            asset_symbol: tables.asset_symbol(&stellar_asset_key(op)),
            amount_minor_units,
            memo: tx.memo.as_deref().unwrap_or("").trim().to_string(),
            observed_at: Utc::now(),
        });
    }
    None
}

fn normalize_xrpl(message: &XrplTxMessage, mappings: &MappingConfig) -> Option<CanonicalPayment> {
    let tx = message.transaction.as_ref()?;
    if tx.transaction_type.as_deref() != Some("Payment") {
        return None;
    }
    let tx_id = tx.hash.as_deref()?;
    let destination = tx.destination.as_deref()?;
    let tables = mappings.for_chain(SourceChain::Xrpl);
    let Some(account) = tables.ledger_account(destination) else {
        warn!(
            "xrpl payment {} to unmapped destination {} dropped",
            tx_id, destination
        );
        counter!("relay_mapping_misses_total", "chain" => SourceChain::Xrpl.name()).increment(1);
        return None;
    };
    let Some(amount) = tx.amount.as_ref() else {
        warn!("xrpl payment {} without amount dropped", tx_id);
        return None;
    };

    let (asset_symbol, amount_minor_units) = match amount {
        XrplAmount::Drops(drops) => {
            let drops_value = match drops.trim().parse::<u128>() {
                Ok(value) => value,
                Err(_) => {
                    warn!("xrpl payment {} drops {:?} unparseable, dropped", tx_id, drops);
                    return None;
                }
            };
            let minor = match amount::native_units_to_minor_units(drops_value, XRP_DECIMALS) {
                Ok(value) => value,
                Err(e) => {
                    warn!("xrpl payment {} amount not representable, dropped: {}", tx_id, e);
                    return None;
                }
            };
            (tables.asset_symbol(XRP_ASSET_KEY), minor)
        }
        XrplAmount::Issued(issued) => {
            let minor = match amount::decimal_to_minor_units(&issued.value) {
                Ok(value) => value,
                Err(e) => {
                    warn!(
                        "xrpl payment {} amount {:?} not representable, dropped: {}",
                        tx_id, issued.value, e
                    );
                    return None;
                }
            };
            (tables.asset_symbol(&issued.currency), minor)
        }
    };

    Some(CanonicalPayment {
        source_chain: SourceChain::Xrpl,
        source_tx_id: tx_id.to_string(),
        destination_account: account.to_string(),
        asset_symbol,
        amount_minor_units,
        memo: decode_xrpl_memo(tx),
        observed_at: Utc::now(),
    })
}

/// Stellar asset key: `"native"` or `"CODE:ISSUER"`.
fn stellar_asset_key(op: &StellarOperationRecord) -> String {
    match op.asset_type.as_deref() {
        None | Some("native") => "native".to_string(),
        _ => format!(
            "{}:{}",
            op.asset_code.as_deref().unwrap_or(""),
            op.asset_issuer.as_deref().unwrap_or("")
        ),
    }
}

/// First memo's `MemoData` blob, hex-decoded to UTF-8. Empty when absent or
/// undecodable.
fn decode_xrpl_memo(tx: &XrplTransaction) -> String {
    let Some(data) = tx
        .memos
        .as_ref()
        .and_then(|memos| memos.first())
        .and_then(|entry| entry.memo.as_ref())
        .and_then(|memo| memo.memo_data.as_deref())
    else {
        return String::new();
    };
    match hex::decode(data)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    {
        Some(text) => text.trim().to_string(),
        None => {
            debug!("xrpl memo data is not utf-8 hex, treating as absent");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_listeners::types::{
        StellarTransactionRecord, XrplIssuedAmount, XrplMemo, XrplMemoEntry,
    };

    fn mappings() -> MappingConfig {
        serde_json::from_str(
            r#"{
                "stellar": {
                    "accounts": {"GDEST": "acct:treasury:X"},
                    "assets": {"native": "XLM", "USDC:GISSUER": "USDC"}
                },
                "xrpl": {
                    "accounts": {"rDest": "acct:user:alice"},
                    "assets": {"XRP": "XRP", "USD": "USD"}
                }
            }"#,
        )
        .unwrap()
    }

    fn stellar_envelope(ops: Vec<StellarOperationRecord>) -> RawTransaction {
        RawTransaction::Stellar(StellarTxEnvelope {
            transaction: StellarTransactionRecord {
                hash: Some("tx123".to_string()),
                successful: Some(true),
                memo: Some(" order 42 ".to_string()),
                ..Default::default()
            },
            operations: ops,
        })
    }

    fn payment_op(to: &str, amount: &str) -> StellarOperationRecord {
        StellarOperationRecord {
            op_type: Some("payment".to_string()),
            asset_type: Some("native".to_string()),
            to: Some(to.to_string()),
            amount: Some(amount.to_string()),
            ..Default::default()
        }
    }

    fn xrpl_message(tx: XrplTransaction) -> RawTransaction {
        RawTransaction::Xrpl(XrplTxMessage {
            msg_type: Some("transaction".to_string()),
            validated: Some(true),
            transaction: Some(tx),
            ..Default::default()
        })
    }

    #[test]
    fn test_stellar_native_payment() {
        let raw = stellar_envelope(vec![payment_op("GDEST", "5")]);
        let payment = normalize(&raw, &mappings()).unwrap();
        assert_eq!(payment.source_chain, SourceChain::Stellar);
        assert_eq!(payment.source_tx_id, "tx123");
        assert_eq!(payment.destination_account, "acct:treasury:X");
        assert_eq!(payment.asset_symbol, "XLM");
        assert_eq!(payment.amount_minor_units, 5_000_000_000_000_000_000);
        assert_eq!(payment.memo, "order 42");
        assert_eq!(payment.credit_memo(), "xlm:tx123");
    }

    #[test]
    fn test_stellar_unmapped_destination_dropped() {
        let raw = stellar_envelope(vec![payment_op("GELSEWHERE", "5")]);
        assert!(normalize(&raw, &mappings()).is_none());
    }

    #[test]
    fn test_stellar_skips_non_payment_ops() {
        let mut create = StellarOperationRecord::default();
        create.op_type = Some("create_account".to_string());
        let raw = stellar_envelope(vec![create, payment_op("GDEST", "2.5")]);
        let payment = normalize(&raw, &mappings()).unwrap();
        assert_eq!(payment.amount_minor_units, 2_500_000_000_000_000_000);
    }

    #[test]
    fn test_stellar_first_qualifying_payment_wins() {
        let raw = stellar_envelope(vec![
            payment_op("GELSEWHERE", "9"),
            payment_op("GDEST", "1"),
            payment_op("GDEST", "7"),
        ]);
        let payment = normalize(&raw, &mappings()).unwrap();
        assert_eq!(payment.amount_minor_units, 1_000_000_000_000_000_000);
    }

    #[test]
    fn test_stellar_failed_transaction_dropped() {
        let raw = RawTransaction::Stellar(StellarTxEnvelope {
            transaction: StellarTransactionRecord {
                hash: Some("tx123".to_string()),
                successful: Some(false),
                ..Default::default()
            },
            operations: vec![payment_op("GDEST", "5")],
        });
        assert!(normalize(&raw, &mappings()).is_none());
    }

    #[test]
    fn test_stellar_unmapped_asset_falls_back_to_raw_key() {
        let mut op = payment_op("GDEST", "3");
        op.asset_type = Some("credit_alphanum4".to_string());
        op.asset_code = Some("EURT".to_string());
        op.asset_issuer = Some("GISSUER2".to_string());
        let raw = stellar_envelope(vec![op]);
        let payment = normalize(&raw, &mappings()).unwrap();
        assert_eq!(payment.asset_symbol, "EURT:GISSUER2");
    }

    #[test]
    fn test_stellar_mapped_issued_asset() {
        let mut op = payment_op("GDEST", "3");
        op.asset_type = Some("credit_alphanum4".to_string());
        op.asset_code = Some("USDC".to_string());
        op.asset_issuer = Some("GISSUER".to_string());
        let raw = stellar_envelope(vec![op]);
        let payment = normalize(&raw, &mappings()).unwrap();
        assert_eq!(payment.asset_symbol, "USDC");
    }

    #[test]
    fn test_stellar_unrepresentable_amount_dropped() {
        let raw = stellar_envelope(vec![payment_op("GDEST", "not-a-number")]);
        assert!(normalize(&raw, &mappings()).is_none());
    }

    #[test]
    fn test_xrpl_drops_payment() {
        let raw = xrpl_message(XrplTransaction {
            transaction_type: Some("Payment".to_string()),
            destination: Some("rDest".to_string()),
            amount: Some(XrplAmount::Drops("5000000".to_string())),
            hash: Some("ABC123".to_string()),
            ..Default::default()
        });
        let payment = normalize(&raw, &mappings()).unwrap();
        assert_eq!(payment.source_chain, SourceChain::Xrpl);
        assert_eq!(payment.destination_account, "acct:user:alice");
        assert_eq!(payment.asset_symbol, "XRP");
        assert_eq!(payment.amount_minor_units, 5_000_000_000_000_000_000);
        assert_eq!(payment.credit_memo(), "xrpl:ABC123");
        assert_eq!(payment.memo, "");
    }

    #[test]
    fn test_xrpl_issued_currency_payment() {
        let raw = xrpl_message(XrplTransaction {
            transaction_type: Some("Payment".to_string()),
            destination: Some("rDest".to_string()),
            amount: Some(XrplAmount::Issued(XrplIssuedAmount {
                currency: "USD".to_string(),
                issuer: Some("rIssuer".to_string()),
                value: "2.5".to_string(),
            })),
            hash: Some("DEF456".to_string()),
            ..Default::default()
        });
        let payment = normalize(&raw, &mappings()).unwrap();
        assert_eq!(payment.asset_symbol, "USD");
        assert_eq!(payment.amount_minor_units, 2_500_000_000_000_000_000);
    }

    #[test]
    fn test_xrpl_unmapped_currency_falls_back() {
        let raw = xrpl_message(XrplTransaction {
            transaction_type: Some("Payment".to_string()),
            destination: Some("rDest".to_string()),
            amount: Some(XrplAmount::Issued(XrplIssuedAmount {
                currency: "534F4C4F00000000000000000000000000000000".to_string(),
                issuer: Some("rIssuer".to_string()),
                value: "1".to_string(),
            })),
            hash: Some("FEED".to_string()),
            ..Default::default()
        });
        let payment = normalize(&raw, &mappings()).unwrap();
        assert_eq!(
            payment.asset_symbol,
            "534F4C4F00000000000000000000000000000000"
        );
    }

    #[test]
    fn test_xrpl_memo_hex_decoded() {
        let raw = xrpl_message(XrplTransaction {
            transaction_type: Some("Payment".to_string()),
            destination: Some("rDest".to_string()),
            amount: Some(XrplAmount::Drops("1".to_string())),
            hash: Some("ABCD".to_string()),
            memos: Some(vec![XrplMemoEntry {
                memo: Some(XrplMemo {
                    memo_data: Some("637573746f6d65724072656c61792e696f".to_string()),
                    ..Default::default()
                }),
            }]),
            ..Default::default()
        });
        let payment = normalize(&raw, &mappings()).unwrap();
        assert_eq!(payment.memo, "customer@relay.io");
    }

    #[test]
    fn test_xrpl_bad_memo_hex_is_empty() {
        let raw = xrpl_message(XrplTransaction {
            transaction_type: Some("Payment".to_string()),
            destination: Some("rDest".to_string()),
            amount: Some(XrplAmount::Drops("1".to_string())),
            hash: Some("ABCD".to_string()),
            memos: Some(vec![XrplMemoEntry {
                memo: Some(XrplMemo {
                    memo_data: Some("zzzz".to_string()),
                    ..Default::default()
                }),
            }]),
            ..Default::default()
        });
        let payment = normalize(&raw, &mappings()).unwrap();
        assert_eq!(payment.memo, "");
    }

    #[test]
    fn test_xrpl_non_payment_ignored() {
        let raw = xrpl_message(XrplTransaction {
            transaction_type: Some("OfferCreate".to_string()),
            destination: Some("rDest".to_string()),
            amount: Some(XrplAmount::Drops("1".to_string())),
            hash: Some("ABCD".to_string()),
            ..Default::default()
        });
        assert!(normalize(&raw, &mappings()).is_none());
    }

    #[test]
    fn test_xrpl_unmapped_destination_dropped() {
        let raw = xrpl_message(XrplTransaction {
            transaction_type: Some("Payment".to_string()),
            destination: Some("rUnknown".to_string()),
            amount: Some(XrplAmount::Drops("1".to_string())),
            hash: Some("ABCD".to_string()),
            ..Default::default()
        });
        assert!(normalize(&raw, &mappings()).is_none());
    }
}
