use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Result of an administrative credit call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditReceipt {
    pub success: bool,
    #[serde(
        serialize_with = "wei_to_string",
        deserialize_with = "wei_from_string_or_number"
    )]
    pub new_balance_wei: u128,
    #[serde(default)]
    pub state_root: String,
}

/// One asset balance row from the balances endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub asset: String,
    #[serde(
        serialize_with = "wei_to_string",
        deserialize_with = "wei_from_string_or_number"
    )]
    pub balance_wei: u128,
}

/// Read-only audit snapshot of the ledger state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSnapshot {
    pub state_root: String,
    pub height: u64,
}

/// Gateway liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthInfo {
    pub service: String,
    pub version: String,
    pub status: String,
}

/// Wei amounts cross the wire as strings so they survive u64-sized JSON
/// number parsers; some deployments send plain integers, so accept both.
fn wei_from_string_or_number<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(u128::from(value)),
        Raw::Text(text) => text.trim().parse::<u128>().map_err(serde::de::Error::custom),
    }
}

fn wei_to_string<S>(value: &u128, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_entry_accepts_string_and_number() {
        let from_string: BalanceEntry =
            serde_json::from_str(r#"{"asset": "XLM", "balance_wei": "75000000000000000000"}"#)
                .unwrap();
        assert_eq!(from_string.balance_wei, 75_000_000_000_000_000_000);

        let from_number: BalanceEntry =
            serde_json::from_str(r#"{"asset": "XRP", "balance_wei": 42}"#).unwrap();
        assert_eq!(from_number.balance_wei, 42);
    }

    #[test]
    fn test_credit_receipt_round_trips_as_string() {
        let receipt = CreditReceipt {
            success: true,
            new_balance_wei: 340_282_366_920_938_463_463, // past u64::MAX
            state_root: "ab12".to_string(),
        };
        let raw = serde_json::to_string(&receipt).unwrap();
        assert!(raw.contains("\"340282366920938463463\""));
        let back: CreditReceipt = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.new_balance_wei, receipt.new_balance_wei);
    }

    #[test]
    fn test_missing_state_root_defaults_empty() {
        let receipt: CreditReceipt =
            serde_json::from_str(r#"{"success": true, "new_balance_wei": "1"}"#).unwrap();
        assert_eq!(receipt.state_root, "");
    }
}
