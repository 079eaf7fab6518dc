use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::{GatewayError, GatewayResult};
use crate::types::{AuditSnapshot, BalanceEntry, CreditReceipt, HealthInfo};
use crate::LedgerGateway;

/// One recorded credit call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCredit {
    pub asset: String,
    pub account: String,
    pub amount_wei: u128,
    pub memo: String,
}

/// In-memory [`LedgerGateway`] for tests: serves configurable balances,
/// applies credits, and records every credit call so tests can assert on
/// call counts and payloads.
pub struct RecordingLedgerGateway {
    // keyed by (account, uppercased asset)
    balances: Mutex<HashMap<(String, String), u128>>,
    credits: Mutex<Vec<RecordedCredit>>,
    attempts: Mutex<usize>,
    fail_credits: Mutex<bool>,
    state_root: Mutex<String>,
}

impl RecordingLedgerGateway {
    pub fn new() -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
            credits: Mutex::new(Vec::new()),
            attempts: Mutex::new(0),
            fail_credits: Mutex::new(false),
            state_root: Mutex::new("feedface00000000feedface00000000".to_string()),
        }
    }

    pub fn set_balance(&self, asset: &str, account: &str, amount_wei: u128) {
        self.balances
            .lock()
            .insert((account.to_string(), asset.to_uppercase()), amount_wei);
    }

    /// Makes subsequent credit calls fail with a transport error until
    /// called again with `false`.
    pub fn fail_credits(&self, fail: bool) {
        *self.fail_credits.lock() = fail;
    }

    /// Successful credit calls only.
    pub fn credit_count(&self) -> usize {
        self.credits.lock().len()
    }

    /// Every credit call, including ones that failed.
    pub fn credit_attempts(&self) -> usize {
        *self.attempts.lock()
    }

    pub fn credits(&self) -> Vec<RecordedCredit> {
        self.credits.lock().clone()
    }

    pub fn last_credit(&self) -> Option<RecordedCredit> {
        self.credits.lock().last().cloned()
    }
}

impl Default for RecordingLedgerGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerGateway for RecordingLedgerGateway {
    async fn list_balances(&self, account: &str) -> GatewayResult<Vec<BalanceEntry>> {
        let balances = self.balances.lock();
        let mut entries: Vec<BalanceEntry> = balances
            .iter()
            .filter(|((acct, _), _)| acct == account)
            .map(|((_, asset), amount)| BalanceEntry {
                asset: asset.clone(),
                balance_wei: *amount,
            })
            .collect();
        entries.sort_by(|a, b| a.asset.cmp(&b.asset));
        Ok(entries)
    }

    async fn get_balance(&self, asset: &str, account: &str) -> GatewayResult<u128> {
        let key = (account.to_string(), asset.to_uppercase());
        Ok(self.balances.lock().get(&key).copied().unwrap_or(0))
    }

    async fn credit_account(
        &self,
        asset: &str,
        account: &str,
        amount_wei: u128,
        memo: &str,
    ) -> GatewayResult<CreditReceipt> {
        *self.attempts.lock() += 1;
        if *self.fail_credits.lock() {
            return Err(GatewayError::Transport(
                "injected credit failure".to_string(),
            ));
        }
        let asset = asset.to_uppercase();
        let new_balance = {
            let mut balances = self.balances.lock();
            let entry = balances
                .entry((account.to_string(), asset.clone()))
                .or_insert(0);
            *entry = entry.saturating_add(amount_wei);
            *entry
        };
        self.credits.lock().push(RecordedCredit {
            asset,
            account: account.to_string(),
            amount_wei,
            memo: memo.to_string(),
        });
        Ok(CreditReceipt {
            success: true,
            new_balance_wei: new_balance,
            state_root: self.state_root.lock().clone(),
        })
    }

    async fn get_state_root(&self) -> GatewayResult<AuditSnapshot> {
        Ok(AuditSnapshot {
            state_root: self.state_root.lock().clone(),
            height: self.credits.lock().len() as u64,
        })
    }

    async fn health(&self) -> GatewayResult<HealthInfo> {
        Ok(HealthInfo {
            service: "recording-ledger-gateway".to_string(),
            version: "dev".to_string(),
            status: "ok".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::block_on;

    #[test]
    fn test_recording_gateway() {
        block_on(async {
            let gateway = RecordingLedgerGateway::new();

            gateway.set_balance("XLM", "acct:user:alice", 1_000);
            assert_eq!(
                gateway.get_balance("xlm", "acct:user:alice").await.unwrap(),
                1_000
            );
            assert_eq!(gateway.get_balance("XRP", "acct:user:alice").await.unwrap(), 0);

            let receipt = gateway
                .credit_account("xlm", "acct:user:alice", 500, "xlm:tx1")
                .await
                .unwrap();
            assert!(receipt.success);
            assert_eq!(receipt.new_balance_wei, 1_500);
            assert_eq!(gateway.credit_count(), 1);
            assert_eq!(gateway.last_credit().unwrap().memo, "xlm:tx1");

            gateway.fail_credits(true);
            let failed = gateway
                .credit_account("xlm", "acct:user:alice", 1, "xlm:tx2")
                .await;
            assert!(failed.is_err());
            assert_eq!(gateway.credit_count(), 1);
            assert_eq!(gateway.credit_attempts(), 2);

            let balances = gateway.list_balances("acct:user:alice").await.unwrap();
            assert_eq!(balances.len(), 1);
            assert_eq!(balances[0].balance_wei, 1_500);
        });
    }
}
