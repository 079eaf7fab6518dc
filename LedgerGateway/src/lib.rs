use async_trait::async_trait;

pub mod client;
pub mod errors;
pub mod mock;
pub mod types;

pub use client::HttpLedgerGateway;
pub use errors::{GatewayError, GatewayResult};
pub use mock::{RecordedCredit, RecordingLedgerGateway};
pub use types::{AuditSnapshot, BalanceEntry, CreditReceipt, HealthInfo};

/// Operations the relay needs from the external ledger service.
///
/// Every call is single-shot with no internal retry. `credit_account` is a
/// mutation that is not safe to retry blindly, so retry policy stays with the
/// caller and its idempotency ledger.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// All asset balances the ledger holds for `account`.
    async fn list_balances(&self, account: &str) -> GatewayResult<Vec<BalanceEntry>>;

    /// Balance of `asset` for `account`. An asset the ledger has never seen
    /// for this account is zero, not an error. Matching is case-insensitive.
    async fn get_balance(&self, asset: &str, account: &str) -> GatewayResult<u128>;

    /// Credits `amount_wei` of `asset` to `account`. Administrative and
    /// idempotency-unaware: the caller must dedupe.
    async fn credit_account(
        &self,
        asset: &str,
        account: &str,
        amount_wei: u128,
        memo: &str,
    ) -> GatewayResult<CreditReceipt>;

    /// Current audit snapshot: state root and chain height.
    async fn get_state_root(&self) -> GatewayResult<AuditSnapshot>;

    /// Service liveness and version probe.
    async fn health(&self) -> GatewayResult<HealthInfo>;
}
