use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chain_listeners::{RawTransaction, SourceChain};
use ledger_gateway::LedgerGateway;
use metrics::counter;
use payment_normalization::amount::format_minor_units;
use payment_normalization::{normalize, CanonicalPayment, MappingConfig};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::store::ProcessedTxStore;

/// Wait between retry passes over payments whose credit call failed.
const CREDIT_RETRY_INTERVAL: Duration = Duration::from_secs(10);

/// Drives one chain's raw transactions through dedupe, normalization, and
/// ledger crediting.
///
/// One instance runs per chain; instances share only the idempotency store
/// and the gateway. A payment whose credit call fails stays queued in the
/// run loop and is retried until the gateway accepts it: neither the
/// polling cursor nor the websocket feed will redeliver it, so the
/// orchestrator must not drop it.
pub struct RelayOrchestrator {
    chain: SourceChain,
    gateway: Arc<dyn LedgerGateway>,
    store: Arc<ProcessedTxStore>,
    mappings: Arc<MappingConfig>,
    retry_interval: Duration,
}

impl RelayOrchestrator {
    pub fn new(
        chain: SourceChain,
        gateway: Arc<dyn LedgerGateway>,
        store: Arc<ProcessedTxStore>,
        mappings: Arc<MappingConfig>,
    ) -> Self {
        Self {
            chain,
            gateway,
            store,
            mappings,
            retry_interval: CREDIT_RETRY_INTERVAL,
        }
    }

    /// Overrides the delay before failed credits are retried.
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Consumes raw transactions from `events` until cancellation. After the
    /// sending listener hangs up, keeps retrying queued failed credits until
    /// the queue drains.
    pub async fn run(self, mut events: mpsc::Receiver<RawTransaction>, cancel: CancellationToken) {
        info!("{} relay orchestrator started", self.chain);
        let mut pending: VecDeque<CanonicalPayment> = VecDeque::new();
        let mut listener_open = true;
        loop {
            if !listener_open && pending.is_empty() {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                received = events.recv(), if listener_open => match received {
                    Some(raw) => {
                        if let Some(failed) = self.handle_transaction(&raw).await {
                            self.enqueue_retry(&mut pending, failed);
                        }
                    }
                    None => {
                        debug!("{} listener channel closed", self.chain);
                        listener_open = false;
                    }
                },
                _ = tokio::time::sleep(self.retry_interval), if !pending.is_empty() => {
                    self.retry_pending(&mut pending).await;
                }
            }
        }
        if !pending.is_empty() {
            warn!(
                "{} orchestrator stopping with {} uncredited payments still queued",
                self.chain,
                pending.len()
            );
        }
        info!("{} relay orchestrator stopped", self.chain);
    }

    /// Relays one raw transaction end to end: dedupe check first (cheap, by
    /// raw hash), then normalize, credit, and record. Returns the payment
    /// back to the caller when the credit call failed, for requeueing.
    pub async fn handle_transaction(&self, raw: &RawTransaction) -> Option<CanonicalPayment> {
        if let Some(tx_id) = raw.tx_id() {
            if self.store.contains(tx_id) {
                debug!("{} transaction {} already credited, skipping", self.chain, tx_id);
                counter!("relay_duplicates_skipped_total", "chain" => self.chain.name())
                    .increment(1);
                return None;
            }
        }
        let payment = normalize(raw, &self.mappings)?;
        if self.credit_and_record(&payment).await {
            None
        } else {
            Some(payment)
        }
    }

    /// Queues a failed payment unless an attempt for the same transaction is
    /// already waiting (an at-least-once source may redeliver the raw
    /// transaction while its first attempt is still queued).
    fn enqueue_retry(&self, pending: &mut VecDeque<CanonicalPayment>, payment: CanonicalPayment) {
        if pending
            .iter()
            .any(|queued| queued.source_tx_id == payment.source_tx_id)
        {
            return;
        }
        counter!("relay_credits_requeued_total", "chain" => self.chain.name()).increment(1);
        pending.push_back(payment);
    }

    /// One pass over the retry queue, keeping whatever still fails.
    async fn retry_pending(&self, pending: &mut VecDeque<CanonicalPayment>) {
        let mut still_failed = VecDeque::new();
        while let Some(payment) = pending.pop_front() {
            if self.store.contains(&payment.source_tx_id) {
                continue;
            }
            if !self.credit_and_record(&payment).await {
                still_failed.push_back(payment);
            }
        }
        *pending = still_failed;
    }

    /// Returns `true` when the gateway accepted the credit.
    async fn credit_and_record(&self, payment: &CanonicalPayment) -> bool {
        let memo = payment.credit_memo();
        let result = self
            .gateway
            .credit_account(
                &payment.asset_symbol,
                &payment.destination_account,
                payment.amount_minor_units,
                &memo,
            )
            .await;
        match result {
            Ok(receipt) => {
                info!(
                    "credited {} {} to {} for {} tx {} (new balance {}, state root {})",
                    format_minor_units(payment.amount_minor_units),
                    payment.asset_symbol,
                    payment.destination_account,
                    self.chain,
                    payment.source_tx_id,
                    format_minor_units(receipt.new_balance_wei),
                    short_root(&receipt.state_root),
                );
                counter!("relay_credits_total", "chain" => self.chain.name()).increment(1);
                if let Err(e) = self.store.record(&payment.source_tx_id) {
                    // The credit is final; the id stays in memory and the
                    // next successful record rewrites the whole file.
                    error!(
                        "credited {} tx {} but failed to persist its id: {}",
                        self.chain, payment.source_tx_id, e
                    );
                }
                true
            }
            Err(e) => {
                warn!(
                    "credit for {} tx {} failed, queued for retry: {}",
                    self.chain, payment.source_tx_id, e
                );
                false
            }
        }
    }
}

/// First 16 chars of a state root, enough to eyeball in logs.
fn short_root(root: &str) -> &str {
    root.get(..16).unwrap_or(root)
}
