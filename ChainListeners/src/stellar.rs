use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cursor::{CursorStore, CURSOR_NOW};
use crate::errors::{ListenerError, ListenerResult};
use crate::types::{
    RawTransaction, SourceChain, StellarOperationRecord, StellarTransactionRecord,
    StellarTxEnvelope,
};

/// Wait between successful poll cycles.
const POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Longer wait after a transport failure before retrying.
const ERROR_RETRY_INTERVAL: Duration = Duration::from_secs(10);
/// Horizon page size per poll.
const PAGE_LIMIT: u32 = 50;
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct HorizonPage<T> {
    #[serde(rename = "_embedded")]
    embedded: HorizonEmbedded<T>,
}

#[derive(Debug, Deserialize)]
struct HorizonEmbedded<T> {
    records: Vec<T>,
}

/// Thin client for the two Horizon endpoints the relay needs.
pub struct HorizonClient {
    http: reqwest::Client,
    base_url: String,
}

impl HorizonClient {
    pub fn new(base_url: &str) -> ListenerResult<Self> {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ListenerError::InvalidConfig(format!(
                "not an http url: {base_url}"
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ListenerError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Transactions touching `account` after `cursor`, oldest first.
    pub async fn account_transactions(
        &self,
        account: &str,
        cursor: &str,
        limit: u32,
    ) -> ListenerResult<Vec<StellarTransactionRecord>> {
        let url = format!("{}/accounts/{}/transactions", self.base_url, account);
        let limit = limit.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[("cursor", cursor), ("order", "asc"), ("limit", &limit)])
            .send()
            .await
            .map_err(|e| ListenerError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| ListenerError::Transport(e.to_string()))?;
        let page: HorizonPage<StellarTransactionRecord> = response
            .json()
            .await
            .map_err(|e| ListenerError::Decode(e.to_string()))?;
        Ok(page.embedded.records)
    }

    /// Operations belonging to one transaction.
    pub async fn transaction_operations(
        &self,
        tx_hash: &str,
    ) -> ListenerResult<Vec<StellarOperationRecord>> {
        let url = format!("{}/transactions/{}/operations", self.base_url, tx_hash);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ListenerError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| ListenerError::Transport(e.to_string()))?;
        let page: HorizonPage<StellarOperationRecord> = response
            .json()
            .await
            .map_err(|e| ListenerError::Decode(e.to_string()))?;
        Ok(page.embedded.records)
    }
}

/// Polls Horizon for new account transactions and emits each one, with its
/// operations, as a [`RawTransaction`].
///
/// Transport failures are never fatal: the poller keeps its cursor, waits the
/// longer retry interval, and tries again. The cursor is persisted after each
/// cycle that advanced it.
pub struct StellarPoller {
    client: HorizonClient,
    account: String,
    cursors: Arc<CursorStore>,
}

impl StellarPoller {
    pub fn new(
        client: HorizonClient,
        account: &str,
        cursors: Arc<CursorStore>,
    ) -> ListenerResult<Self> {
        if account.trim().is_empty() {
            return Err(ListenerError::InvalidConfig(
                "stellar account must not be empty".to_string(),
            ));
        }
        Ok(Self {
            client,
            account: account.trim().to_string(),
            cursors,
        })
    }

    /// Persisted cursor, or the "now" sentinel on true first run.
    pub fn starting_cursor(&self) -> String {
        self.cursors
            .get(SourceChain::Stellar.name())
            .unwrap_or_else(|| CURSOR_NOW.to_string())
    }

    /// Runs until cancelled or until the event receiver is dropped.
    pub async fn run(self, events: mpsc::Sender<RawTransaction>, cancel: CancellationToken) {
        let chain = SourceChain::Stellar.name();
        let mut cursor = self.starting_cursor();
        info!(
            "stellar poller started for {} at cursor {}",
            self.account, cursor
        );

        loop {
            let before = cursor.clone();
            let outcome = self.poll_once(&mut cursor, &events).await;
            if cursor != before {
                if let Err(e) = self.cursors.set(chain, &cursor) {
                    warn!("failed to persist stellar cursor: {}", e);
                }
            }
            let wait = match outcome {
                Ok(emitted) => {
                    if emitted > 0 {
                        debug!("stellar poll emitted {} transactions", emitted);
                    }
                    POLL_INTERVAL
                }
                Err(ListenerError::ChannelClosed) => break,
                Err(e) => {
                    warn!("stellar poll failed, will retry: {}", e);
                    counter!("relay_transport_errors_total", "chain" => chain).increment(1);
                    ERROR_RETRY_INTERVAL
                }
            };
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }
        info!("stellar poller stopped");
    }

    /// One poll cycle: fetch transactions after `cursor`, fetch each one's
    /// operations, emit, and advance the in-memory cursor per record.
    async fn poll_once(
        &self,
        cursor: &mut String,
        events: &mpsc::Sender<RawTransaction>,
    ) -> ListenerResult<usize> {
        let records = self
            .client
            .account_transactions(&self.account, cursor, PAGE_LIMIT)
            .await?;
        let mut emitted = 0;
        for transaction in records {
            let Some(paging_token) = transaction.paging_token.clone() else {
                debug!("skipping stellar transaction without paging token");
                continue;
            };
            let operations = match transaction.hash.as_deref() {
                Some(hash) => self.client.transaction_operations(hash).await?,
                None => Vec::new(),
            };
            let envelope = RawTransaction::Stellar(StellarTxEnvelope {
                transaction,
                operations,
            });
            if events.send(envelope).await.is_err() {
                return Err(ListenerError::ChannelClosed);
            }
            *cursor = paging_token;
            emitted += 1;
        }
        Ok(emitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn temp_cursors(name: &str) -> Arc<CursorStore> {
        let path = std::env::temp_dir().join(format!(
            "stellar-cursors-{}-{}.json",
            std::process::id(),
            name
        ));
        let _ = std::fs::remove_file(&path);
        Arc::new(CursorStore::load(path).unwrap())
    }

    fn tx_page() -> serde_json::Value {
        json!({
            "_embedded": {
                "records": [{
                    "id": "tx123",
                    "paging_token": "4711-1",
                    "hash": "tx123",
                    "successful": true,
                    "memo": "order 42",
                    "created_at": "2024-03-01T12:00:00Z"
                }]
            }
        })
    }

    fn ops_page() -> serde_json::Value {
        json!({
            "_embedded": {
                "records": [{
                    "id": "op1",
                    "transaction_hash": "tx123",
                    "type": "payment",
                    "asset_type": "native",
                    "from": "GSENDER",
                    "to": "GDEST",
                    "amount": "5.0000000"
                }]
            }
        })
    }

    #[test]
    fn test_rejects_non_http_url() {
        assert!(HorizonClient::new("ftp://horizon").is_err());
    }

    #[test]
    fn test_rejects_empty_account() {
        let client = HorizonClient::new("https://horizon.stellar.org").unwrap();
        assert!(StellarPoller::new(client, "  ", temp_cursors("empty-account")).is_err());
    }

    #[tokio::test]
    async fn test_account_transactions_parses_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/accounts/GDEST/transactions"))
            .and(query_param("cursor", "now"))
            .and(query_param("order", "asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tx_page()))
            .mount(&server)
            .await;

        let client = HorizonClient::new(&server.uri()).unwrap();
        let records = client
            .account_transactions("GDEST", "now", 50)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].hash.as_deref(), Some("tx123"));
        assert_eq!(records[0].paging_token.as_deref(), Some("4711-1"));
    }

    #[tokio::test]
    async fn test_server_error_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = HorizonClient::new(&server.uri()).unwrap();
        let result = client.account_transactions("GDEST", "now", 50).await;
        assert!(matches!(result, Err(ListenerError::Transport(_))));
    }

    #[tokio::test]
    async fn test_poll_once_emits_and_advances_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/accounts/GDEST/transactions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tx_page()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/transactions/tx123/operations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ops_page()))
            .mount(&server)
            .await;

        let client = HorizonClient::new(&server.uri()).unwrap();
        let poller = StellarPoller::new(client, "GDEST", temp_cursors("poll-once")).unwrap();
        let (tx, mut rx) = mpsc::channel(8);

        let mut cursor = CURSOR_NOW.to_string();
        let emitted = poller.poll_once(&mut cursor, &tx).await.unwrap();
        assert_eq!(emitted, 1);
        assert_eq!(cursor, "4711-1");

        let raw = rx.try_recv().unwrap();
        assert_eq!(raw.tx_id(), Some("tx123"));
        match raw {
            RawTransaction::Stellar(envelope) => {
                assert_eq!(envelope.operations.len(), 1);
                assert_eq!(envelope.operations[0].op_type.as_deref(), Some("payment"));
            }
            other => panic!("expected stellar envelope, got {:?}", other),
        }
    }
}
