use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use futures::{SinkExt, StreamExt};
use metrics::counter;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{ListenerError, ListenerResult};
use crate::types::{RawTransaction, SourceChain, XrplTxMessage};

const INITIAL_RECONNECT_INTERVAL: Duration = Duration::from_secs(1);
/// Ceiling for the reconnect backoff.
const MAX_RECONNECT_INTERVAL: Duration = Duration::from_secs(30);

/// Streams validated transactions for one XRPL account over a persistent
/// websocket subscription.
///
/// Connection loss is never fatal: the subscriber reconnects and resubscribes
/// with exponential backoff, resetting the backoff once a subscription is
/// established again. Delivery is at-least-once; the orchestrator dedups.
pub struct XrplSubscriber {
    ws_url: String,
    account: String,
}

impl XrplSubscriber {
    pub fn new(ws_url: &str, account: &str) -> ListenerResult<Self> {
        if !ws_url.starts_with("ws://") && !ws_url.starts_with("wss://") {
            return Err(ListenerError::InvalidConfig(format!(
                "not a websocket url: {ws_url}"
            )));
        }
        if account.trim().is_empty() {
            return Err(ListenerError::InvalidConfig(
                "xrpl account must not be empty".to_string(),
            ));
        }
        Ok(Self {
            ws_url: ws_url.to_string(),
            account: account.trim().to_string(),
        })
    }

    /// Runs until cancelled or until the event receiver is dropped.
    pub async fn run(self, events: mpsc::Sender<RawTransaction>, cancel: CancellationToken) {
        let mut backoff = reconnect_backoff();
        info!(
            "xrpl subscriber started for {} via {}",
            self.account, self.ws_url
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }
            match self.subscribe_and_forward(&events, &cancel, &mut backoff).await {
                Ok(()) => break,
                Err(e) => {
                    warn!("xrpl stream interrupted, reconnecting: {}", e);
                    counter!("relay_transport_errors_total", "chain" => SourceChain::Xrpl.name())
                        .increment(1);
                }
            }
            let delay = backoff.next_backoff().unwrap_or(MAX_RECONNECT_INTERVAL);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        info!("xrpl subscriber stopped");
    }

    /// One websocket session. `Ok` means a clean exit (cancellation or
    /// receiver dropped); `Err` means the connection should be retried.
    async fn subscribe_and_forward(
        &self,
        events: &mpsc::Sender<RawTransaction>,
        cancel: &CancellationToken,
        backoff: &mut ExponentialBackoff,
    ) -> ListenerResult<()> {
        let (stream, _) = connect_async(self.ws_url.as_str())
            .await
            .map_err(|e| ListenerError::Transport(e.to_string()))?;
        let (mut sink, mut stream) = stream.split();

        let subscribe = json!({
            "id": 1,
            "command": "subscribe",
            "accounts": [self.account],
        });
        sink.send(Message::Text(subscribe.to_string()))
            .await
            .map_err(|e| ListenerError::Subscription(e.to_string()))?;
        info!("xrpl subscription established for {}", self.account);
        backoff.reset();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                next = stream.next() => {
                    let message = match next {
                        Some(Ok(message)) => message,
                        Some(Err(e)) => return Err(ListenerError::Transport(e.to_string())),
                        None => return Err(ListenerError::Transport("websocket closed".to_string())),
                    };
                    match message {
                        Message::Text(raw) => {
                            if !self.forward_frame(&raw, events).await? {
                                return Ok(());
                            }
                        }
                        Message::Ping(payload) => {
                            sink.send(Message::Pong(payload))
                                .await
                                .map_err(|e| ListenerError::Transport(e.to_string()))?;
                        }
                        Message::Close(_) => {
                            return Err(ListenerError::Transport(
                                "server closed connection".to_string(),
                            ));
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    /// Parses one text frame and forwards validated transaction messages.
    /// Returns `false` when the event receiver is gone.
    async fn forward_frame(
        &self,
        raw: &str,
        events: &mpsc::Sender<RawTransaction>,
    ) -> ListenerResult<bool> {
        let message: XrplTxMessage = match serde_json::from_str(raw) {
            Ok(message) => message,
            Err(e) => {
                debug!("ignoring unparseable xrpl frame: {}", e);
                return Ok(true);
            }
        };
        if message.msg_type.as_deref() != Some("transaction") {
            return Ok(true);
        }
        if message.validated != Some(true) {
            debug!("ignoring unvalidated xrpl transaction message");
            return Ok(true);
        }
        if events.send(RawTransaction::Xrpl(message)).await.is_err() {
            return Ok(false);
        }
        Ok(true)
    }
}

fn reconnect_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: INITIAL_RECONNECT_INTERVAL,
        max_interval: MAX_RECONNECT_INTERVAL,
        max_elapsed_time: None,
        ..ExponentialBackoff::default()
    }
}
