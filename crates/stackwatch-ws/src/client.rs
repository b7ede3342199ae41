//! WebSocket JSON-RPC client with auto-reconnect and subscription management.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time;
use tokio_tungstenite::tungstenite::Message;

use stackwatch_core::error::TransportError;
use stackwatch_core::policy::{RetryConfig, RetryPolicy};
use stackwatch_core::request::{JsonRpcRequest, JsonRpcResponse};
use stackwatch_core::transport::RpcTransport;

use crate::subscriptions::{SubscriptionId, SubscriptionManager};

type ResponseSender = oneshot::Sender<Result<JsonRpcResponse, TransportError>>;
type SubscribeSender = oneshot::Sender<Result<(), TransportError>>;

/// Configuration for the WebSocket client.
#[derive(Debug, Clone)]
pub struct WsClientConfig {
    /// Reconnect backoff starting duration.
    pub reconnect_initial: Duration,
    /// Maximum reconnect backoff.
    pub reconnect_max: Duration,
}

impl Default for WsClientConfig {
    fn default() -> Self {
        Self {
            reconnect_initial: Duration::from_millis(500),
            reconnect_max: Duration::from_secs(60),
        }
    }
}

impl WsClientConfig {
    fn reconnect_policy(&self) -> RetryPolicy {
        RetryPolicy::new(RetryConfig::unbounded(
            self.reconnect_initial,
            self.reconnect_max,
        ))
    }
}

/// Command sent from callers to the background WS task.
enum WsCommand {
    Send {
        req: JsonRpcRequest,
        tx: ResponseSender,
    },
    Subscribe {
        id: SubscriptionId,
        req: JsonRpcRequest,
        tx: SubscribeSender,
    },
}

/// What an in-flight request id is waiting for.
enum Pending {
    Call(ResponseSender),
    /// `tx` is `None` for re-subscriptions issued by the task itself.
    Subscribe {
        id: SubscriptionId,
        tx: Option<SubscribeSender>,
    },
}

/// An active `eth_subscribe` stream.
pub struct Subscription {
    pub id: SubscriptionId,
    pub rx: mpsc::UnboundedReceiver<Value>,
}

/// WebSocket JSON-RPC client.
///
/// A background task owns the connection, reconnects with backoff and
/// re-creates every live subscription on the new connection. Requests sent
/// while disconnected wait in the command queue until the link is back.
pub struct WsRpcClient {
    url: String,
    cmd_tx: mpsc::UnboundedSender<WsCommand>,
    shutdown_tx: watch::Sender<bool>,
    subscriptions: SubscriptionManager,
    next_id: Arc<AtomicU64>,
}

impl WsRpcClient {
    /// Start the background task for `url`. The connection is established
    /// lazily by the task; this never fails on an unreachable node.
    pub fn connect(url: impl Into<String>, config: WsClientConfig) -> Self {
        let url = url.into();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<WsCommand>();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let subscriptions = SubscriptionManager::new();
        let next_id = Arc::new(AtomicU64::new(1));

        let task = WsTask {
            url: url.clone(),
            cmd_rx,
            shutdown_rx,
            subscriptions: subscriptions.clone(),
            next_id: next_id.clone(),
            pending: HashMap::new(),
            reconnect: config.reconnect_policy(),
        };
        tokio::spawn(task.run());

        Self {
            url,
            cmd_tx,
            shutdown_tx,
            subscriptions,
            next_id,
        }
    }

    /// Allocate a request id unique on this connection.
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Subscribe to an event stream (`kind` is e.g. `"newHeads"`).
    ///
    /// The subscription is bound inside the connection task before any later
    /// frame is read, so no notification between the `eth_subscribe` reply and
    /// the return of this call is lost.
    pub async fn subscribe(
        &self,
        kind: &str,
        params: Vec<Value>,
    ) -> Result<Subscription, TransportError> {
        let id = SubscriptionId(self.next_id());
        let rx = self
            .subscriptions
            .register(id, kind.to_string(), params.clone());
        let req = subscribe_request(self.next_id(), kind, params);

        let (tx, done) = oneshot::channel();
        if self
            .cmd_tx
            .send(WsCommand::Subscribe { id, req, tx })
            .is_err()
        {
            self.subscriptions.remove(id);
            return Err(TransportError::Closed);
        }
        match done.await {
            Ok(Ok(())) => Ok(Subscription { id, rx }),
            Ok(Err(e)) => {
                self.subscriptions.remove(id);
                Err(e)
            }
            Err(_) => {
                self.subscriptions.remove(id);
                Err(TransportError::Closed)
            }
        }
    }

    /// Release a subscription.
    ///
    /// Local delivery stops before this returns; the `eth_unsubscribe` sent to
    /// the node afterwards is best effort.
    pub async fn unsubscribe(&self, id: SubscriptionId) {
        let Some(server_id) = self.subscriptions.remove(id) else {
            return;
        };
        let result: Result<bool, _> = self
            .call(
                self.next_id(),
                "eth_unsubscribe",
                vec![Value::String(server_id.clone())],
            )
            .await;
        match result {
            Ok(_) => tracing::debug!(url = %self.url, %id, server_id, "unsubscribed"),
            Err(e) => tracing::debug!(url = %self.url, %id, error = %e, "eth_unsubscribe failed"),
        }
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

impl Drop for WsRpcClient {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

#[async_trait]
impl RpcTransport for WsRpcClient {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(WsCommand::Send { req, tx })
            .map_err(|_| TransportError::Closed)?;
        rx.await.map_err(|_| TransportError::Closed)?
    }

    fn url(&self) -> &str {
        &self.url
    }
}

fn subscribe_request(id: u64, kind: &str, params: Vec<Value>) -> JsonRpcRequest {
    JsonRpcRequest::new(
        id,
        "eth_subscribe",
        std::iter::once(Value::String(kind.to_string()))
            .chain(params)
            .collect(),
    )
}

/// Why the dispatch loop ended.
enum Exit {
    Shutdown,
    Disconnected,
}

/// Background task that owns the WebSocket connection.
struct WsTask {
    url: String,
    cmd_rx: mpsc::UnboundedReceiver<WsCommand>,
    shutdown_rx: watch::Receiver<bool>,
    subscriptions: SubscriptionManager,
    next_id: Arc<AtomicU64>,
    pending: HashMap<u64, Pending>,
    reconnect: RetryPolicy,
}

impl WsTask {
    async fn run(mut self) {
        let mut attempt = 0u32;

        loop {
            tracing::info!(url = %self.url, "connecting via WebSocket");

            match tokio_tungstenite::connect_async(self.url.as_str()).await {
                Err(e) => {
                    attempt += 1;
                    tracing::warn!(url = %self.url, error = %e, attempt, "WS connect failed");
                }
                Ok((ws_stream, _)) => {
                    attempt = 0;
                    let (mut sink, mut stream) = ws_stream.split();

                    let mut exit = Exit::Disconnected;
                    if self.resubscribe_all(&mut sink).await {
                        exit = self.dispatch(&mut sink, &mut stream).await;
                    }

                    self.fail_pending();
                    self.subscriptions.unbind_all();
                    if matches!(exit, Exit::Shutdown) {
                        let _ = sink.close().await;
                        return;
                    }
                    attempt += 1;
                    tracing::warn!(url = %self.url, "WS disconnected");
                }
            }

            let backoff = self.reconnect.backoff(attempt);
            tokio::select! {
                _ = time::sleep(backoff) => {}
                _ = self.shutdown_rx.changed() => return,
            }
            if *self.shutdown_rx.borrow() {
                return;
            }
        }
    }

    /// Re-create every registered subscription on a fresh connection.
    async fn resubscribe_all<S>(&mut self, sink: &mut S) -> bool
    where
        S: Sink<Message> + Unpin,
    {
        for (id, kind, params) in self.subscriptions.active_subscriptions() {
            let req_id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let req = subscribe_request(req_id, &kind, params);
            self.pending.insert(req_id, Pending::Subscribe { id, tx: None });
            if !send_json(sink, &req).await {
                return false;
            }
            tracing::debug!(url = %self.url, %id, kind, "re-subscribing");
        }
        true
    }

    async fn dispatch<S, R>(&mut self, sink: &mut S, stream: &mut R) -> Exit
    where
        S: Sink<Message> + Unpin,
        R: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
    {
        loop {
            tokio::select! {
                _ = self.shutdown_rx.changed() => return Exit::Shutdown,
                cmd = self.cmd_rx.recv() => {
                    let Some(cmd) = cmd else { return Exit::Shutdown };
                    let (req, pending) = match cmd {
                        WsCommand::Send { req, tx } => (req, Pending::Call(tx)),
                        WsCommand::Subscribe { id, req, tx } => {
                            (req, Pending::Subscribe { id, tx: Some(tx) })
                        }
                    };
                    let Some(req_id) = req.id.as_number() else {
                        fail(pending, TransportError::Other("non-numeric request id".into()));
                        continue;
                    };
                    self.pending.insert(req_id, pending);
                    if !send_json(sink, &req).await {
                        return Exit::Disconnected;
                    }
                }
                msg = stream.next() => {
                    match msg {
                        None | Some(Ok(Message::Close(_))) => return Exit::Disconnected,
                        Some(Err(e)) => {
                            tracing::warn!(url = %self.url, error = %e, "WS receive error");
                            return Exit::Disconnected;
                        }
                        Some(Ok(Message::Text(text))) => self.handle_message(&text),
                        Some(Ok(_)) => {}
                    }
                }
            }
        }
    }

    fn handle_message(&mut self, text: &str) {
        let Ok(val) = serde_json::from_str::<Value>(text) else {
            tracing::debug!(url = %self.url, "failed to parse WS message as JSON");
            return;
        };

        if val.get("method").and_then(Value::as_str) == Some("eth_subscription") {
            let params = &val["params"];
            if let Some(server_id) = params["subscription"].as_str() {
                self.subscriptions
                    .dispatch(server_id, params["result"].clone());
            }
            return;
        }

        let Ok(resp) = serde_json::from_value::<JsonRpcResponse>(val) else {
            tracing::debug!(url = %self.url, "unrecognised WS frame");
            return;
        };
        let Some(req_id) = resp.id.as_number() else {
            return;
        };
        match self.pending.remove(&req_id) {
            Some(Pending::Call(tx)) => {
                let _ = tx.send(Ok(resp));
            }
            Some(Pending::Subscribe { id, tx }) => self.complete_subscribe(id, tx, resp),
            None => tracing::trace!(url = %self.url, req_id, "response for unknown request"),
        }
    }

    fn complete_subscribe(
        &self,
        id: SubscriptionId,
        tx: Option<SubscribeSender>,
        resp: JsonRpcResponse,
    ) {
        let outcome = match resp.into_result() {
            Ok(Value::String(server_id)) => {
                if self.subscriptions.bind(id, server_id) {
                    Ok(())
                } else {
                    // Unsubscribed while the request was in flight.
                    Err(TransportError::Closed)
                }
            }
            Ok(other) => Err(TransportError::Other(format!(
                "eth_subscribe returned non-string id: {other}"
            ))),
            Err(e) => Err(TransportError::Rpc(e)),
        };
        match (tx, outcome) {
            (Some(tx), outcome) => {
                let _ = tx.send(outcome);
            }
            (None, Err(e)) => {
                tracing::warn!(url = %self.url, %id, error = %e, "re-subscribe failed");
            }
            (None, Ok(())) => {}
        }
    }

    /// Fail everything still waiting on the dropped connection.
    fn fail_pending(&mut self) {
        for (_, pending) in self.pending.drain() {
            fail(pending, TransportError::WebSocket("connection lost".into()));
        }
    }
}

fn fail(pending: Pending, err: TransportError) {
    match pending {
        Pending::Call(tx) => {
            let _ = tx.send(Err(err));
        }
        Pending::Subscribe { tx: Some(tx), .. } => {
            let _ = tx.send(Err(err));
        }
        Pending::Subscribe { tx: None, .. } => {}
    }
}

async fn send_json<S>(sink: &mut S, req: &JsonRpcRequest) -> bool
where
    S: Sink<Message> + Unpin,
{
    match serde_json::to_string(req) {
        Ok(msg) => sink.send(Message::Text(msg)).await.is_ok(),
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_request_prepends_kind() {
        let req = subscribe_request(4, "newHeads", vec![]);
        assert_eq!(req.method, "eth_subscribe");
        assert_eq!(req.params, vec![Value::String("newHeads".into())]);
        assert_eq!(req.id.as_number(), Some(4));
    }

    #[test]
    fn reconnect_backoff_is_capped() {
        let cfg = WsClientConfig {
            reconnect_initial: Duration::from_millis(500),
            reconnect_max: Duration::from_secs(4),
        };
        let policy = cfg.reconnect_policy();
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_secs(1));
        assert_eq!(policy.backoff(10), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn unsubscribe_unknown_id_is_a_no_op() {
        let client = WsRpcClient::connect("ws://127.0.0.1:9", WsClientConfig::default());
        client.unsubscribe(SubscriptionId(42)).await;
        assert_eq!(client.subscription_count(), 0);
    }
}
