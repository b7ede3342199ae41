//! `BlockSource`: where head notifications come from.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;
use stackwatch_core::RpcTransport;
use stackwatch_ws::WsRpcClient;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::block::{head_number, BlockNotification};
use crate::error::LiveError;

/// A stream of accepted-or-not blocks from one node. Dropping it releases the
/// underlying subscription.
pub type BlockStream = Pin<Box<dyn Stream<Item = Result<BlockNotification, LiveError>> + Send>>;

#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Endpoint this source reads from.
    fn url(&self) -> &str;

    /// Subscribe and start streaming blocks.
    async fn subscribe(&self) -> Result<BlockStream, LiveError>;
}

/// [`BlockSource`] over a `newHeads` subscription.
///
/// Heads only carry the header, so each one is followed by an
/// `eth_getBlockByNumber(n, true)` to learn its transactions. The stream starts
/// with a snapshot of the `latest` block so a quiet chain still shows state.
pub struct WsBlockSource {
    client: Arc<WsRpcClient>,
    buffer: usize,
}

impl WsBlockSource {
    pub fn new(client: Arc<WsRpcClient>) -> Self {
        Self {
            client,
            buffer: 64,
        }
    }

    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }
}

#[async_trait]
impl BlockSource for WsBlockSource {
    fn url(&self) -> &str {
        self.client.url()
    }

    async fn subscribe(&self) -> Result<BlockStream, LiveError> {
        let mut sub = self.client.subscribe("newHeads", vec![]).await?;
        let (tx, rx) = mpsc::channel(self.buffer);
        let client = Arc::clone(&self.client);

        tokio::spawn(async move {
            if tx.send(fetch_block(&client, "latest".into()).await).await.is_err() {
                client.unsubscribe(sub.id).await;
                return;
            }

            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    head = sub.rx.recv() => {
                        let Some(head) = head else { break };
                        let item = match head_number(&head) {
                            Ok(n) => fetch_block(&client, stackwatch_core::hex::quantity(n)).await,
                            Err(e) => Err(e),
                        };
                        if tx.send(item).await.is_err() {
                            break;
                        }
                    }
                }
            }

            debug!(url = %client.url(), id = %sub.id, "releasing newHeads subscription");
            client.unsubscribe(sub.id).await;
        });

        Ok(Box::pin(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })))
    }
}

async fn fetch_block(client: &WsRpcClient, tag: String) -> Result<BlockNotification, LiveError> {
    let raw: Value = client
        .call(
            client.next_id(),
            "eth_getBlockByNumber",
            vec![Value::String(tag.clone()), Value::Bool(true)],
        )
        .await
        .map_err(|e| {
            warn!(url = %client.url(), block = %tag, error = %e, "eth_getBlockByNumber failed");
            e
        })?;
    if raw.is_null() {
        return Err(LiveError::BlockNotFound(tag));
    }
    BlockNotification::from_json(&raw)
}
