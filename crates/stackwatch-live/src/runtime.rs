//! `LiveStack`: runs every source for one stack and publishes its view.
//!
//! ```text
//! BlockSource ──┐
//! node_info ────┼──SourceUpdate──▶ aggregator task ──watch──▶ view()/changes()
//! receipts ─────┤                     │
//! fork origin ──┘◀── spawned per ─────┘
//! ```
//!
//! Only the aggregator task touches the [`StackAggregator`]; every other task
//! talks to it through the update channel.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use stackwatch_core::policy::{RetryConfig, RetryPolicy};
use stackwatch_core::{RpcTransport, StackIdentity, TxHash};
use stackwatch_node::{Connector, ForkOriginResolver, NodeClient, TxOutcome};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::aggregator::{Applied, SourceUpdate, StackAggregator};
use crate::config::LiveConfig;
use crate::source::BlockSource;
use crate::view::{AggregatedStackView, Resolution};

/// The collaborators a [`LiveStack`] reads from.
pub struct LiveSources<T, C> {
    pub blocks: Arc<dyn BlockSource>,
    pub node: Arc<NodeClient<T>>,
    pub fork: Arc<ForkOriginResolver<C>>,
}

impl<T, C> Clone for LiveSources<T, C> {
    fn clone(&self) -> Self {
        Self {
            blocks: Arc::clone(&self.blocks),
            node: Arc::clone(&self.node),
            fork: Arc::clone(&self.fork),
        }
    }
}

/// Handle to a running live view. Dropping it stops everything.
pub struct LiveStack {
    identity: Arc<StackIdentity>,
    view_rx: watch::Receiver<AggregatedStackView>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    aggregator: Option<JoinHandle<()>>,
    feeders: Vec<JoinHandle<()>>,
}

impl LiveStack {
    /// Start watching `identity`. `fork_url` is the stack record's fork URL;
    /// without one the fork origin is taken from introspection.
    pub fn spawn<T, C>(
        identity: Arc<StackIdentity>,
        fork_url: Option<String>,
        sources: LiveSources<T, C>,
        config: LiveConfig,
    ) -> Self
    where
        T: RpcTransport,
        C: Connector,
    {
        let (updates_tx, updates_rx) = mpsc::channel(config.channel_capacity.max(1));
        let aggregator = StackAggregator::new(Arc::clone(&identity), fork_url);
        let (view_tx, view_rx) = watch::channel(aggregator.view().clone());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let feeders = vec![
            tokio::spawn(block_pipeline(
                Arc::clone(&sources.blocks),
                updates_tx.clone(),
                RetryPolicy::new(config.resubscribe.clone()),
            )),
            tokio::spawn(introspection_loop(
                Arc::clone(&sources.node),
                updates_tx.clone(),
                config.introspection_refresh,
            )),
        ];

        let task = AggregatorTask {
            aggregator,
            updates_rx,
            updates_tx,
            sources,
            view_tx,
            receipt_retry: config.receipt_retry,
            tasks: JoinSet::new(),
        };
        let aggregator = tokio::spawn(task.run(shutdown_rx));

        info!(stack = %identity, "live stack started");
        Self {
            identity,
            view_rx,
            shutdown_tx: Some(shutdown_tx),
            aggregator: Some(aggregator),
            feeders,
        }
    }

    pub fn identity(&self) -> &Arc<StackIdentity> {
        &self.identity
    }

    /// Current view. Never waits.
    pub fn view(&self) -> AggregatedStackView {
        self.view_rx.borrow().clone()
    }

    /// Receiver notified on every view change.
    pub fn changes(&self) -> watch::Receiver<AggregatedStackView> {
        self.view_rx.clone()
    }

    /// Stop in order: the aggregator stops accepting updates first, then the
    /// source tasks are aborted, which drops the head subscription.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.aggregator.take() {
            let _ = handle.await;
        }
        for handle in self.feeders.drain(..) {
            handle.abort();
            let _ = handle.await;
        }
        info!(stack = %self.identity, "live stack stopped");
    }
}

impl Drop for LiveStack {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.aggregator.take() {
            handle.abort();
        }
        for handle in self.feeders.drain(..) {
            handle.abort();
        }
    }
}

// ─── Aggregator task ─────────────────────────────────────────────────────────

struct AggregatorTask<T, C> {
    aggregator: StackAggregator,
    updates_rx: mpsc::Receiver<SourceUpdate>,
    /// Handed to receipt and fork lookups spawned from here.
    updates_tx: mpsc::Sender<SourceUpdate>,
    sources: LiveSources<T, C>,
    view_tx: watch::Sender<AggregatedStackView>,
    receipt_retry: RetryConfig,
    /// Lookups spawned by this task; aborted when it returns.
    tasks: JoinSet<()>,
}

impl<T: RpcTransport, C: Connector> AggregatorTask<T, C> {
    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        if let Some(url) = self.aggregator.initial_fork_lookup() {
            self.spawn_fork_lookup(Some(url));
        }

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                update = self.updates_rx.recv() => {
                    let Some(update) = update else { break };
                    self.handle(update);
                }
                Some(_) = self.tasks.join_next(), if !self.tasks.is_empty() => {}
            }
        }

        self.aggregator.teardown();
        debug!(slug = %self.slug(), "aggregator torn down");
    }

    fn slug(&self) -> &str {
        &self.aggregator.view().identity.slug
    }

    fn handle(&mut self, update: SourceUpdate) {
        match self.aggregator.apply(update) {
            Applied::Ignored => return,
            Applied::Changed => {}
            Applied::FetchReceipt(hash) => self.spawn_receipt(hash),
            Applied::ResolveForkOrigin(url) => self.spawn_fork_lookup(url),
        }
        self.view_tx.send_replace(self.aggregator.view().clone());
    }

    fn spawn_receipt(&mut self, hash: TxHash) {
        let node = Arc::clone(&self.sources.node);
        let tx = self.updates_tx.clone();
        let policy = RetryPolicy::new(self.receipt_retry.clone());
        debug!(slug = %self.slug(), hash = %hash, "fetching receipt");

        self.tasks.spawn(async move {
            let outcome = fetch_receipt(&node, hash, &policy).await;
            let _ = tx.send(SourceUpdate::Receipt { hash, outcome }).await;
        });
    }

    fn spawn_fork_lookup(&mut self, url: Option<String>) {
        let fork = Arc::clone(&self.sources.fork);
        let tx = self.updates_tx.clone();
        let slug = self.slug().to_string();

        self.tasks.spawn(async move {
            let resolution = match fork.resolve(&slug, url.as_deref()).await {
                Ok(origin) => Resolution::Ready(origin),
                Err(e) => {
                    warn!(slug = %slug, error = %e, "fork origin lookup failed");
                    Resolution::Unavailable(e.to_string())
                }
            };
            let _ = tx.send(SourceUpdate::ForkOrigin(resolution)).await;
        });
    }
}

async fn fetch_receipt<T: RpcTransport>(
    node: &NodeClient<T>,
    hash: TxHash,
    policy: &RetryPolicy,
) -> Option<TxOutcome> {
    let mut attempt = 0;
    loop {
        match node.transaction_receipt(hash).await {
            Ok(Some(outcome)) => return Some(outcome),
            Ok(None) => debug!(hash = %hash, attempt, "receipt not available yet"),
            Err(e) => warn!(hash = %hash, attempt, error = %e, "receipt lookup failed"),
        }
        attempt += 1;
        let Some(delay) = policy.next_delay(attempt) else {
            debug!(hash = %hash, "giving up on receipt");
            return None;
        };
        tokio::time::sleep(delay).await;
    }
}

// ─── Feeder tasks ────────────────────────────────────────────────────────────

async fn block_pipeline(
    source: Arc<dyn BlockSource>,
    tx: mpsc::Sender<SourceUpdate>,
    backoff: RetryPolicy,
) {
    let mut attempt = 0u32;
    loop {
        match source.subscribe().await {
            Ok(mut stream) => {
                attempt = 0;
                if tx.send(SourceUpdate::Subscribed).await.is_err() {
                    return;
                }
                while let Some(item) = stream.next().await {
                    match item {
                        Ok(block) => {
                            if tx.send(SourceUpdate::Block(block)).await.is_err() {
                                return;
                            }
                        }
                        Err(e) => warn!(url = %source.url(), error = %e, "block fetch failed"),
                    }
                }
                debug!(url = %source.url(), "block stream ended");
            }
            Err(e) => warn!(url = %source.url(), error = %e, "head subscription failed"),
        }
        attempt = attempt.saturating_add(1);
        tokio::time::sleep(backoff.backoff(attempt)).await;
    }
}

async fn introspection_loop<T: RpcTransport>(
    node: Arc<NodeClient<T>>,
    tx: mpsc::Sender<SourceUpdate>,
    refresh: Option<Duration>,
) {
    loop {
        let resolution = match node.node_info().await {
            Ok(info) => Resolution::Ready(info),
            Err(e) => {
                warn!(url = %node.url(), error = %e, "anvil_nodeInfo failed");
                Resolution::Unavailable(e.to_string())
            }
        };
        if tx.send(SourceUpdate::Introspection(resolution)).await.is_err() {
            return;
        }
        let Some(every) = refresh else { return };
        tokio::time::sleep(every).await;
    }
}
